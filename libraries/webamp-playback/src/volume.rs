//! Volume and mute state
//!
//! Level (0-100) and mute are independent: muting preserves the level so it
//! can be restored, and a level of zero is not the same as muted.

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (clamped to 0-100)
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
            muted: false,
        }
    }

    /// Set volume level (0-100)
    ///
    /// Turning the level above zero while muted un-mutes. Returns `true`
    /// when that implicit un-mute happened.
    pub fn set_level(&mut self, level: u8) -> bool {
        self.level = level.min(100);

        if self.level > 0 && self.muted {
            self.muted = false;
            return true;
        }
        false
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually heard: 0 while muted
    pub fn effective_level(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = Volume::new(80);
        assert_eq!(vol.level(), 80);
        assert!(!vol.is_muted());
    }

    #[test]
    fn set_volume_level() {
        let mut vol = Volume::new(50);
        assert_eq!(vol.level(), 50);

        vol.set_level(75);
        assert_eq!(vol.level(), 75);

        // Clamp to 100
        vol.set_level(150);
        assert_eq!(vol.level(), 100);
    }

    #[test]
    fn mute_preserves_level() {
        let mut vol = Volume::new(80);

        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.level(), 80);
        assert_eq!(vol.effective_level(), 0);

        vol.unmute();
        assert!(!vol.is_muted());
        assert_eq!(vol.effective_level(), 80);
    }

    #[test]
    fn toggle_mute_reports_new_state() {
        let mut vol = Volume::new(80);
        assert!(vol.toggle_mute());
        assert!(!vol.toggle_mute());
        assert_eq!(vol.effective_level(), 80);
    }

    #[test]
    fn zero_level_does_not_mute() {
        let mut vol = Volume::new(80);
        assert!(!vol.set_level(0));
        assert!(!vol.is_muted());
        assert_eq!(vol.effective_level(), 0);
    }

    #[test]
    fn raising_level_while_muted_unmutes() {
        let mut vol = Volume::new(80);
        vol.mute();

        assert!(vol.set_level(30));
        assert!(!vol.is_muted());
        assert_eq!(vol.effective_level(), 30);
    }

    #[test]
    fn zero_level_while_muted_stays_muted() {
        let mut vol = Volume::new(80);
        vol.mute();

        assert!(!vol.set_level(0));
        assert!(vol.is_muted());
    }
}
