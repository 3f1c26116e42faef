//! Playback queue
//!
//! Holds the ordered working set of tracks and picks the next or previous
//! one. Navigation is anchored on a track id rather than an index, so a
//! queue that no longer contains the current track simply yields nothing.
//!
//! Shuffle picks a uniformly random track other than the current one, for
//! both directions. There is no shuffle history: "previous" under shuffle is
//! just another random pick.

use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use webamp_core::{Track, TrackId};

/// Ordered track list with a current-track pointer
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    /// Tracks in play order
    tracks: Vec<Track>,

    /// Track the queue was last anchored on
    current: Option<TrackId>,
}

impl PlaybackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held sequence
    ///
    /// Empty sequences are allowed; navigation on them is a no-op.
    pub fn set_queue(&mut self, tracks: Vec<Track>, current: Option<TrackId>) {
        self.tracks = tracks;
        self.current = current;
    }

    /// Move the current-track pointer
    pub fn set_current(&mut self, current: Option<TrackId>) {
        self.current = current;
    }

    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.current.as_ref()
    }

    /// All tracks in play order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.position_of(id).is_some()
    }

    /// Index of the track with the given id
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| &track.id == id)
    }

    /// Track after `current`, wrapping at the end
    pub fn next(&self, current: &TrackId, shuffle: bool) -> Option<Track> {
        self.next_with_rng(current, shuffle, &mut thread_rng())
    }

    /// Track before `current`, wrapping at the start
    pub fn previous(&self, current: &TrackId, shuffle: bool) -> Option<Track> {
        self.previous_with_rng(current, shuffle, &mut thread_rng())
    }

    /// [`next`](Self::next) with a caller-supplied random source
    pub fn next_with_rng<R: Rng + ?Sized>(
        &self,
        current: &TrackId,
        shuffle: bool,
        rng: &mut R,
    ) -> Option<Track> {
        let index = self.position_of(current)?;

        if shuffle {
            return self.random_other(index, rng);
        }

        let next = (index + 1) % self.tracks.len();
        self.tracks.get(next).cloned()
    }

    /// [`previous`](Self::previous) with a caller-supplied random source
    pub fn previous_with_rng<R: Rng + ?Sized>(
        &self,
        current: &TrackId,
        shuffle: bool,
        rng: &mut R,
    ) -> Option<Track> {
        let index = self.position_of(current)?;

        if shuffle {
            return self.random_other(index, rng);
        }

        let len = self.tracks.len();
        let previous = (index + len - 1) % len;
        self.tracks.get(previous).cloned()
    }

    /// Uniform pick among every track except the one at `index`
    ///
    /// A queue holding only the current track returns that track.
    fn random_other<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Option<Track> {
        let others: Vec<&Track> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, track)| track)
            .collect();

        match others.choose(rng) {
            Some(track) => Some((*track).clone()),
            None => self.tracks.get(index).cloned(),
        }
    }
}
