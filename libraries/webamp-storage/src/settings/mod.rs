//! Application settings
//!
//! A single document of optional fields. Unset fields fall back to their
//! defaults when read through the accessors here.

use crate::document::{DocumentStore, SETTINGS_KEY};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use webamp_core::{KeyBindings, Provider};

/// UI theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// Library view layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Persisted application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// API token for the search provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_provider: Option<Provider>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcuts: Option<KeyBindings>,
}

impl AppSettings {
    /// Overlay every field set in `updates`
    pub fn merge(&mut self, updates: AppSettings) {
        if updates.token.is_some() {
            self.token = updates.token;
        }
        if updates.theme.is_some() {
            self.theme = updates.theme;
        }
        if updates.view_mode.is_some() {
            self.view_mode = updates.view_mode;
        }
        if updates.search_provider.is_some() {
            self.search_provider = updates.search_provider;
        }
        if updates.shortcuts.is_some() {
            self.shortcuts = updates.shortcuts;
        }
    }
}

pub async fn get(store: &DocumentStore) -> Result<AppSettings> {
    store.load(SETTINGS_KEY).await
}

/// Merge `updates` into the stored settings and return the result
pub async fn update(store: &DocumentStore, updates: AppSettings) -> Result<AppSettings> {
    let merged = store
        .update(SETTINGS_KEY, |settings: &mut AppSettings| {
            settings.merge(updates);
            Some(settings.clone())
        })
        .await?;
    Ok(merged.unwrap_or_default())
}

pub async fn get_token(store: &DocumentStore) -> Result<Option<String>> {
    Ok(get(store).await?.token)
}

pub async fn set_token(store: &DocumentStore, token: &str) -> Result<()> {
    modify(store, |settings| settings.token = Some(token.to_string())).await
}

pub async fn remove_token(store: &DocumentStore) -> Result<()> {
    modify(store, |settings| settings.token = None).await
}

/// Stored view mode, grid when unset
pub async fn get_view_mode(store: &DocumentStore) -> Result<ViewMode> {
    Ok(get(store).await?.view_mode.unwrap_or_default())
}

pub async fn set_view_mode(store: &DocumentStore, mode: ViewMode) -> Result<()> {
    modify(store, |settings| settings.view_mode = Some(mode)).await
}

/// Stored key bindings, defaults when unset
pub async fn get_shortcuts(store: &DocumentStore) -> Result<KeyBindings> {
    Ok(get(store).await?.shortcuts.unwrap_or_default())
}

pub async fn set_shortcuts(store: &DocumentStore, bindings: KeyBindings) -> Result<()> {
    modify(store, |settings| settings.shortcuts = Some(bindings)).await
}

/// Forget every setting
pub async fn clear(store: &DocumentStore) -> Result<()> {
    store.remove(SETTINGS_KEY).await
}

async fn modify(store: &DocumentStore, change: impl FnOnce(&mut AppSettings)) -> Result<()> {
    store
        .update(SETTINGS_KEY, |settings: &mut AppSettings| {
            change(settings);
            Some(())
        })
        .await?;
    Ok(())
}
