/// Settings persisted in chrome.storage.sync, and the cached copy the
/// engine reads from
use std::cell::RefCell;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{HostError, SettingsError, ValidationError};
use crate::pattern::PatternRule;
use crate::tracking::{Tracking, TrackingMode, resolve};

/// Storage keys, in the order they are read
pub const STORAGE_KEYS: [&str; 2] = ["mode", "domainPatterns"];

/// Suggested file name for exported settings
pub const EXPORT_FILE_NAME: &str = "onlyonetab-settings.json";

/// Root storage structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub mode: TrackingMode,
    #[serde(default)]
    pub domain_patterns: Vec<PatternRule>,
}

/// Layout of an exported settings file
#[derive(Debug, Serialize, Deserialize)]
struct SettingsExport {
    #[serde(default = "imported_mode")]
    mode: TrackingMode,
    patterns: Vec<PatternRule>,
}

/// A file that carries patterns but no mode is meant to use them
fn imported_mode() -> TrackingMode {
    TrackingMode::Specific
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a URL against this snapshot
    pub fn resolve(&self, url: &str) -> Tracking {
        resolve(url, self.mode, &self.domain_patterns)
    }

    /// Append a validated rule, rejecting one with the same text and kind
    ///
    /// The rule is normalized first, so text typed as `GitHub.com ` is stored
    /// as `github.com`.
    pub fn add_pattern(&mut self, rule: PatternRule) -> Result<(), ValidationError> {
        let rule = PatternRule::new(&rule.pattern, rule.kind, rule.group_by);
        rule.validate()?;

        let exists = self
            .domain_patterns
            .iter()
            .any(|p| p.pattern == rule.pattern && p.kind == rule.kind);
        if exists {
            return Err(ValidationError::Duplicate);
        }

        self.domain_patterns.push(rule);
        Ok(())
    }

    pub fn remove_pattern(&mut self, index: usize) -> Option<PatternRule> {
        if index < self.domain_patterns.len() {
            Some(self.domain_patterns.remove(index))
        } else {
            None
        }
    }

    /// Pretty-printed JSON of the mode and rule list
    pub fn export(&self) -> Result<String, SettingsError> {
        let export = SettingsExport {
            mode: self.mode,
            patterns: self.domain_patterns.clone(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Parse an exported settings file
    pub fn import(contents: &str) -> Result<Settings, SettingsError> {
        let export: SettingsExport = serde_json::from_str(contents)?;
        Ok(Settings {
            mode: export.mode,
            domain_patterns: export.patterns,
        })
    }
}

/// Durable key-value storage for [`Settings`]
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn load(&self) -> Result<Settings, HostError>;

    async fn save(&self, settings: &Settings) -> Result<(), HostError>;
}

/// The engine's copy of the settings
///
/// Reads go to the store first so every decision sees the latest rules;
/// every mutation replaces the snapshot before returning. The snapshot is
/// empty until the store has been read once.
pub struct SettingsCache<S> {
    store: S,
    snapshot: RefCell<Option<Settings>>,
}

impl<S: SettingsStore> SettingsCache<S> {
    pub fn new(store: S) -> Self {
        SettingsCache {
            store,
            snapshot: RefCell::new(None),
        }
    }

    /// The last settings seen, without touching the store; defaults if the
    /// store was never read
    pub fn snapshot(&self) -> Settings {
        self.snapshot.borrow().clone().unwrap_or_default()
    }

    /// Refresh the snapshot from the store
    pub async fn reload(&self) -> Result<Settings, HostError> {
        let settings = self.store.load().await?;
        self.snapshot.replace(Some(settings.clone()));
        Ok(settings)
    }

    /// Fresh settings, or the last snapshot if the store cannot be read
    ///
    /// Fails when the store has never been read successfully.
    pub async fn current(&self) -> Result<Settings, HostError> {
        match self.reload().await {
            Ok(settings) => Ok(settings),
            Err(e) => {
                let cached = self.snapshot.borrow().clone();
                match cached {
                    Some(settings) => {
                        warn!("Using cached settings, reload failed: {}", e);
                        Ok(settings)
                    }
                    None => Err(e),
                }
            }
        }
    }

    pub async fn add_pattern(&self, rule: PatternRule) -> Result<Settings, SettingsError> {
        debug!("Adding pattern {}", rule);
        self.update(|settings| {
            settings.add_pattern(rule)?;
            Ok(true)
        })
        .await
        .map(|(_, settings)| settings)
    }

    /// Remove the rule at `index`; the flag is false if there was none
    pub async fn remove_pattern(&self, index: usize) -> Result<(bool, Settings), SettingsError> {
        self.update(|settings| Ok(settings.remove_pattern(index).is_some()))
            .await
    }

    pub async fn set_mode(&self, mode: TrackingMode) -> Result<Settings, SettingsError> {
        self.update(|settings| {
            let changed = settings.mode != mode;
            settings.mode = mode;
            Ok(changed)
        })
        .await
        .map(|(_, settings)| settings)
    }

    pub async fn export(&self) -> Result<String, SettingsError> {
        self.reload().await?.export()
    }

    /// Replace mode and rules with the contents of an exported file
    pub async fn import(&self, contents: &str) -> Result<Settings, SettingsError> {
        let imported = Settings::import(contents)?;
        self.store.save(&imported).await?;
        self.snapshot.replace(Some(imported.clone()));
        Ok(imported)
    }

    /// Apply `change` to fresh settings; it reports whether anything changed,
    /// and unchanged settings are not written back
    async fn update(
        &self,
        change: impl FnOnce(&mut Settings) -> Result<bool, SettingsError>,
    ) -> Result<(bool, Settings), SettingsError> {
        let mut settings = self.reload().await?;
        let changed = change(&mut settings)?;
        if changed {
            self.store.save(&settings).await?;
            self.snapshot.replace(Some(settings.clone()));
        }
        Ok((changed, settings))
    }
}
