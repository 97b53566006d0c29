/// Event-driven deduplication: focus the existing tab, close the new one
use log::{debug, info, warn};

use crate::error::HostError;
use crate::host::TabHost;
use crate::registry::TabRegistry;
use crate::storage::{SettingsCache, SettingsStore};
use crate::tab_data::{TabChange, TabId, TabInfo};
use crate::url_info::{is_new_tab_placeholder, is_privileged};

/// Delays and badge appearance
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// Wait after tab creation so the browser can fill in the destination URL
    pub creation_delay_ms: u32,
    /// How long the badge stays up after a duplicate was closed
    pub badge_clear_ms: u32,
    pub badge_text: &'static str,
    pub badge_color: &'static str,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            creation_delay_ms: 100,
            badge_clear_ms: 2000,
            badge_text: "1",
            badge_color: "#4CAF50",
        }
    }
}

/// What a reconciliation pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No URL yet, a new-tab page, or a browser-internal page
    Skipped,
    /// The user's settings could not be read yet, so nothing is decided
    NoSettings,
    Untracked,
    /// No other tab shares the key
    Unique { key: String },
    Deduplicated {
        key: String,
        kept: TabId,
        closed: TabId,
    },
    /// The browser rejected a query or command; state is left as it was
    Abandoned { key: String },
}

pub struct DedupController<H, S> {
    host: H,
    settings: SettingsCache<S>,
    timing: Timing,
}

impl<H: TabHost, S: SettingsStore> DedupController<H, S> {
    pub fn new(host: H, store: S) -> Self {
        DedupController {
            host,
            settings: SettingsCache::new(store),
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &SettingsCache<S> {
        &self.settings
    }

    /// A tab was opened; its URL is usually not known yet
    pub async fn on_tab_created(&self, tab: TabInfo) -> Outcome {
        self.host.sleep(self.timing.creation_delay_ms).await;

        let tab = match self.host.get_tab(tab.id).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!("Created tab went away before it loaded: {}", e);
                return Outcome::Skipped;
            }
        };

        match tab.url() {
            Some(url) if !is_new_tab_placeholder(url) => self.reconcile(&tab).await,
            _ => Outcome::Skipped,
        }
    }

    /// A tab changed; only URL changes matter
    pub async fn on_tab_updated(&self, change: &TabChange, tab: TabInfo) -> Outcome {
        let Some(changed_url) = &change.url else {
            return Outcome::Skipped;
        };

        let tab = TabInfo {
            url: tab.url.or_else(|| Some(changed_url.clone())),
            ..tab
        };
        self.reconcile(&tab).await
    }

    /// Close `tab` if another open tab already has its tracking key
    pub async fn reconcile(&self, tab: &TabInfo) -> Outcome {
        let Some(url) = tab.url() else {
            return Outcome::Skipped;
        };
        if is_privileged(url) {
            return Outcome::Skipped;
        }

        let settings = match self.settings.current().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Leaving tab {} alone, settings unavailable: {}", tab.id, e);
                return Outcome::NoSettings;
            }
        };
        let Some(key) = settings.resolve(url).into_key() else {
            debug!("Not tracking {}", url);
            return Outcome::Untracked;
        };

        let registry = TabRegistry::new(&self.host);
        let existing = match registry.find_tab_with_key(&key, tab.id, &settings).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return Outcome::Unique { key },
            Err(e) => {
                warn!("Could not list tabs for {}: {}", key, e);
                return Outcome::Abandoned { key };
            }
        };

        if let Err(e) = self.switch_to(&existing, tab.id).await {
            warn!(
                "Gave up replacing tab {} with tab {} for {}: {}",
                tab.id, existing.id, key, e
            );
            return Outcome::Abandoned { key };
        }

        info!("Closed tab {} in favour of tab {} ({})", tab.id, existing.id, key);
        self.flash_badge().await;

        Outcome::Deduplicated {
            key,
            kept: existing.id,
            closed: tab.id,
        }
    }

    /// The survivor is brought forward before the duplicate goes away
    async fn switch_to(&self, existing: &TabInfo, duplicate: TabId) -> Result<(), HostError> {
        self.host.activate_tab(existing.id).await?;
        self.host.focus_window(existing.window_id).await?;
        self.host.remove_tabs(&[duplicate]).await
    }

    async fn flash_badge(&self) {
        let shown = self
            .host
            .set_badge(self.timing.badge_text, Some(self.timing.badge_color))
            .await;
        if let Err(e) = shown {
            debug!("Badge not shown: {}", e);
            return;
        }

        self.host.sleep(self.timing.badge_clear_ms).await;

        if let Err(e) = self.host.set_badge("", None).await {
            debug!("Badge not cleared: {}", e);
        }
    }
}
