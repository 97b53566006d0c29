/// Data structures for Only One Tab
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type WindowId = i32;

/// `chrome.tabs.TAB_ID_NONE`, reported for tabs that are not browser tabs
pub const TAB_ID_NONE: TabId = -1;

fn tab_id_none() -> TabId {
    TAB_ID_NONE
}

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    #[serde(default = "tab_id_none")]
    pub id: TabId,
    /// Absent until the tab has navigated somewhere
    #[serde(default)]
    pub url: Option<String>,
    pub window_id: WindowId,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    pub fn new(id: TabId, url: Option<String>, window_id: WindowId, active: bool) -> TabInfo {
        TabInfo {
            id,
            url,
            window_id,
            active,
        }
    }

    /// The URL, treating an empty string like a missing one
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// The `changeInfo` of a `tabs.onUpdated` event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabChange {
    #[serde(default)]
    pub url: Option<String>,
}
