/// The browser surface the deduplication engine drives
use crate::error::HostError;
use crate::tab_data::{TabId, TabInfo, WindowId};

/// Tab, window, badge and timer operations provided by the browser
///
/// Every call is a suspension point: by the time it resolves, other event
/// handlers may have changed the set of open tabs.
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// All open tabs across all windows, in browser order
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError>;

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError>;

    /// Make a tab the active one in its window
    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError>;

    /// Move tabs to the end of a window
    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<(), HostError>;

    async fn current_window(&self) -> Result<WindowId, HostError>;

    async fn set_badge(&self, text: &str, color: Option<&str>) -> Result<(), HostError>;

    async fn sleep(&self, millis: u32);
}
