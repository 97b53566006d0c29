/// Bulk tab operations requested from the popup: closing duplicates, merging windows
use log::info;

use crate::error::HostError;
use crate::host::TabHost;
use crate::registry::group_tabs;
use crate::storage::Settings;
use crate::tab_data::{TabId, TabInfo};

/// Ids of the tabs to close so that every tracking key keeps only its first tab
///
/// Only tabs whose group is `group` are considered when one is given.
/// Untracked tabs are always kept.
pub fn plan_unique(tabs: &[TabInfo], settings: &Settings, group: Option<&str>) -> Vec<TabId> {
    group_tabs(tabs, settings)
        .into_iter()
        .filter(|(key, _)| group.is_none_or(|g| g == key.as_str()))
        .flat_map(|(_, members)| members.into_iter().skip(1).map(|tab| tab.id))
        .collect()
}

/// Close duplicate tabs of one group, or of every group; returns how many were closed
pub async fn close_duplicates<H: TabHost>(
    host: &H,
    settings: &Settings,
    group: Option<&str>,
) -> Result<usize, HostError> {
    let tabs = host.query_tabs().await?;
    let remove_ids = plan_unique(&tabs, settings, group);

    if remove_ids.is_empty() {
        return Ok(0);
    }

    host.remove_tabs(&remove_ids).await?;
    info!("Closed {} duplicate tabs", remove_ids.len());
    Ok(remove_ids.len())
}

/// Move every tab from other windows into the current one; returns how many moved
pub async fn merge_windows<H: TabHost>(host: &H) -> Result<usize, HostError> {
    let current = host.current_window().await?;
    let tab_ids: Vec<TabId> = host
        .query_tabs()
        .await?
        .iter()
        .filter(|tab| tab.window_id != current)
        .map(|tab| tab.id)
        .collect();

    if tab_ids.is_empty() {
        return Ok(0);
    }

    host.move_tabs(&tab_ids, current).await?;
    info!("Moved {} tabs into window {}", tab_ids.len(), current);
    Ok(tab_ids.len())
}
