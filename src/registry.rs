/// Read-through view over the open tabs, grouped by tracking key
use std::collections::HashMap;

use crate::error::HostError;
use crate::host::TabHost;
use crate::storage::Settings;
use crate::tab_data::{TabId, TabInfo};
use crate::url_info::is_privileged;

/// Tabs with a URL that are not browser-internal, paired with their key
fn tracked_tabs<'a>(
    tabs: &'a [TabInfo],
    settings: &'a Settings,
) -> impl Iterator<Item = (&'a TabInfo, String)> + 'a {
    tabs.iter().filter_map(move |tab| {
        let url = tab.url()?;
        if is_privileged(url) {
            return None;
        }
        settings.resolve(url).into_key().map(|key| (tab, key))
    })
}

/// First tab in listing order, other than `exclude`, whose key equals `key`
pub fn find_with_key(
    tabs: &[TabInfo],
    key: &str,
    exclude: TabId,
    settings: &Settings,
) -> Option<TabInfo> {
    tracked_tabs(tabs, settings)
        .find(|(tab, tab_key)| tab.id != exclude && tab_key == key)
        .map(|(tab, _)| tab.clone())
}

/// Count tabs per tracking key
pub fn count_keys(tabs: &[TabInfo], settings: &Settings) -> HashMap<String, usize> {
    tracked_tabs(tabs, settings).fold(HashMap::new(), |mut counts, (_, key)| {
        *counts.entry(key).or_insert(0) += 1;
        counts
    })
}

/// Tabs of every tracking key, keys in order of first appearance
pub fn group_tabs(tabs: &[TabInfo], settings: &Settings) -> Vec<(String, Vec<TabInfo>)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<TabInfo>)> = Vec::new();

    for (tab, key) in tracked_tabs(tabs, settings) {
        match positions.get(&key) {
            Some(&position) => groups[position].1.push(tab.clone()),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![tab.clone()]));
            }
        }
    }

    groups
}

/// Groups holding more than one tab, largest first, then by key
pub fn duplicate_groups(counts: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut groups: Vec<(String, usize)> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(key, count)| (key.clone(), *count))
        .collect();

    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    groups
}

/// The same queries, against a fresh listing from the browser
pub struct TabRegistry<'a, H> {
    host: &'a H,
}

impl<'a, H: TabHost> TabRegistry<'a, H> {
    pub fn new(host: &'a H) -> Self {
        TabRegistry { host }
    }

    pub async fn find_tab_with_key(
        &self,
        key: &str,
        exclude: TabId,
        settings: &Settings,
    ) -> Result<Option<TabInfo>, HostError> {
        let tabs = self.host.query_tabs().await?;
        Ok(find_with_key(&tabs, key, exclude, settings))
    }

    pub async fn count_by_key(&self, settings: &Settings) -> Result<HashMap<String, usize>, HostError> {
        let tabs = self.host.query_tabs().await?;
        Ok(count_keys(&tabs, settings))
    }
}
