/// In-memory browser and storage doubles for tests
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::error::HostError;
use crate::host::TabHost;
use crate::storage::{Settings, SettingsStore};
use crate::tab_data::{TabId, TabInfo, WindowId};

pub fn tab(id: TabId, url: &str) -> TabInfo {
    TabInfo::new(id, Some(url.to_string()), 1, false)
}

pub fn tab_in_window(id: TabId, url: &str, window_id: WindowId) -> TabInfo {
    TabInfo::new(id, Some(url.to_string()), window_id, false)
}

pub struct MemoryStore {
    settings: RefCell<Settings>,
    fail_loads: Cell<bool>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        MemoryStore {
            settings: RefCell::new(settings),
            fail_loads: Cell::new(false),
            saves: Cell::new(0),
        }
    }

    /// Change the stored settings behind the cache's back
    pub fn replace(&self, settings: Settings) {
        self.settings.replace(settings);
    }

    pub fn stored(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.set(fail);
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings, HostError> {
        if self.fail_loads.get() {
            return Err(HostError::Command {
                command: "storage.sync.get".to_string(),
                message: "unavailable".to_string(),
            });
        }
        Ok(self.stored())
    }

    async fn save(&self, settings: &Settings) -> Result<(), HostError> {
        self.settings.replace(settings.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// A browser command, as recorded by [`FakeHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Query,
    Get(TabId),
    Activate(TabId),
    FocusWindow(WindowId),
    Remove(Vec<TabId>),
    Move(Vec<TabId>, WindowId),
    CurrentWindow,
    Badge(String, Option<String>),
    Sleep(u32),
}

/// A browser with a fixed set of tabs that records every command
pub struct FakeHost {
    tabs: RefCell<Vec<TabInfo>>,
    calls: RefCell<Vec<HostCall>>,
    current_window: WindowId,
    /// Tabs still listed by queries but rejected by commands
    stale: RefCell<HashSet<TabId>>,
    /// Applied on the next sleep, simulating the browser moving on meanwhile
    on_sleep: RefCell<Vec<SleepEffect>>,
}

pub enum SleepEffect {
    Navigate(TabId, String),
    Close(TabId),
}

impl FakeHost {
    pub fn new(tabs: Vec<TabInfo>) -> Self {
        FakeHost {
            tabs: RefCell::new(tabs),
            calls: RefCell::new(Vec::new()),
            current_window: 1,
            stale: RefCell::new(HashSet::new()),
            on_sleep: RefCell::new(Vec::new()),
        }
    }

    pub fn with_current_window(mut self, window_id: WindowId) -> Self {
        self.current_window = window_id;
        self
    }

    pub fn mark_stale(&self, tab_id: TabId) {
        self.stale.borrow_mut().insert(tab_id);
    }

    pub fn on_sleep(&self, effect: SleepEffect) {
        self.on_sleep.borrow_mut().push(effect);
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.tabs.borrow().clone()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.borrow().iter().map(|t| t.id).collect()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Recorded commands, leaving out queries, lookups and timers
    pub fn commands(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    HostCall::Query | HostCall::Get(_) | HostCall::CurrentWindow | HostCall::Sleep(_)
                )
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }

    fn find(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        if self.stale.borrow().contains(&tab_id) {
            return Err(HostError::TabNotFound { tab_id });
        }
        self.tabs
            .borrow()
            .iter()
            .find(|t| t.id == tab_id)
            .cloned()
            .ok_or(HostError::TabNotFound { tab_id })
    }
}

impl TabHost for FakeHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        self.record(HostCall::Query);
        Ok(self.tabs())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.record(HostCall::Get(tab_id));
        self.find(tab_id)
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        self.record(HostCall::Activate(tab_id));
        let target = self.find(tab_id)?;
        for t in self.tabs.borrow_mut().iter_mut() {
            if t.window_id == target.window_id {
                t.active = t.id == tab_id;
            }
        }
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        self.record(HostCall::FocusWindow(window_id));
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        self.record(HostCall::Remove(tab_ids.to_vec()));
        for &tab_id in tab_ids {
            self.find(tab_id)?;
        }
        self.tabs.borrow_mut().retain(|t| !tab_ids.contains(&t.id));
        Ok(())
    }

    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<(), HostError> {
        self.record(HostCall::Move(tab_ids.to_vec(), window_id));
        let mut tabs = self.tabs.borrow_mut();
        let (mut moved, mut kept): (Vec<TabInfo>, Vec<TabInfo>) =
            tabs.drain(..).partition(|t| tab_ids.contains(&t.id));
        for t in moved.iter_mut() {
            t.window_id = window_id;
        }
        kept.append(&mut moved);
        *tabs = kept;
        Ok(())
    }

    async fn current_window(&self) -> Result<WindowId, HostError> {
        self.record(HostCall::CurrentWindow);
        Ok(self.current_window)
    }

    async fn set_badge(&self, text: &str, color: Option<&str>) -> Result<(), HostError> {
        self.record(HostCall::Badge(text.to_string(), color.map(str::to_string)));
        Ok(())
    }

    async fn sleep(&self, millis: u32) {
        self.record(HostCall::Sleep(millis));
        let effects: Vec<SleepEffect> = self.on_sleep.borrow_mut().drain(..).collect();
        let mut tabs = self.tabs.borrow_mut();
        for effect in effects {
            match effect {
                SleepEffect::Navigate(tab_id, url) => {
                    if let Some(t) = tabs.iter_mut().find(|t| t.id == tab_id) {
                        t.url = Some(url);
                    }
                }
                SleepEffect::Close(tab_id) => tabs.retain(|t| t.id != tab_id),
            }
        }
    }
}
