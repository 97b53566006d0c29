/// Bindings to the `chrome.*` extension APIs and the background listeners
use std::rc::Rc;

use js_sys::{Function, Object, Promise};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};

use crate::controller::DedupController;
use crate::error::HostError;
use crate::host::TabHost;
use crate::messages::{Request, Response};
use crate::storage::{STORAGE_KEYS, Settings, SettingsStore};
use crate::tab_data::{TabChange, TabId, TabInfo, WindowId};

/// Maps become plain objects, which is what the extension pages expect
const SERIALIZER: &Serializer = &Serializer::json_compatible();

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = "query")]
    fn tabs_query(query_info: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = "get")]
    fn tabs_get(tab_id: TabId) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = "update")]
    fn tabs_update(tab_id: TabId, update_properties: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = "remove")]
    fn tabs_remove(tab_ids: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = "move")]
    fn tabs_move(tab_ids: &JsValue, move_properties: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = "update")]
    fn windows_update(window_id: WindowId, update_info: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = "getCurrent")]
    fn windows_get_current() -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = "setBadgeText")]
    fn action_set_badge_text(details: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = "setBadgeBackgroundColor")]
    fn action_set_badge_background_color(details: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = "get")]
    fn storage_sync_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = "set")]
    fn storage_sync_set(items: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &Function, millis: u32) -> JsValue;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onCreated"], js_name = "addListener")]
    fn add_tab_created_listener(handler: &Closure<dyn Fn(JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs", "onUpdated"], js_name = "addListener")]
    fn add_tab_updated_listener(handler: &Closure<dyn Fn(JsValue, JsValue, JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = "addListener")]
    fn add_message_listener(handler: &Closure<dyn Fn(JsValue, JsValue, Function) -> bool>);
}

const NO_TAB_PREFIX: &str = "No tab with id: ";

/// Sort a rejection from the browser into a [`HostError`]
fn host_error(command: &str, message: String) -> HostError {
    let missing_tab = message
        .strip_prefix(NO_TAB_PREFIX)
        .and_then(|rest| rest.trim_end_matches('.').trim().parse::<TabId>().ok());

    match missing_tab {
        Some(tab_id) => HostError::TabNotFound { tab_id },
        None => HostError::Command {
            command: command.to_string(),
            message,
        },
    }
}

fn js_message(error: &JsValue) -> String {
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

/// Await a browser call, folding synchronous throws and rejections together
async fn call(command: &str, promise: Result<Promise, JsValue>) -> Result<JsValue, HostError> {
    let promise = promise.map_err(|e| host_error(command, js_message(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| host_error(command, js_message(&e)))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, HostError> {
    value.serialize(SERIALIZER).map_err(|e| HostError::Malformed {
        message: e.to_string(),
    })
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Malformed {
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct ActivateTab {
    active: bool,
}

#[derive(Serialize)]
struct FocusWindow {
    focused: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveTabs {
    window_id: WindowId,
    /// -1 appends at the end of the window
    index: i32,
}

#[derive(Serialize)]
struct BadgeText<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BadgeColor<'a> {
    color: &'a str,
}

#[derive(Deserialize)]
struct Window {
    id: WindowId,
}

/// The live browser
pub struct ChromeHost;

impl TabHost for ChromeHost {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        let tabs = call("tabs.query", tabs_query(&Object::new())).await?;
        from_js(tabs)
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        from_js(call("tabs.get", tabs_get(tab_id)).await?)
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let properties = to_js(&ActivateTab { active: true })?;
        call("tabs.update", tabs_update(tab_id, &properties)).await?;
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<(), HostError> {
        let info = to_js(&FocusWindow { focused: true })?;
        call("windows.update", windows_update(window_id, &info)).await?;
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<(), HostError> {
        call("tabs.remove", tabs_remove(&to_js(tab_ids)?)).await?;
        Ok(())
    }

    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<(), HostError> {
        let properties = to_js(&MoveTabs {
            window_id,
            index: -1,
        })?;
        call("tabs.move", tabs_move(&to_js(tab_ids)?, &properties)).await?;
        Ok(())
    }

    async fn current_window(&self) -> Result<WindowId, HostError> {
        let window: Window = from_js(call("windows.getCurrent", windows_get_current()).await?)?;
        Ok(window.id)
    }

    async fn set_badge(&self, text: &str, color: Option<&str>) -> Result<(), HostError> {
        call("action.setBadgeText", action_set_badge_text(&to_js(&BadgeText { text })?)).await?;
        if let Some(color) = color {
            let details = to_js(&BadgeColor { color })?;
            call(
                "action.setBadgeBackgroundColor",
                action_set_badge_background_color(&details),
            )
            .await?;
        }
        Ok(())
    }

    async fn sleep(&self, millis: u32) {
        let timer = Promise::new(&mut |resolve, _reject| {
            set_timeout(&resolve, millis);
        });
        // setTimeout never rejects
        let _ = JsFuture::from(timer).await;
    }
}

/// `chrome.storage.sync`
pub struct ChromeStorage;

impl SettingsStore for ChromeStorage {
    async fn load(&self) -> Result<Settings, HostError> {
        let items = call("storage.sync.get", storage_sync_get(&to_js(&STORAGE_KEYS)?)).await?;
        from_js(items)
    }

    async fn save(&self, settings: &Settings) -> Result<(), HostError> {
        call("storage.sync.set", storage_sync_set(&to_js(settings)?)).await?;
        Ok(())
    }
}

type BackgroundController = DedupController<ChromeHost, ChromeStorage>;

fn send_response(send_response: &Function, response: &Response) {
    let value = match to_js(response) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not encode response: {}", e);
            return;
        }
    };
    if let Err(e) = send_response.call1(&JsValue::NULL, &value) {
        debug!("Sender went away: {}", js_message(&e));
    }
}

/// Register the tab and message listeners of the background service worker
#[wasm_bindgen]
pub fn start_background() {
    let controller: Rc<BackgroundController> =
        Rc::new(DedupController::new(ChromeHost, ChromeStorage));

    let on_created = {
        let controller = Rc::clone(&controller);
        Closure::<dyn Fn(JsValue)>::new(move |tab: JsValue| match from_js::<TabInfo>(tab) {
            Ok(tab) => {
                let controller = Rc::clone(&controller);
                spawn_local(async move {
                    let outcome = controller.on_tab_created(tab).await;
                    debug!("tabs.onCreated: {:?}", outcome);
                });
            }
            Err(e) => warn!("Ignoring created tab: {}", e),
        })
    };
    add_tab_created_listener(&on_created);
    on_created.forget();

    let on_updated = {
        let controller = Rc::clone(&controller);
        Closure::<dyn Fn(JsValue, JsValue, JsValue)>::new(
            move |_tab_id: JsValue, change: JsValue, tab: JsValue| {
                let event = from_js::<TabChange>(change)
                    .and_then(|change| from_js::<TabInfo>(tab).map(|tab| (change, tab)));
                match event {
                    Ok((change, tab)) => {
                        let controller = Rc::clone(&controller);
                        spawn_local(async move {
                            let outcome = controller.on_tab_updated(&change, tab).await;
                            debug!("tabs.onUpdated: {:?}", outcome);
                        });
                    }
                    Err(e) => warn!("Ignoring tab update: {}", e),
                }
            },
        )
    };
    add_tab_updated_listener(&on_updated);
    on_updated.forget();

    let on_message = {
        let controller = Rc::clone(&controller);
        Closure::<dyn Fn(JsValue, JsValue, Function) -> bool>::new(
            move |message: JsValue, _sender: JsValue, respond: Function| {
                let controller = Rc::clone(&controller);
                spawn_local(async move {
                    let response = match from_js::<Request>(message) {
                        Ok(request) => {
                            debug!("Handling {:?}", request);
                            request.act(&controller).await
                        }
                        Err(e) => Response::error(format!("unsupported message: {}", e)),
                    };
                    send_response(&respond, &response);
                });
                // The response is sent asynchronously
                true
            },
        )
    };
    add_message_listener(&on_message);
    on_message.forget();

    info!("Only One Tab background listeners registered");
}
