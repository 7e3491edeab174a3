//! Callback-style entry points with JavaScript argument shapes.
//!
//! The namespaces in [`crate::mock`] take structured arguments and return
//! their results. [`CallbackApi`] sits at the outer boundary instead: it
//! accepts loosely shaped JSON arguments, resolves them into the structured
//! forms, and hands results to an optional callback before returning.
//! Malformed arguments are ignored rather than reported.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::event::{EventChannel, Listener};
use crate::mock::{
    AlarmArgs, AlarmCreateInfo, Chrome, MenuItemProperties, StorageSelector, Tab,
    TabCreateProperties, Window,
};

/// Register `listener` if there is one.
pub fn add_listener<A>(channel: &EventChannel<A>, listener: Option<Listener<A>>) {
    if let Some(listener) = listener {
        channel.subscribe(listener);
    }
}

/// Remove `listener` if there is one.
pub fn remove_listener<A>(channel: &EventChannel<A>, listener: Option<&Listener<A>>) {
    if let Some(listener) = listener {
        channel.unsubscribe(listener);
    }
}

/// Interpret a JSON `get` argument as a selector.
///
/// Falsy values (`null`, `""`, `false`, `0`) select everything, a string one
/// key, an array its string elements, and an object supplies defaults.
/// Anything else selects nothing.
pub fn storage_selector(keys: &Value) -> StorageSelector {
    match keys {
        Value::Null | Value::Bool(false) => StorageSelector::All,
        Value::String(key) if key.is_empty() => StorageSelector::All,
        Value::Number(n) if n.as_f64() == Some(0.0) => StorageSelector::All,
        Value::String(key) => StorageSelector::Key(key.clone()),
        Value::Array(items) => StorageSelector::Keys(string_items(items)),
        Value::Object(defaults) => StorageSelector::Defaults(defaults.clone()),
        Value::Bool(_) | Value::Number(_) => StorageSelector::Keys(Vec::new()),
    }
}

/// Interpret a JSON `remove` argument as a list of keys.
pub fn storage_keys(keys: &Value) -> Vec<String> {
    match keys {
        Value::String(key) => vec![key.clone()],
        Value::Array(items) => string_items(items),
        _ => Vec::new(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Resolve `alarms.create(nameOrInfo, info)`.
pub fn alarm_args(name_or_info: &Value, info: Option<&Value>) -> AlarmArgs {
    match name_or_info {
        Value::String(name) => {
            let info = info.map(parse_alarm_info).unwrap_or_default();
            AlarmArgs::Named(name.clone(), info)
        }
        other => AlarmArgs::Info(parse_alarm_info(other)),
    }
}

fn parse_alarm_info(value: &Value) -> AlarmCreateInfo {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

fn deliver<T>(value: T, callback: Option<impl FnOnce(T)>) {
    if let Some(callback) = callback {
        callback(value);
    }
}

/// JavaScript-shaped view over an installed [`Chrome`].
#[derive(Debug, Clone)]
pub struct CallbackApi {
    chrome: Arc<Chrome>,
}

impl CallbackApi {
    pub fn new(chrome: Arc<Chrome>) -> Self {
        Self { chrome }
    }

    pub fn chrome(&self) -> &Chrome {
        &self.chrome
    }

    /// `runtime.sendMessage(msg, cb)`. Without a callback no response is built.
    pub fn runtime_send_message(&self, message: Value, callback: Option<impl FnOnce(Value)>) {
        match callback {
            Some(callback) => callback(self.chrome.runtime().send_message(message)),
            None => self.chrome.runtime().post_message(message),
        }
    }

    /// `runtime.getURL(path)`; a missing path resolves to the origin root.
    pub fn runtime_get_url(&self, path: Option<&str>) -> String {
        self.chrome.runtime().get_url(path.unwrap_or(""))
    }

    /// `storage.local.get(keys, cb)`; also returns the result.
    pub fn storage_get(
        &self,
        keys: &Value,
        callback: Option<impl FnOnce(Map<String, Value>)>,
    ) -> Map<String, Value> {
        let result = self.chrome.storage().local().get(storage_selector(keys));
        deliver(result.clone(), callback);
        result
    }

    /// `storage.local.set(items, cb)`; non-object items are a no-op.
    pub fn storage_set(&self, items: &Value, callback: Option<impl FnOnce(())>) {
        if let Value::Object(items) = items {
            self.chrome.storage().local().set(items.clone());
        }
        deliver((), callback);
    }

    /// `storage.local.remove(keys, cb)`
    pub fn storage_remove(&self, keys: &Value, callback: Option<impl FnOnce(())>) {
        self.chrome.storage().local().remove(storage_keys(keys));
        deliver((), callback);
    }

    /// `storage.local.clear(cb)`
    pub fn storage_clear(&self, callback: Option<impl FnOnce(())>) {
        self.chrome.storage().local().clear();
        deliver((), callback);
    }

    /// `tabs.query(info, cb)`
    pub fn tabs_query(
        &self,
        query_info: &Value,
        callback: Option<impl FnOnce(Vec<Tab>)>,
    ) -> Vec<Tab> {
        let tabs = self.chrome.tabs().query(query_info);
        deliver(tabs.clone(), callback);
        tabs
    }

    /// `tabs.get(id, cb)`
    pub fn tabs_get(&self, id: i64, callback: Option<impl FnOnce(Tab)>) -> Tab {
        let tab = self.chrome.tabs().get(id);
        deliver(tab.clone(), callback);
        tab
    }

    /// `tabs.create(props, cb)`; unreadable props count as empty.
    pub fn tabs_create(&self, properties: &Value, callback: Option<impl FnOnce(Tab)>) -> Tab {
        let properties: TabCreateProperties =
            serde_json::from_value(properties.clone()).unwrap_or_default();
        let tab = self.chrome.tabs().create(properties);
        deliver(tab.clone(), callback);
        tab
    }

    /// `tabs.sendMessage(id, msg, cb)`. Without a callback no response is built.
    pub fn tabs_send_message(
        &self,
        tab_id: i64,
        message: Value,
        callback: Option<impl FnOnce(Value)>,
    ) {
        match callback {
            Some(callback) => callback(self.chrome.tabs().send_message(tab_id, message)),
            None => self.chrome.tabs().post_message(tab_id, message),
        }
    }

    /// `alarms.create(nameOrInfo, info)`
    pub fn alarms_create(&self, name_or_info: &Value, info: Option<&Value>) {
        self.chrome.alarms().create_from(alarm_args(name_or_info, info));
    }

    /// `contextMenus.create(props, cb)`; the callback receives the item id.
    pub fn context_menus_create(
        &self,
        properties: &Value,
        callback: Option<impl FnOnce(String)>,
    ) -> String {
        let properties: MenuItemProperties =
            serde_json::from_value(properties.clone()).unwrap_or_default();
        let id = self.chrome.context_menus().create(properties);
        deliver(id.clone(), callback);
        id
    }

    /// `contextMenus.__click(id, info, tab)`; non-object info is dropped.
    pub fn context_menus_click(
        &self,
        menu_item_id: &str,
        info: Option<&Value>,
        tab: Option<Value>,
    ) {
        let info = match info {
            Some(Value::Object(info)) => info.clone(),
            _ => Map::new(),
        };
        self.chrome.context_menus().click(menu_item_id, info, tab);
    }

    /// `notifications.create(id, options, cb)`
    pub fn notifications_create(
        &self,
        id: Option<&str>,
        options: &Value,
        callback: Option<impl FnOnce(String)>,
    ) -> String {
        let id = self.chrome.notifications().create(id, options);
        deliver(id.clone(), callback);
        id
    }

    /// `notifications.clear(id, cb)`
    pub fn notifications_clear(&self, id: &str, callback: Option<impl FnOnce(bool)>) -> bool {
        let cleared = self.chrome.notifications().clear(id);
        deliver(cleared, callback);
        cleared
    }

    /// `windows.getCurrent(cb)`
    pub fn windows_get_current(&self, callback: Option<impl FnOnce(Window)>) -> Window {
        let window = self.chrome.windows().get_current();
        deliver(window.clone(), callback);
        window
    }

    /// `windows.create(opts, cb)`; non-object options count as empty.
    pub fn windows_create(&self, options: &Value, callback: Option<impl FnOnce(Window)>) -> Window {
        let options = match options {
            Value::Object(options) => options.clone(),
            _ => Map::new(),
        };
        let window = self.chrome.windows().create(options);
        deliver(window.clone(), callback);
        window
    }
}

/// Placeholder type for omitted callbacks, e.g. `None::<NoCallback<Value>>`.
pub type NoCallback<T> = fn(T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::event::listener;
    use crate::mock::{Alarm, MenuClick, MessageEvent};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    fn api() -> CallbackApi {
        let mut config = Config::default();
        config.diagnostics.enabled = false;
        CallbackApi::new(Arc::new(Chrome::new(&config, None)))
    }

    /// Collects every value a callback receives.
    fn collector<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn() -> Box<dyn FnOnce(T)>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let seen = Arc::clone(&seen);
            move || {
                let seen = Arc::clone(&seen);
                Box::new(move |value: T| seen.lock().push(value)) as Box<dyn FnOnce(T)>
            }
        };
        (seen, make)
    }

    #[test]
    fn test_ping_scenario() {
        let api = api();
        api.chrome()
            .runtime()
            .on_message()
            .subscribe(listener(|event: &MessageEvent| {
                event.respond(json!({ "value": 42 }));
            }));

        let (seen, callback) = collector::<Value>();
        api.runtime_send_message(json!({ "op": "ping" }), Some(callback()));
        assert_eq!(*seen.lock(), vec![json!({ "value": 42 })]);
    }

    #[test]
    fn test_send_without_listener_echoes_once() {
        let api = api();
        let (seen, callback) = collector::<Value>();
        api.runtime_send_message(json!([1, 2]), Some(callback()));
        assert_eq!(*seen.lock(), vec![json!({ "ok": true, "echo": [1, 2] })]);
    }

    #[test]
    fn test_send_without_callback_is_fire_and_forget() {
        let api = api();
        let flags = Arc::new(Mutex::new(Vec::new()));
        {
            let flags = Arc::clone(&flags);
            api.chrome()
                .runtime()
                .on_message()
                .subscribe(listener(move |event: &MessageEvent| {
                    flags.lock().push(event.responder.expects_response());
                }));
        }

        api.runtime_send_message(json!("x"), None::<NoCallback<Value>>);
        api.tabs_send_message(2, json!("y"), None::<NoCallback<Value>>);
        assert_eq!(*flags.lock(), vec![false, false]);
    }

    #[test]
    fn test_storage_round_trip_with_callbacks() {
        let api = api();
        let (done, unit) = collector::<()>();
        let (results, callback) = collector::<Map<String, Value>>();

        api.storage_set(&json!({ "a": 1 }), Some(unit()));
        api.storage_get(&json!("a"), Some(callback()));

        api.storage_remove(&json!("a"), Some(unit()));
        api.storage_get(&json!("a"), Some(callback()));

        api.storage_set(&json!({ "b": 2 }), None::<NoCallback<()>>);
        api.storage_clear(Some(unit()));
        api.storage_get(&Value::Null, Some(callback()));

        assert_eq!(done.lock().len(), 3);
        let results: Vec<Value> = results.lock().drain(..).map(Value::Object).collect();
        assert_eq!(
            results,
            vec![json!({ "a": 1 }), json!({ "a": null }), json!({})]
        );
    }

    #[test]
    fn test_storage_argument_shapes() {
        assert_eq!(storage_selector(&Value::Null), StorageSelector::All);
        assert_eq!(
            storage_selector(&json!(["a", 1, "b"])),
            StorageSelector::Keys(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(storage_selector(&json!(5)), StorageSelector::Keys(Vec::new()));
        assert_eq!(storage_selector(&json!(true)), StorageSelector::Keys(Vec::new()));
        assert_eq!(storage_keys(&json!(["x", null])), vec!["x"]);
        assert!(storage_keys(&json!({ "x": 1 })).is_empty());

        let api = api();
        api.storage_set(&json!({ "kept": true }), None::<NoCallback<()>>);
        api.storage_set(&Value::Null, None::<NoCallback<()>>);
        api.storage_set(&json!("not an object"), None::<NoCallback<()>>);
        assert_eq!(
            Value::Object(api.storage_get(&Value::Null, None::<NoCallback<Map<String, Value>>>)),
            json!({ "kept": true })
        );

        let defaults = api.storage_get(
            &json!({ "kept": false, "other": "d" }),
            None::<NoCallback<Map<String, Value>>>,
        );
        assert_eq!(Value::Object(defaults), json!({ "kept": true, "other": "d" }));
    }

    #[test]
    fn test_falsy_get_reads_whole_store() {
        let api = api();
        api.storage_set(&json!({ "a": 1, "b": "two" }), None::<NoCallback<()>>);

        for keys in [json!(""), json!(false), json!(0), json!(0.0)] {
            assert_eq!(storage_selector(&keys), StorageSelector::All);
            let result = api.storage_get(&keys, None::<NoCallback<Map<String, Value>>>);
            assert_eq!(Value::Object(result), json!({ "a": 1, "b": "two" }));
        }
    }

    #[test]
    fn test_alarm_argument_shapes() {
        assert_eq!(
            alarm_args(&json!("x"), Some(&json!({ "delayInMinutes": 1 }))),
            AlarmArgs::Named(
                "x".to_string(),
                AlarmCreateInfo {
                    name: None,
                    delay_in_minutes: Some(1.0)
                }
            )
        );
        assert_eq!(
            alarm_args(&json!({ "name": "y" }), None),
            AlarmArgs::Info(AlarmCreateInfo {
                name: Some("y".to_string()),
                delay_in_minutes: None
            })
        );
        assert_eq!(
            alarm_args(&Value::Null, None),
            AlarmArgs::Info(AlarmCreateInfo::default())
        );
        assert_eq!(
            alarm_args(&json!("z"), Some(&json!("garbage"))),
            AlarmArgs::Named("z".to_string(), AlarmCreateInfo::default())
        );
    }

    #[test]
    fn test_alarms_create_fires() {
        let api = api();
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        api.chrome()
            .alarms()
            .on_alarm()
            .subscribe(listener(move |alarm: &Alarm| {
                let _ = tx.lock().send(alarm.name.clone());
            }));

        api.alarms_create(&json!({ "name": "from-options" }), None);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            "from-options"
        );
    }

    #[test]
    fn test_alarms_create_with_huge_delay() {
        let api = api();
        api.alarms_create(&json!("x"), Some(&json!({ "delayInMinutes": 1e300 })));
        api.alarms_create(&json!({ "name": "y", "delayInMinutes": f64::MAX }), None);
        assert_eq!(
            alarm_args(&json!("x"), Some(&json!({ "delayInMinutes": 1e300 })))
                .into_spec("unused")
                .delay,
            Duration::MAX
        );
    }

    #[test]
    fn test_optional_listeners() {
        let api = api();
        let channel = api.chrome().context_menus().on_clicked();

        add_listener::<MenuClick>(channel, None);
        assert!(!channel.has_subscribers());

        let clicked = Arc::new(Mutex::new(Vec::new()));
        let handler: Listener<MenuClick> = {
            let clicked = Arc::clone(&clicked);
            listener(move |click: &MenuClick| {
                clicked.lock().push(click.menu_item_id().map(str::to_string));
            })
        };
        add_listener(channel, Some(Arc::clone(&handler)));

        api.context_menus_click("item", Some(&json!("not an object")), None);
        remove_listener(channel, Some(&handler));
        remove_listener::<MenuClick>(channel, None);
        api.context_menus_click("item", None, None);

        assert_eq!(*clicked.lock(), vec![Some("item".to_string())]);
    }

    #[test]
    fn test_stub_namespaces_with_callbacks() {
        let api = api();

        let (tabs, on_tabs) = collector::<Vec<Tab>>();
        api.tabs_query(&json!({}), Some(on_tabs()));
        assert_eq!(tabs.lock()[0][0].id, 1);

        let (tab, on_tab) = collector::<Tab>();
        api.tabs_get(3, Some(on_tab()));
        api.tabs_create(&json!({ "url": "https://new.test" }), Some(on_tab()));
        api.tabs_create(&json!(17), Some(on_tab()));
        {
            let tab = tab.lock();
            assert_eq!(tab[0].title, "Mock tab 3");
            assert_eq!(tab[1].url, "https://new.test");
            assert_eq!(tab[2].url, "about:blank");
        }

        let (ids, on_id) = collector::<String>();
        api.context_menus_create(&json!({ "id": "copy", "title": "Copy" }), Some(on_id()));
        api.context_menus_create(&json!({ "title": "No id" }), Some(on_id()));
        api.notifications_create(Some("n1"), &json!({}), Some(on_id()));
        assert_eq!(ids.lock()[..], ["copy", "menu-item", "n1"]);

        let (cleared, on_cleared) = collector::<bool>();
        api.notifications_clear("n1", Some(on_cleared()));
        assert_eq!(*cleared.lock(), vec![true]);

        let (windows, on_window) = collector::<Window>();
        api.windows_get_current(Some(on_window()));
        api.windows_create(&json!({ "focused": false }), Some(on_window()));
        {
            let windows = windows.lock();
            assert_eq!(windows[0].id, json!(1));
            assert_eq!(windows[1].properties["focused"], json!(false));
        }

        assert_eq!(api.runtime_get_url(None), "http://localhost/");
        assert_eq!(api.runtime_get_url(Some("a.html")), "http://localhost/a.html");
    }
}
