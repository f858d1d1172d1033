//! W3C WebDriver wire shapes.
//!
//! Every response body is `{"value": ...}`; errors carry
//! `{"value": {"error": "<code>", "message": "..."}}`.

use serde::Deserialize;
use serde_json::Value;

/// Key under which W3C encodes element references.
pub(super) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub(super) const SCROLL_SCRIPT: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'nearest'});";

#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorValue {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct NewSession {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Pulls the element id out of a `{"element-6066-...": "<id>"}` reference.
pub(super) fn element_id(reference: &Value) -> Option<String> {
    reference
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_owned)
}

pub(super) fn element_reference(id: &str) -> Value {
    let mut reference = serde_json::Map::new();
    reference.insert(ELEMENT_KEY.to_owned(), Value::String(id.to_owned()));
    Value::Object(reference)
}

/// Chrome capabilities for a new session.
pub(super) fn chrome_capabilities(headless: bool, user_agent: &str) -> Value {
    let mut args: Vec<String> = Vec::new();
    if headless {
        args.push("--headless=new".to_owned());
        args.push("--disable-gpu".to_owned());
    }
    args.push(format!("--user-agent={user_agent}"));
    args.push("--no-sandbox".to_owned());
    args.push("--disable-dev-shm-usage".to_owned());
    args.push("--disable-blink-features=AutomationControlled".to_owned());
    args.push("--window-size=1920,1080".to_owned());

    serde_json::json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false
                }
            }
        }
    })
}
