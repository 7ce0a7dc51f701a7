//! `browser_action`: dispatches one deterministic action to the Browser
//! Facade. Shadow DOM piercing is the `>>` combinator inside a selector
//! string, which the facade/driver handle transparently — this module just
//! forwards the selector as written.

use super::NodeContext;
use crate::error::{RuntimeError, RuntimeResult};
use serde_json::{json, Value};

fn field_str<'a>(config: &'a Value, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

fn modifiers(config: &Value) -> Vec<String> {
    config
        .get("modifiers")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

pub async fn execute(ctx: &NodeContext<'_>, config: &Value) -> RuntimeResult<Value> {
    let action = field_str(config, "action")
        .ok_or_else(|| RuntimeError::Validation("browser_action requires 'action'".into()))?;
    let tab = field_str(config, "tab");
    let nth = config.get("nth").cloned().unwrap_or(Value::Null);

    match action {
        "navigate" => {
            let url = field_str(config, "url")
                .ok_or_else(|| RuntimeError::Validation("navigate requires 'url'".into()))?;
            ctx.browser.navigate(url, tab, field_str(config, "waitUntil")).await?;
            Ok(json!({ "navigated": url }))
        }
        "back" => {
            ctx.browser.back(tab).await?;
            Ok(Value::Null)
        }
        "forward" => {
            ctx.browser.forward(tab).await?;
            Ok(Value::Null)
        }
        "refresh" => {
            ctx.browser.refresh(tab).await?;
            Ok(Value::Null)
        }
        "click" => {
            let selector = field_str(config, "selector")
                .ok_or_else(|| RuntimeError::Validation("click requires 'selector'".into()))?;
            ctx.browser.click(tab, selector, &nth).await?;
            Ok(json!({ "clicked": selector }))
        }
        "type" => {
            let selector = field_str(config, "selector")
                .ok_or_else(|| RuntimeError::Validation("type requires 'selector'".into()))?;
            let text = field_str(config, "text").unwrap_or_default();
            ctx.browser.type_text(tab, selector, text, &nth).await?;
            Ok(json!({ "typed": text }))
        }
        "keypress" => {
            let key = field_str(config, "key")
                .ok_or_else(|| RuntimeError::Validation("keypress requires 'key'".into()))?;
            ctx.browser.keypress(tab, key, &modifiers(config)).await?;
            Ok(Value::Null)
        }
        "scrollIntoView" => {
            let selector = field_str(config, "selector")
                .ok_or_else(|| RuntimeError::Validation("scrollIntoView requires 'selector'".into()))?;
            let max_attempts = config.get("maxAttempts").and_then(Value::as_u64).map(|n| n as u32);
            ctx.browser.scroll_into_view(tab, selector, max_attempts).await?;
            Ok(Value::Null)
        }
        "scrollToRow" => {
            let index = config
                .get("index")
                .and_then(Value::as_i64)
                .ok_or_else(|| RuntimeError::Validation("scrollToRow requires 'index'".into()))?;
            let row_height = config.get("rowHeight").and_then(Value::as_f64);
            ctx.browser.scroll_to_row(tab, index, row_height).await?;
            Ok(Value::Null)
        }
        "wait" => {
            if let Some(ms) = config.get("time").and_then(Value::as_u64) {
                ctx.browser.wait_time(ms).await;
            } else if let Some(selector) = field_str(config, "selector") {
                let timeout = config.get("timeoutMs").and_then(Value::as_u64);
                ctx.browser.wait_selector(tab, selector, timeout).await?;
            } else {
                let timeout = config.get("timeoutMs").and_then(Value::as_u64);
                ctx.browser.wait_navigation(tab, timeout).await?;
            }
            Ok(Value::Null)
        }
        other => Err(RuntimeError::Validation(format!("unknown browser_action action '{other}'"))),
    }
}
