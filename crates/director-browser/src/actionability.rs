//! Actionability evaluator: a deterministic scoring
//! function over an element, its bounds, and its role.

use director_core::dom::DomElement;
use serde::Serialize;

const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];
const INTERACTIVE_ROLES: &[&str] = &["button", "link", "checkbox", "radio", "menuitem", "tab", "switch"];
const FRAMEWORK_INDICATORS: &[&str] = &["rowSelectionEnabled"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub enum Signal {
    Visible,
    HitTestable,
    InteractiveTag,
    InteractiveRole,
    TabIndex,
    FrameworkIndicator,
}

#[derive(Debug, Clone, Serialize)]
pub struct Actionability {
    pub is_actionable: bool,
    pub matched_signals: Vec<Signal>,
}

/// Score one element for actionability: visible, hit-testable at its
/// center, and matching at least one interactivity signal.
pub fn evaluate(el: &DomElement) -> Actionability {
    let mut matched = Vec::new();

    if el.visible {
        matched.push(Signal::Visible);
    }
    if el.in_viewport && el.bounds.width > 0.0 && el.bounds.height > 0.0 {
        matched.push(Signal::HitTestable);
    }
    if INTERACTIVE_TAGS.contains(&el.tag.to_lowercase().as_str()) {
        matched.push(Signal::InteractiveTag);
    }
    if let Some(role) = &el.role {
        if INTERACTIVE_ROLES.contains(&role.to_lowercase().as_str()) {
            matched.push(Signal::InteractiveRole);
        }
    }
    if let Some(tabindex) = el.attr("tabindex").and_then(|v| v.parse::<i64>().ok()) {
        if tabindex >= 0 {
            matched.push(Signal::TabIndex);
        }
    }
    if let Some(class) = el.attr("class") {
        if FRAMEWORK_INDICATORS.iter().any(|indicator| class.contains(indicator)) {
            matched.push(Signal::FrameworkIndicator);
        }
    }

    let has_visibility = matched.contains(&Signal::Visible);
    let has_hit_test = matched.contains(&Signal::HitTestable);
    let has_interactivity = matched.iter().any(|s| {
        matches!(
            s,
            Signal::InteractiveTag | Signal::InteractiveRole | Signal::TabIndex | Signal::FrameworkIndicator
        )
    });

    Actionability {
        is_actionable: has_visibility && has_hit_test && has_interactivity,
        matched_signals: matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_core::dom::Bounds;
    use std::collections::HashMap;

    fn el(tag: &str, visible: bool, in_viewport: bool) -> DomElement {
        DomElement {
            id: "1".into(),
            tag: tag.into(),
            attrs: HashMap::new(),
            bounds: Bounds { x: 0.0, y: 0.0, width: 50.0, height: 20.0 },
            text: None,
            ancestry: Vec::new(),
            role: None,
            visible,
            in_viewport,
            mounted_at_body: false,
        }
    }

    #[test]
    fn button_visible_in_viewport_is_actionable() {
        let result = evaluate(&el("button", true, true));
        assert!(result.is_actionable);
    }

    #[test]
    fn hidden_element_is_not_actionable() {
        let result = evaluate(&el("button", false, true));
        assert!(!result.is_actionable);
    }

    #[test]
    fn non_interactive_div_is_not_actionable() {
        let result = evaluate(&el("div", true, true));
        assert!(!result.is_actionable);
    }

    #[test]
    fn tabindex_makes_div_actionable() {
        let mut e = el("div", true, true);
        e.attrs.insert("tabindex".into(), "0".into());
        assert!(evaluate(&e).is_actionable);
    }
}
