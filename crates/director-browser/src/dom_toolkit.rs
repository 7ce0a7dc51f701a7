//! DOM Toolkit: token-efficient, read-only introspection
//! over a `DomSnapshot`.

use crate::actionability::{self, Actionability};
use director_core::dom::DomElement;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Default, Serialize)]
pub struct OverviewFilters {
    pub outline: bool,
    pub interactives: bool,
    pub headings: bool,
}

#[derive(Debug, Serialize)]
pub struct OverviewSummary {
    pub total_elements: usize,
    pub outline_count: usize,
    pub interactive_count: usize,
    pub heading_count: usize,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub outline: Vec<DomElement>,
    pub interactives: Vec<DomElement>,
    pub headings: Vec<DomElement>,
    pub summary: OverviewSummary,
}

#[derive(Debug, Serialize, Default)]
pub struct OverviewDiff {
    pub added: Vec<DomElement>,
    pub removed: Vec<String>,
    pub modified: Vec<DomElement>,
}

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const OUTLINE_TAGS: &[&str] = &[
    "div", "section", "article", "main", "header", "footer", "nav", "aside", "ul", "ol", "table",
];

fn elements(snapshot: &director_core::dom::DomSnapshot, visible_only: bool) -> Vec<&DomElement> {
    snapshot
        .element_index
        .values()
        .filter(|el| !visible_only || el.visible)
        .collect()
}

fn is_interactive(el: &DomElement) -> bool {
    actionability::evaluate(el).is_actionable
}

fn is_heading(el: &DomElement) -> bool {
    HEADING_TAGS.contains(&el.tag.to_lowercase().as_str())
}

fn is_outline(el: &DomElement) -> bool {
    OUTLINE_TAGS.contains(&el.tag.to_lowercase().as_str())
}

/// Structural/interactive overview, optionally filtered to the elements
/// visible and `maxRows`-limited.
pub fn overview(
    snapshot: &director_core::dom::DomSnapshot,
    filters: &OverviewFilters,
    visible_only: bool,
    max_rows: Option<usize>,
) -> Overview {
    let all = elements(snapshot, visible_only);
    let cap = |mut v: Vec<DomElement>| {
        if let Some(max) = max_rows {
            v.truncate(max);
        }
        v
    };

    let outline = if filters.outline {
        cap(all.iter().filter(|e| is_outline(e)).map(|e| (*e).clone()).collect())
    } else {
        Vec::new()
    };
    let interactives = if filters.interactives {
        cap(all.iter().filter(|e| is_interactive(e)).map(|e| (*e).clone()).collect())
    } else {
        Vec::new()
    };
    let headings = if filters.headings {
        cap(all.iter().filter(|e| is_heading(e)).map(|e| (*e).clone()).collect())
    } else {
        Vec::new()
    };

    Overview {
        summary: OverviewSummary {
            total_elements: all.len(),
            outline_count: outline.len(),
            interactive_count: interactives.len(),
            heading_count: headings.len(),
        },
        outline,
        interactives,
        headings,
    }
}

/// Diff an overview's filtered lists between two snapshots of the same
/// tab, keyed by element id.
pub fn overview_diff(prev: &director_core::dom::DomSnapshot, next: &director_core::dom::DomSnapshot) -> OverviewDiff {
    let prev_ids: HashSet<&String> = prev.element_index.keys().collect();
    let next_ids: HashSet<&String> = next.element_index.keys().collect();

    let added = next
        .element_index
        .iter()
        .filter(|(id, _)| !prev_ids.contains(id))
        .map(|(_, el)| el.clone())
        .collect();
    let removed = prev_ids
        .iter()
        .filter(|id| !next_ids.contains(**id))
        .map(|id| (*id).clone())
        .collect();
    let modified = next
        .element_index
        .iter()
        .filter(|(id, el)| prev.element_index.get(*id).is_some_and(|prev_el| prev_el.bounds != el.bounds))
        .map(|(_, el)| el.clone())
        .collect();

    OverviewDiff { added, removed, modified }
}

/// Pure hierarchical outline, truncated to `depth` levels of ancestry.
pub fn structure(snapshot: &director_core::dom::DomSnapshot, depth: usize) -> Vec<DomElement> {
    elements(snapshot, false)
        .into_iter()
        .filter(|el| el.ancestry.len() <= depth)
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
pub struct SearchQuery<'a> {
    pub text: Option<&'a str>,
    pub selector_tag: Option<&'a str>,
    pub attributes: Vec<(&'a str, &'a str)>,
    pub role: Option<&'a str>,
}

pub fn search(
    snapshot: &director_core::dom::DomSnapshot,
    query: &SearchQuery,
    limit: Option<usize>,
    visible_only: bool,
) -> Vec<DomElement> {
    let matches = elements(snapshot, visible_only).into_iter().filter(|el| {
        let text_ok = query
            .text
            .map(|t| el.text.as_deref().unwrap_or_default().to_lowercase().contains(&t.to_lowercase()))
            .unwrap_or(true);
        let tag_ok = query.selector_tag.map(|tag| el.tag.eq_ignore_ascii_case(tag)).unwrap_or(true);
        let role_ok = query.role.map(|r| el.role.as_deref() == Some(r)).unwrap_or(true);
        let attrs_ok = query.attributes.iter().all(|(k, v)| el.attr(k) == Some(*v));
        text_ok && tag_ok && role_ok && attrs_ok
    });

    match limit {
        Some(n) => matches.take(n).cloned().collect(),
        None => matches.cloned().collect(),
    }
}

#[derive(Debug, Default)]
pub struct InspectInclude {
    pub attributes: bool,
    pub parents: bool,
    pub children: bool,
    pub siblings: bool,
}

#[derive(Debug, Serialize)]
pub struct InspectResult {
    pub element: DomElement,
    pub actionability: Actionability,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub siblings: Vec<String>,
}

pub fn inspect(
    snapshot: &director_core::dom::DomSnapshot,
    element_id: &str,
    include: &InspectInclude,
) -> Option<InspectResult> {
    let element = snapshot.get(element_id)?.clone();
    let parents = if include.parents { element.ancestry.clone() } else { Vec::new() };
    let children = if include.children {
        snapshot
            .element_index
            .values()
            .filter(|el| el.ancestry.last().map(|a| a == element_id).unwrap_or(false))
            .map(|el| el.id.clone())
            .collect()
    } else {
        Vec::new()
    };
    let siblings = if include.siblings {
        let parent = element.ancestry.last();
        snapshot
            .element_index
            .values()
            .filter(|el| el.id != element_id && el.ancestry.last() == parent)
            .map(|el| el.id.clone())
            .collect()
    } else {
        Vec::new()
    };

    let actionability = actionability::evaluate(&element);
    Some(InspectResult { element, actionability, parents, children, siblings })
}

/// New top-level, body-mounted elements since a baseline snapshot — the
/// mechanism for detecting modals, dropdowns, and other portal UI.
pub fn check_portals(baseline: &director_core::dom::DomSnapshot, current: &director_core::dom::DomSnapshot) -> Vec<DomElement> {
    let baseline_ids: HashSet<&String> = baseline.element_index.keys().collect();
    current
        .element_index
        .values()
        .filter(|el| el.mounted_at_body && !baseline_ids.contains(&el.id))
        .cloned()
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ClickInspectCandidate {
    pub selector: String,
    pub stability_rank: u8,
}

#[derive(Debug, Serialize)]
pub struct ClickInspectResult {
    pub element: DomElement,
    pub actionability: Actionability,
    pub candidates: Vec<ClickInspectCandidate>,
    pub parents: Vec<String>,
}

/// Given screen coordinates (typically from a screenshot), find the
/// element whose bounds contain the point and rank candidate selectors
/// by stability: data-testid > stable id > role+attrs > class+tag > text.
pub fn click_inspect(snapshot: &director_core::dom::DomSnapshot, x: f64, y: f64) -> Option<ClickInspectResult> {
    let hit = snapshot.element_index.values().find(|el| {
        x >= el.bounds.x
            && x <= el.bounds.x + el.bounds.width
            && y >= el.bounds.y
            && y <= el.bounds.y + el.bounds.height
    })?;

    let mut candidates = Vec::new();
    if let Some(testid) = hit.attr("data-testid") {
        candidates.push(ClickInspectCandidate { selector: format!("[data-testid=\"{testid}\"]"), stability_rank: 4 });
    }
    if let Some(id) = hit.attr("id") {
        candidates.push(ClickInspectCandidate { selector: format!("#{id}"), stability_rank: 3 });
    }
    if let Some(role) = &hit.role {
        candidates.push(ClickInspectCandidate { selector: format!("[role=\"{role}\"]"), stability_rank: 2 });
    }
    if let Some(class) = hit.attr("class") {
        let first_class = class.split_whitespace().next().unwrap_or_default();
        candidates.push(ClickInspectCandidate { selector: format!("{}.{}", hit.tag, first_class), stability_rank: 1 });
    }
    if let Some(text) = &hit.text {
        candidates.push(ClickInspectCandidate { selector: format!("{}:has-text(\"{}\")", hit.tag, text), stability_rank: 0 });
    }
    candidates.sort_by(|a, b| b.stability_rank.cmp(&a.stability_rank));

    Some(ClickInspectResult {
        element: hit.clone(),
        actionability: actionability::evaluate(hit),
        candidates,
        parents: hit.ancestry.clone(),
    })
}

/// Match a simplified CSS selector (`tag`, `#id`, `.class`,
/// `[attr="value"]`, and concatenations of those with no combinators)
/// against a captured element. Used by `browser_query` to check element
/// existence/absence and by deterministic extraction, since the real
/// driver's full CSS engine lives outside this workspace's scope.
pub fn matches_selector(el: &DomElement, selector: &str) -> bool {
    let selector = selector.trim();
    if selector.is_empty() {
        return false;
    }

    let mut rest = selector;
    let mut tag: Option<&str> = None;
    let mut id: Option<&str> = None;
    let mut classes = Vec::new();
    let mut attrs = Vec::new();

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('#') {
            let end = stripped.find(['.', '[']).unwrap_or(stripped.len());
            id = Some(&stripped[..end]);
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('.') {
            let end = stripped.find(['.', '[', '#']).unwrap_or(stripped.len());
            classes.push(&stripped[..end]);
            rest = &stripped[end..];
        } else if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').unwrap_or(stripped.len());
            attrs.push(&stripped[..end]);
            rest = stripped.get(end + 1..).unwrap_or("");
        } else {
            let end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
            tag = Some(&rest[..end]);
            rest = &rest[end..];
        }
    }

    if let Some(tag) = tag {
        if !el.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = id {
        if el.attr("id") != Some(id) {
            return false;
        }
    }
    if !classes.is_empty() {
        let class_attr = el.attr("class").unwrap_or_default();
        let el_classes: Vec<&str> = class_attr.split_whitespace().collect();
        if !classes.iter().all(|c| el_classes.contains(c)) {
            return false;
        }
    }
    for raw in attrs {
        let (key, expected) = match raw.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim().trim_matches('"').trim_matches('\''))),
            None => (raw.trim(), None),
        };
        match expected {
            Some(expected) => {
                if el.attr(key) != Some(expected) {
                    return false;
                }
            }
            None => {
                if el.attr(key).is_none() {
                    return false;
                }
            }
        }
    }

    true
}

/// All elements in a snapshot matching a simplified CSS selector.
pub fn query_selector_all<'a>(snapshot: &'a director_core::dom::DomSnapshot, selector: &str) -> Vec<&'a DomElement> {
    snapshot.element_index.values().filter(|el| matches_selector(el, selector)).collect()
}

pub fn overview_filters_from_json(value: &Value) -> OverviewFilters {
    OverviewFilters {
        outline: value.get("outline").and_then(Value::as_bool).unwrap_or(false),
        interactives: value.get("interactives").and_then(Value::as_bool).unwrap_or(false),
        headings: value.get("headings").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use director_core::dom::{Bounds, DomSnapshot};
    use std::collections::HashMap;

    fn snapshot_with(elements: Vec<DomElement>) -> DomSnapshot {
        DomSnapshot {
            snapshot_id: "s1".into(),
            tab_name: "main".into(),
            url: "https://example.com".into(),
            captured_at: "2026-01-01T00:00:00Z".into(),
            element_index: elements.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    fn button(id: &str) -> DomElement {
        DomElement {
            id: id.into(),
            tag: "button".into(),
            attrs: HashMap::new(),
            bounds: Bounds { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
            text: Some("Go".into()),
            ancestry: Vec::new(),
            role: None,
            visible: true,
            in_viewport: true,
            mounted_at_body: false,
        }
    }

    #[test]
    fn overview_counts_match_filtered_lists() {
        let snapshot = snapshot_with(vec![button("1"), button("2")]);
        let filters = OverviewFilters { outline: false, interactives: true, headings: false };
        let result = overview(&snapshot, &filters, true, None);
        assert_eq!(result.interactives.len(), 2);
        assert_eq!(result.summary.interactive_count, 2);
    }

    #[test]
    fn check_portals_finds_new_body_mounted_elements() {
        let baseline = snapshot_with(vec![button("1")]);
        let mut modal = button("2");
        modal.mounted_at_body = true;
        let current = snapshot_with(vec![button("1"), modal]);
        let portals = check_portals(&baseline, &current);
        assert_eq!(portals.len(), 1);
        assert_eq!(portals[0].id, "2");
    }

    #[test]
    fn check_portals_empty_when_nothing_changed() {
        let baseline = snapshot_with(vec![button("1")]);
        let current = snapshot_with(vec![button("1")]);
        assert!(check_portals(&baseline, &current).is_empty());
    }

    #[test]
    fn click_inspect_ranks_data_testid_highest() {
        let mut el = button("1");
        el.attrs.insert("data-testid".into(), "submit".into());
        el.attrs.insert("id".into(), "submit-btn".into());
        let snapshot = snapshot_with(vec![el]);
        let result = click_inspect(&snapshot, 5.0, 5.0).unwrap();
        assert_eq!(result.candidates[0].selector, "[data-testid=\"submit\"]");
    }

    #[test]
    fn matches_selector_by_tag_id_and_class() {
        let mut el = button("1");
        el.attrs.insert("id".into(), "submit".into());
        el.attrs.insert("class".into(), "btn primary".into());
        assert!(matches_selector(&el, "button"));
        assert!(matches_selector(&el, "#submit"));
        assert!(matches_selector(&el, ".primary"));
        assert!(matches_selector(&el, "button#submit.btn"));
        assert!(!matches_selector(&el, "#other"));
    }

    #[test]
    fn matches_selector_by_attribute() {
        let mut el = button("1");
        el.attrs.insert("data-id".into(), "5".into());
        assert!(matches_selector(&el, "[data-id=\"5\"]"));
        assert!(matches_selector(&el, "[data-id]"));
        assert!(!matches_selector(&el, "[data-id=\"6\"]"));
    }

    #[test]
    fn query_selector_all_filters_snapshot() {
        let mut a = button("1");
        a.attrs.insert("class".into(), "row".into());
        let b = button("2");
        let snapshot = snapshot_with(vec![a, b]);
        let rows = query_selector_all(&snapshot, ".row");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1");
    }
}
