//! Attribute writes
//!
//! Routes one attribute change from the reconciler to the adapter: event
//! listeners, aliases, `style`/`class` objects, booleans and SVG xlink names.

use crate::adapter::{Namespace, NodeId, TreeAdapter, TreeResult};
use crate::config::EngineConfig;
use crate::value::{format_number, Value};
use tracing::trace;

/// Names that shape the tree rather than describe a node
pub const RESERVED_ATTRIBUTES: [&str; 4] = ["key", "ref", "children", "innerHTML"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&name)
}

/// `onClick` -> `("click", false)`, `onClickCapture` -> `("click", true)`
pub fn event_name(name: &str) -> Option<(String, bool)> {
    let rest = name.strip_prefix("on")?;
    if !rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return None;
    }

    match rest.strip_suffix("Capture") {
        Some(base) if !base.is_empty() => Some((base.to_ascii_lowercase(), true)),
        _ => Some((rest.to_ascii_lowercase(), false)),
    }
}

/// `xlink:href` / `xlinkHref` -> `href`
fn xlink_name(name: &str) -> Option<String> {
    let rest = name.strip_prefix("xlink")?;
    let rest = rest.strip_prefix(':').unwrap_or(rest);
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}

/// camelCase -> kebab-case, with the `ms` vendor prefix kept as `-ms-`
pub fn hyphenate(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

/// Serialize a style object to css text
pub fn style_to_css(style: &std::collections::BTreeMap<String, Value>, config: &EngineConfig) -> String {
    style
        .iter()
        .filter_map(|(property, value)| {
            let text = match value {
                Value::Number(n) if !config.is_unitless(property) => format!("{}px", format_number(*n)),
                other => other.to_text()?,
            };
            Some(format!("{}: {};", hyphenate(property), text))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Space-joined names whose value is truthy
pub fn class_names(classes: &std::collections::BTreeMap<String, Value>) -> String {
    classes
        .iter()
        .filter(|(_, enabled)| enabled.is_truthy())
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply one attribute change.
///
/// `old` is the previously rendered value (needed to unbind a listener);
/// a `Null` value clears the attribute.
pub fn set_accessor<A: TreeAdapter + ?Sized>(
    adapter: &mut A,
    config: &EngineConfig,
    node: NodeId,
    name: &str,
    value: &Value,
    old: Option<&Value>,
    svg: bool,
) -> TreeResult<()> {
    if is_reserved(name) {
        return Ok(());
    }

    if let Some((event, capture)) = event_name(name) {
        if let Some(Value::Handler(previous)) = old {
            adapter.unbind_event(node, &event, previous, capture)?;
        }
        if let Value::Handler(handler) = value {
            trace!(node = %node, event = %event, capture, "binding listener");
            adapter.bind_event(node, &event, handler, capture)?;
        }
        return Ok(());
    }

    if svg {
        if let Some(local) = xlink_name(name) {
            return match value {
                Value::Null | Value::Boolean(false) => {
                    adapter.remove_attribute(node, &local, Namespace::XLink)
                }
                other => match other.to_text() {
                    Some(text) => adapter.set_attribute(node, &local, &text, Namespace::XLink),
                    None => adapter.remove_attribute(node, &local, Namespace::XLink),
                },
            };
        }
    }

    let name = config.resolve_alias(name);

    let text = match (name, value) {
        (_, Value::Null) | (_, Value::Boolean(false)) => None,
        (_, Value::Boolean(true)) => Some(String::new()),
        ("style", Value::Object(style)) => Some(style_to_css(style, config)),
        ("class", Value::Object(classes)) => Some(class_names(classes)),
        (_, other) => other.to_text(),
    };

    match text {
        Some(text) => {
            trace!(node = %node, attribute = name, "set attribute");
            adapter.set_attribute(node, name, &text, Namespace::Html)
        }
        None => {
            trace!(node = %node, attribute = name, "clear attribute");
            adapter.remove_attribute(node, name, Namespace::Html)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    #[test]
    fn test_event_name() {
        assert_eq!(event_name("onClick"), Some(("click".to_string(), false)));
        assert_eq!(event_name("onKeyDownCapture"), Some(("keydown".to_string(), true)));
        assert_eq!(event_name("online"), None);
        assert_eq!(event_name("on"), None);
    }

    #[test]
    fn test_xlink_name() {
        assert_eq!(xlink_name("xlink:href"), Some("href".to_string()));
        assert_eq!(xlink_name("xlinkHref"), Some("href".to_string()));
        assert_eq!(xlink_name("href"), None);
    }

    #[test]
    fn test_hyphenate() {
        assert_eq!(hyphenate("backgroundColor"), "background-color");
        assert_eq!(hyphenate("msTransform"), "-ms-transform");
        assert_eq!(hyphenate("color"), "color");
    }

    #[test]
    fn test_style_to_css() {
        let config = EngineConfig::default();
        let style = props! { "width" => 10, "opacity" => 0.5, "backgroundColor" => "red", "zIndex" => 2 };
        assert_eq!(
            style_to_css(&style, &config),
            "background-color: red; opacity: 0.5; width: 10px; z-index: 2;"
        );
    }

    #[test]
    fn test_class_names() {
        let classes = props! { "active" => true, "hidden" => false, "large" => 1 };
        assert_eq!(class_names(&classes), "active large");
    }
}
