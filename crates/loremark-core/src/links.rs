use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::evaluate::{Rendered, evaluate};
use crate::parser::parse;

/// One discovered cross-reference, in document order. Serializes as a
/// `(universe, item, href)` triple.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkRef {
    pub universe: Option<String>,
    pub item: Option<String>,
    pub href: String,
}

impl Serialize for LinkRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.universe)?;
        tuple.serialize_element(&self.item)?;
        tuple.serialize_element(&self.href)?;
        tuple.end()
    }
}

/// Parses and evaluates `body`, collecting every cross-reference found,
/// without deduplication. Content-authoring defects must never
/// propagate: any failure anywhere in parse or evaluate is logged and
/// converted to an empty result.
pub fn extract_links(universe_shortname: &str, body: &str, ctx: &Value) -> Vec<LinkRef> {
    let outcome = std::panic::catch_unwind(|| {
        let tree = parse(body);
        let rendered = evaluate(&tree, universe_shortname, ctx, None);
        let mut links = Vec::new();
        collect(&rendered, &mut links);
        links
    });
    match outcome {
        Ok(links) => links,
        Err(_) => {
            log::error!(
                "link extraction failed for universe {universe_shortname}; returning no links"
            );
            Vec::new()
        }
    }
}

fn collect(node: &Rendered, links: &mut Vec<LinkRef>) {
    if node.attrs.get("data-type").and_then(Value::as_str) == Some("item-link") {
        links.push(LinkRef {
            universe: attr_text(node, "data-universe"),
            item: attr_text(node, "data-item"),
            href: attr_text(node, "href").unwrap_or_default(),
        });
    }
    for child in &node.children {
        collect(child, links);
    }
}

fn attr_text(node: &Rendered, key: &str) -> Option<String> {
    node.attrs.get(key).and_then(Value::as_str).map(str::to_string)
}
