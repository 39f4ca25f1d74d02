use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::inline;
use crate::lookup;
use crate::node::{AttrValue, NodeId, NodeKind, Tree};

/// Command expansions whose resolved text contains further commands are
/// re-parsed at most this deep; past it the text is inserted verbatim.
pub(crate) const MAX_EXPANSION_DEPTH: usize = 8;

/// Immutable evaluated tree: the `(type, content, children, attrs)`
/// serialization boundary handed to the external renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub kind: String,
    pub content: String,
    pub children: Vec<Rendered>,
    pub attrs: BTreeMap<String, Value>,
}

impl Rendered {
    pub fn flatten_text(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut String) {
        out.push_str(&self.content);
        for child in &self.children {
            child.flatten_into(out);
        }
    }
}

impl Serialize for Rendered {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.kind)?;
        tuple.serialize_element(&self.content)?;
        tuple.serialize_element(&self.children)?;
        tuple.serialize_element(&self.attrs)?;
        tuple.end()
    }
}

/// Mutable per-node working snapshot handed to the transform hook. The
/// parsed tree itself is never mutated, so one tree may be evaluated
/// repeatedly.
#[derive(Clone, Debug)]
pub struct EvalNode {
    pub kind: NodeKind,
    pub content: String,
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Evaluates a parsed tree into its serializable form. Per node, in
/// order: link presentation classes, single-image-paragraph collapse,
/// href canonicalization, the caller's transform hook, command
/// placeholder expansion, attribute materialization; then the children,
/// in order.
///
/// Evaluation cannot suspend; a caller needing asynchronous existence
/// checks resolves them ahead of time and injects the results here
/// through `transform`.
pub fn evaluate(
    tree: &Tree,
    current_universe: &str,
    ctx: &Value,
    transform: Option<&mut dyn FnMut(&mut EvalNode)>,
) -> Rendered {
    let mut evaluator = Evaluator {
        tree,
        universe: current_universe,
        ctx,
        transform,
    };
    evaluator.eval(tree.root(), 0)
}

struct Evaluator<'a, 'b> {
    tree: &'a Tree,
    universe: &'a str,
    ctx: &'a Value,
    transform: Option<&'b mut dyn FnMut(&mut EvalNode)>,
}

impl Evaluator<'_, '_> {
    fn eval(&mut self, id: NodeId, depth: usize) -> Rendered {
        let node = self.tree.node(id);
        let mut work = EvalNode {
            kind: node.kind.clone(),
            content: node.content.clone(),
            attrs: node.attrs.clone(),
        };

        if work.kind == NodeKind::Link {
            append_class(&mut work.attrs, "link link-animated");
        }

        // A paragraph holding nothing but an image becomes its
        // container; the child is kept.
        if work.kind == NodeKind::Paragraph
            && node.children.len() == 1
            && self.tree.node(node.children[0]).kind == NodeKind::Image
        {
            work.kind = NodeKind::Div;
            append_class(&mut work.attrs, "img-container");
        }

        if work.kind == NodeKind::Link {
            self.canonicalize_href(&mut work);
        }

        if let Some(hook) = self.transform.as_mut() {
            hook(&mut work);
        }

        let mut children = self.expand_placeholder(&mut work, depth);
        let attrs = std::mem::take(&mut work.attrs)
            .into_iter()
            .map(|(key, value)| (key, self.materialize(value)))
            .collect();
        for &child in &node.children {
            children.push(self.eval(child, depth));
        }

        Rendered {
            kind: work.kind.tag().to_string(),
            content: work.content,
            children,
            attrs,
        }
    }

    /// An href starting with `@` is an internal cross-reference; the
    /// literal href is left untouched for the external renderer, and
    /// the target is recorded in `data-*` markers instead. Anything not
    /// starting with `@`, `/` or `#` opens in a new window.
    fn canonicalize_href(&self, work: &mut EvalNode) {
        let Some(href) = work
            .attrs
            .get("href")
            .and_then(AttrValue::as_str)
            .map(str::to_string)
        else {
            return;
        };
        if let Some(reference) = href.strip_prefix('@') {
            let (universe, item) = match reference.split_once('/') {
                Some((universe, item)) if !universe.is_empty() => (universe, item),
                Some((_, item)) => (self.universe, item),
                None => (self.universe, reference),
            };
            let item = &item[..item.find(['#', '?']).unwrap_or(item.len())];
            work.attrs
                .insert("data-universe".to_string(), AttrValue::str(universe));
            work.attrs
                .insert("data-item".to_string(), AttrValue::str(item));
            work.attrs
                .insert("data-type".to_string(), AttrValue::str("item-link"));
        } else if !href.starts_with('/') && !href.starts_with('#') {
            work.attrs
                .insert("target".to_string(), AttrValue::str("_blank"));
        }
    }

    /// Substitutes the node's `%` template with its resolved lookup,
    /// re-parses the result as inline markup, and evaluates the new
    /// nodes in place of the placeholder's content.
    fn expand_placeholder(&mut self, work: &mut EvalNode, depth: usize) -> Vec<Rendered> {
        let Some(AttrValue::Lookup(lookup)) = work.attrs.remove("expand") else {
            return Vec::new();
        };
        let resolved = lookup.resolve_text(self.ctx);
        let template = work.content.replacen('%', &resolved, 1);
        work.content.clear();
        if depth >= MAX_EXPANSION_DEPTH {
            work.content = template;
            return Vec::new();
        }
        let mut scratch = Tree::new();
        let root = scratch.root();
        inline::parse_inline(&mut scratch, root, &template);
        let mut sub = Evaluator {
            tree: &scratch,
            universe: self.universe,
            ctx: self.ctx,
            transform: None,
        };
        scratch
            .node(root)
            .children
            .iter()
            .map(|&child| sub.eval(child, depth + 1))
            .collect()
    }

    fn materialize(&self, value: AttrValue) -> Value {
        match value {
            AttrValue::Literal(literal) => literal,
            AttrValue::Lookup(path) => path.resolve(self.ctx),
            AttrValue::GalleryUrl(id) => Value::String(lookup::gallery_url(&id, self.ctx)),
        }
    }
}

fn append_class(attrs: &mut BTreeMap<String, AttrValue>, class: &str) {
    match attrs.get_mut("class") {
        Some(AttrValue::Literal(Value::String(existing))) => {
            existing.push(' ');
            existing.push_str(class);
        }
        _ => {
            attrs.insert("class".to_string(), AttrValue::str(class));
        }
    }
}
