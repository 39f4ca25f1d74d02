use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::lookup::Lookup;
use crate::node::{AttrValue, NodeId, NodeKind, Tree};

type CommandFn = fn(&mut Tree, &[String]) -> Option<NodeId>;

static COMMANDS: Lazy<HashMap<&'static str, CommandFn>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, CommandFn> = HashMap::new();
    table.insert("data", data_command);
    table.insert("tab", tab_command);
    table.insert("img", img_command);
    table
});

/// Dispatches `[name, ...args]` to the command table. The returned node
/// is detached; the caller decides where it goes. Unknown names produce
/// nothing.
pub(crate) fn dispatch(tree: &mut Tree, args: &[String]) -> Option<NodeId> {
    let (name, rest) = args.split_first()?;
    let command = COMMANDS.get(name.as_str())?;
    command(tree, rest)
}

fn data_command(tree: &mut Tree, args: &[String]) -> Option<NodeId> {
    let mut path = vec!["item".to_string(), "obj_data".to_string()];
    path.extend(args.iter().cloned());
    Some(placeholder(tree, Lookup::new(path)))
}

fn tab_command(tree: &mut Tree, args: &[String]) -> Option<NodeId> {
    let mut path = vec![
        "item".to_string(),
        "obj_data".to_string(),
        "tabs".to_string(),
    ];
    path.extend(args.iter().cloned());
    Some(placeholder(tree, Lookup::new(path)))
}

fn placeholder(tree: &mut Tree, lookup: Lookup) -> NodeId {
    let node = tree.push(NodeKind::Command);
    tree.node_mut(node).content = "%".to_string();
    tree.set_attr(node, "expand", AttrValue::Lookup(lookup));
    node
}

/// `img src [alt] [height] [width]`: an image wrapped in a container
/// div. A numeric src is a gallery-image id whose URL needs the owning
/// entry's identity and is therefore deferred to evaluation.
fn img_command(tree: &mut Tree, args: &[String]) -> Option<NodeId> {
    let src = args.first()?;
    let container = tree.push(NodeKind::Div);
    tree.set_attr(container, "class", AttrValue::str("img-container"));
    let img = tree.append(container, NodeKind::Image);

    if let Ok(id) = src.parse::<u64>() {
        tree.set_attr(
            img,
            "src",
            AttrValue::GalleryUrl(Lookup::constant(Value::from(id))),
        );
        let alt = match args.get(1) {
            Some(alt) => AttrValue::str(alt.clone()),
            None => AttrValue::Lookup(Lookup::new(["item", "gallery", src, "label"])),
        };
        tree.set_attr(img, "alt", alt);
        tree.set_attr(
            img,
            "title",
            AttrValue::Lookup(Lookup::new(["item", "gallery", src, "name"])),
        );
    } else {
        tree.set_attr(img, "src", AttrValue::str(src.clone()));
        let alt = args.get(1).unwrap_or(src);
        tree.set_attr(img, "alt", AttrValue::str(alt.clone()));
    }

    if let Some(height) = args.get(2) {
        tree.set_attr(img, "height", AttrValue::str(height.clone()));
    }
    if let Some(width) = args.get(3) {
        tree.set_attr(img, "width", AttrValue::str(width.clone()));
    }
    Some(container)
}

/// Splits command text into arguments with shell-style quoting:
/// whitespace-delimited runs, or quoted runs with one layer of matching
/// quotes stripped. A backslash escapes the next character.
pub(crate) fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                } else if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else {
                    current.push(ch);
                }
            }
            None => {
                if ch.is_whitespace() {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                } else if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                    in_token = true;
                } else if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    in_token = true;
                } else {
                    current.push(ch);
                    in_token = true;
                }
            }
        }
    }
    if in_token {
        args.push(current);
    }
    args
}
