use crate::command;
use crate::cursor::LineCursor;
use crate::node::{AttrValue, NodeId, NodeKind, Tree};

/// Nested emphasis/link depth beyond which markup characters are taken
/// literally, so adversarial input cannot exhaust the stack.
pub(crate) const MAX_INLINE_DEPTH: usize = 64;

/// Parses one line of inline markup, appending the resulting nodes
/// under `parent`. Malformed markup never errors; every construct
/// degrades to literal text via backtracking.
pub(crate) fn parse_inline(tree: &mut Tree, parent: NodeId, text: &str) {
    parse_at_depth(tree, parent, text, 0);
}

fn parse_at_depth(tree: &mut Tree, parent: NodeId, text: &str, depth: usize) {
    let mut cursor = LineCursor::new(text);
    let mut buffer = String::new();

    while cursor.has_next() {
        let Some(ch) = cursor.next() else {
            break;
        };
        match ch {
            '\\' => match cursor.next() {
                Some(escaped) => buffer.push(escaped),
                None => buffer.push('\\'),
            },
            '*' | '_' if depth < MAX_INLINE_DEPTH => {
                if ch == '*' && cursor.peek(0) == Some('*') {
                    cursor.next();
                    strong(tree, parent, &mut cursor, &mut buffer, depth);
                } else {
                    emphasis(tree, parent, &mut cursor, &mut buffer, ch, depth);
                }
            }
            '[' if depth < MAX_INLINE_DEPTH => {
                if !link_or_image(tree, parent, &mut cursor, &mut buffer, depth) {
                    buffer.push('[');
                }
            }
            '@' if opens_command(&cursor) => {
                if !inline_command(tree, parent, &mut cursor, &mut buffer) {
                    buffer.push('@');
                }
            }
            other => buffer.push(other),
        }
    }
    flush(tree, parent, &mut buffer);
}

fn flush(tree: &mut Tree, parent: NodeId, buffer: &mut String) {
    if buffer.is_empty() {
        return;
    }
    let text = std::mem::take(buffer);
    tree.append_text(parent, &text);
}

/// `**bold**`. A lone `*` inside is literal content; an unmatched
/// opener reproduces itself and everything scanned as plain text.
fn strong(tree: &mut Tree, parent: NodeId, cursor: &mut LineCursor, buffer: &mut String, depth: usize) {
    match scan_strong(cursor) {
        Some(interior) => {
            flush(tree, parent, buffer);
            let node = tree.append(parent, NodeKind::Strong);
            tree.node_mut(node).source = format!("**{interior}**");
            parse_at_depth(tree, node, &interior, depth + 1);
        }
        None => buffer.push_str("**"),
    }
}

fn scan_strong(cursor: &mut LineCursor) -> Option<String> {
    let start = cursor.pos();
    let mut interior = String::new();
    while let Some(ch) = cursor.next() {
        if ch == '\\' {
            interior.push('\\');
            if let Some(escaped) = cursor.next() {
                interior.push(escaped);
            }
            continue;
        }
        if ch == '*' && cursor.peek(0) == Some('*') {
            cursor.next();
            return Some(interior);
        }
        interior.push(ch);
    }
    cursor.reset(start);
    None
}

/// `*italics*` or `_italics_`, with the same literal-fallback contract
/// as bold.
fn emphasis(
    tree: &mut Tree,
    parent: NodeId,
    cursor: &mut LineCursor,
    buffer: &mut String,
    delim: char,
    depth: usize,
) {
    match scan_until(cursor, delim) {
        Some(interior) => {
            flush(tree, parent, buffer);
            let node = tree.append(parent, NodeKind::Em);
            tree.node_mut(node).source = format!("{delim}{interior}{delim}");
            parse_at_depth(tree, node, &interior, depth + 1);
        }
        None => buffer.push(delim),
    }
}

/// Scans up to the next unescaped `delim`, restoring the cursor when
/// none is found. Escape sequences are kept verbatim so the recursive
/// interior parse sees them.
fn scan_until(cursor: &mut LineCursor, delim: char) -> Option<String> {
    let start = cursor.pos();
    let mut interior = String::new();
    while let Some(ch) = cursor.next() {
        if ch == '\\' {
            interior.push('\\');
            if let Some(escaped) = cursor.next() {
                interior.push(escaped);
            }
            continue;
        }
        if ch == delim {
            return Some(interior);
        }
        interior.push(ch);
    }
    cursor.reset(start);
    None
}

/// `[label](url)`, or `![label](url)` when the `[` is immediately
/// preceded by `!`. On any malformation the cursor backtracks to just
/// after the `[` and the caller emits it literally.
fn link_or_image(
    tree: &mut Tree,
    parent: NodeId,
    cursor: &mut LineCursor,
    buffer: &mut String,
    depth: usize,
) -> bool {
    let start = cursor.pos();
    let image = cursor.peek(-2) == Some('!') && buffer.ends_with('!');

    let Some(label) = scan_until(cursor, ']') else {
        cursor.reset(start);
        return false;
    };
    if cursor.peek(0) != Some('(') {
        cursor.reset(start);
        return false;
    }
    cursor.next();
    let Some(url) = scan_until(cursor, ')') else {
        cursor.reset(start);
        return false;
    };

    if image {
        buffer.pop();
        flush(tree, parent, buffer);
        let node = tree.append(parent, NodeKind::Image);
        tree.set_attr(node, "src", AttrValue::str(url.clone()));
        tree.set_attr(node, "alt", AttrValue::str(flatten_label(&label, depth)));
        tree.node_mut(node).source = format!("![{label}]({url})");
    } else {
        flush(tree, parent, buffer);
        let node = tree.append(parent, NodeKind::Link);
        tree.set_attr(node, "href", AttrValue::str(url.clone()));
        tree.node_mut(node).source = format!("[{label}]({url})");
        parse_at_depth(tree, node, &label, depth + 1);
    }
    true
}

/// Inline-parses a label in a scratch tree and flattens it; image alt
/// text carries no markup.
fn flatten_label(label: &str, depth: usize) -> String {
    let mut scratch = Tree::new();
    let root = scratch.root();
    parse_at_depth(&mut scratch, root, label, depth + 1);
    scratch.flatten_text(root)
}

/// An unescaped `@` opens an inline command only when preceded by
/// whitespace or start-of-line.
fn opens_command(cursor: &LineCursor) -> bool {
    if !cursor.has_prev() {
        return true;
    }
    match cursor.peek(-2) {
        None => true,
        Some(prev) => prev.is_whitespace(),
    }
}

/// `@name args@`. The closing `@` is required here, unlike on directive
/// lines; without it the opener falls back to literal text.
fn inline_command(
    tree: &mut Tree,
    parent: NodeId,
    cursor: &mut LineCursor,
    buffer: &mut String,
) -> bool {
    let Some(body) = scan_until(cursor, '@') else {
        return false;
    };
    let args = command::split_args(&body);
    if let Some(node) = command::dispatch(tree, &args) {
        flush(tree, parent, buffer);
        tree.attach(parent, node);
        tree.node_mut(node).source = format!("@{body}@");
    }
    true
}
