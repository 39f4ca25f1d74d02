use crate::command;
use crate::inline;
use crate::node::{AttrValue, NodeId, NodeKind, Tree};

/// List and TOC nesting depth cap.
pub(crate) const MAX_NESTING: usize = 32;

/// Parses a whole document into a node tree. Parsing never fails;
/// malformed markup degrades to literal text.
pub fn parse(source: &str) -> Tree {
    let mut parser = BlockParser::new();
    for line in source.lines() {
        parser.line(line);
    }
    parser.finish()
}

struct BlockParser {
    tree: Tree,
    paragraph: Option<NodeId>,
    /// Invariant: indent strictly decreases walking up the stack.
    list_stack: Vec<(NodeId, usize)>,
    toc: Option<TocState>,
    aside_mark: Option<usize>,
}

struct TocState {
    /// The TOC's own root list.
    list: NodeId,
    max_depth: u8,
    /// Same increasing/decreasing technique as the list stack, keyed by
    /// heading level.
    stack: Vec<(NodeId, u8)>,
}

impl BlockParser {
    fn new() -> Self {
        Self {
            tree: Tree::new(),
            paragraph: None,
            list_stack: Vec::new(),
            toc: None,
            aside_mark: None,
        }
    }

    fn finish(mut self) -> Tree {
        self.flush_paragraph();
        self.tree
    }

    fn line(&mut self, line: &str) {
        if line.trim().is_empty() {
            // A blank line always ends list continuation.
            self.flush_paragraph();
            self.list_stack.clear();
            return;
        }
        if let Some((indent, text)) = list_item_line(line) {
            self.list_item(indent, text, line);
            return;
        }
        if let Some((level, custom_id, text)) = heading_line(line) {
            self.heading(level, custom_id, text, line);
            return;
        }
        if line.starts_with('@') {
            self.directive(line);
            return;
        }
        self.paragraph_line(line);
    }

    fn flush_paragraph(&mut self) {
        self.paragraph = None;
    }

    fn paragraph_line(&mut self, line: &str) {
        let paragraph = match self.paragraph {
            Some(existing) => {
                self.tree.append_text(existing, "\n");
                let node = self.tree.node_mut(existing);
                node.source.push('\n');
                node.source.push_str(line);
                existing
            }
            None => {
                let root = self.tree.root();
                let created = self.tree.append(root, NodeKind::Paragraph);
                self.tree.node_mut(created).source = line.to_string();
                self.paragraph = Some(created);
                created
            }
        };
        inline::parse_inline(&mut self.tree, paragraph, line);
    }

    fn heading(&mut self, level: u8, custom_id: Option<String>, text: &str, raw: &str) {
        self.flush_paragraph();
        self.list_stack.clear();
        let root = self.tree.root();
        let heading = self.tree.append(root, NodeKind::Heading(level));
        self.tree.node_mut(heading).source = raw.to_string();
        inline::parse_inline(&mut self.tree, heading, text);
        let id = custom_id.unwrap_or_else(|| slug(&self.tree.flatten_text(heading)));
        self.tree.set_attr(heading, "id", AttrValue::str(id));
        self.toc_entry(level, heading);
    }

    fn toc_entry(&mut self, level: u8, heading: NodeId) {
        let Some(mut toc) = self.toc.take() else {
            return;
        };
        if level <= toc.max_depth {
            while toc.stack.last().is_some_and(|&(_, top)| top > level) {
                toc.stack.pop();
            }
            let list = match toc.stack.last().copied() {
                None => {
                    toc.stack.push((toc.list, level));
                    toc.list
                }
                Some((list, top)) if top == level => list,
                Some((list, _)) if toc.stack.len() >= MAX_NESTING => list,
                Some((list, _)) => {
                    // Deeper heading: nest a fresh list under the last
                    // entry of the enclosing one.
                    match self.tree.node(list).children.last().copied() {
                        Some(item) => {
                            let nested = self.tree.append(item, NodeKind::List);
                            toc.stack.push((nested, level));
                            nested
                        }
                        None => list,
                    }
                }
            };
            let item = self.tree.append(list, NodeKind::Item);
            let link = self.tree.append(item, NodeKind::Link);
            let id = self
                .tree
                .node(heading)
                .attrs
                .get("id")
                .and_then(AttrValue::as_str)
                .unwrap_or_default()
                .to_string();
            self.tree.set_attr(link, "href", AttrValue::str(format!("#{id}")));
            let text = self.tree.flatten_text(heading);
            self.tree.append_text(link, &text);
        }
        self.toc = Some(toc);
    }

    fn list_item(&mut self, indent: usize, text: &str, raw: &str) {
        if self.list_stack.is_empty() {
            // A paragraph running right into a list becomes its label.
            if let Some(paragraph) = self.paragraph.take() {
                let node = self.tree.node_mut(paragraph);
                node.kind = NodeKind::Span;
                node.attrs
                    .insert("class".to_string(), AttrValue::str("list-label"));
            }
        } else {
            self.flush_paragraph();
        }

        let indent = indent.min(MAX_NESTING);
        while self
            .list_stack
            .last()
            .is_some_and(|&(_, top)| top > indent)
        {
            self.list_stack.pop();
        }
        let list = match self.list_stack.last().copied() {
            None => {
                let root = self.tree.root();
                let list = self.tree.append(root, NodeKind::List);
                self.list_stack.push((list, indent));
                list
            }
            Some((list, top)) if top == indent => list,
            Some((list, _)) => {
                // Indent increased: nest under the last item.
                match self.tree.node(list).children.last().copied() {
                    Some(item) => {
                        let nested = self.tree.append(item, NodeKind::List);
                        self.list_stack.push((nested, indent));
                        nested
                    }
                    None => list,
                }
            }
        };
        let item = self.tree.append(list, NodeKind::Item);
        self.tree.node_mut(item).source = raw.to_string();
        inline::parse_inline(&mut self.tree, item, text);
    }

    /// Directive lines share the command quoting rules but, unlike
    /// inline commands, the closing `@` is optional.
    fn directive(&mut self, line: &str) {
        self.flush_paragraph();
        self.list_stack.clear();
        let body = &line[1..];
        let body = body.strip_suffix('@').unwrap_or(body);
        let args = command::split_args(body);
        let Some(name) = args.first() else {
            return;
        };
        match name.as_str() {
            "toc" => self.init_toc(args.get(1)),
            "aside" => {
                let root = self.tree.root();
                self.aside_mark = Some(self.tree.node(root).children.len());
            }
            "aside-end" => self.close_aside(),
            _ => {
                if let Some(node) = command::dispatch(&mut self.tree, &args) {
                    let root = self.tree.root();
                    self.tree.attach(root, node);
                    self.tree.node_mut(node).source = line.to_string();
                }
            }
        }
    }

    fn init_toc(&mut self, depth_arg: Option<&String>) {
        let max_depth = depth_arg
            .and_then(|raw| raw.parse::<u8>().ok())
            .unwrap_or(6);
        let root = self.tree.root();
        let toc = self.tree.append(root, NodeKind::Div);
        self.tree.set_attr(toc, "class", AttrValue::str("toc"));
        let title = self.tree.append(toc, NodeKind::Heading(2));
        self.tree.append_text(title, "Table of Contents");
        let list = self.tree.append(toc, NodeKind::List);
        self.toc = Some(TocState {
            list,
            max_depth,
            stack: Vec::new(),
        });
    }

    /// Re-wraps every document-root sibling appended since the matching
    /// `@aside` mark inside one new aside node.
    fn close_aside(&mut self) {
        let Some(mark) = self.aside_mark.take() else {
            return;
        };
        let root = self.tree.root();
        if mark >= self.tree.node(root).children.len() {
            return;
        }
        let moved: Vec<NodeId> = self.tree.node_mut(root).children.split_off(mark);
        let aside = self.tree.append(root, NodeKind::Aside);
        let mut source = String::new();
        for (index, &child) in moved.iter().enumerate() {
            if index > 0 {
                source.push('\n');
            }
            source.push_str(&self.tree.node(child).source);
            self.tree.attach(aside, child);
        }
        self.tree.node_mut(aside).source = source;
    }
}

/// `#`+ level, an optional `(custom-id)` segment, then a mandatory
/// space. Without the space the line is an ordinary paragraph.
fn heading_line(line: &str) -> Option<(u8, Option<String>, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    let (custom_id, rest) = match rest.strip_prefix('(') {
        Some(inner) => {
            let close = inner.find(')')?;
            (Some(inner[..close].to_string()), &inner[close + 1..])
        }
        None => (None, rest),
    };
    let text = rest.strip_prefix(' ')?;
    Some((level.min(6) as u8, custom_id, text))
}

/// `- ` at an indentation of leading-space-count / 2.
fn list_item_line(line: &str) -> Option<(usize, &str)> {
    let spaces = line.len() - line.trim_start_matches(' ').len();
    let text = line[spaces..].strip_prefix("- ")?;
    Some((spaces / 2, text))
}

/// Slug id for a heading: lowercase, spaces to hyphens.
fn slug(text: &str) -> String {
    text.to_lowercase().replace(' ', "-")
}
