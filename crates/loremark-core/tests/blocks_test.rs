use loremark_core::{AttrValue, NodeId, NodeKind, Tree, parse};

fn root_children(tree: &Tree) -> Vec<NodeId> {
    tree.node(tree.root()).children.clone()
}

fn attr<'a>(tree: &'a Tree, id: NodeId, key: &str) -> Option<&'a str> {
    tree.node(id).attrs.get(key).and_then(AttrValue::as_str)
}

fn contains_kind(tree: &Tree, id: NodeId, kind: &NodeKind) -> bool {
    if &tree.node(id).kind == kind {
        return true;
    }
    tree.node(id)
        .children
        .iter()
        .any(|&child| contains_kind(tree, child, kind))
}

#[test]
fn unmatched_bold_degrades_losslessly() {
    let tree = parse("a **bold");
    let children = root_children(&tree);
    assert_eq!(children.len(), 1);
    assert_eq!(tree.node(children[0]).kind, NodeKind::Paragraph);
    assert_eq!(tree.flatten_text(children[0]), "a **bold");
    assert!(!contains_kind(&tree, tree.root(), &NodeKind::Strong));
}

#[test]
fn escapes_suppress_markup() {
    let tree = parse("\\*\\*not bold\\*\\*");
    assert_eq!(tree.flatten_text(tree.root()), "**not bold**");
    assert!(!contains_kind(&tree, tree.root(), &NodeKind::Strong));
}

#[test]
fn bold_nests_italics() {
    let tree = parse("**a *b* c**");
    let paragraph = root_children(&tree)[0];
    let strong = tree.node(paragraph).children[0];
    assert_eq!(tree.node(strong).kind, NodeKind::Strong);
    let em = tree
        .node(strong)
        .children
        .iter()
        .copied()
        .find(|&child| tree.node(child).kind == NodeKind::Em)
        .expect("italics inside bold");
    assert_eq!(tree.flatten_text(em), "b");
    assert_eq!(tree.flatten_text(strong), "a b c");
}

#[test]
fn heading_gets_slug_id() {
    let tree = parse("# My Great Title");
    let heading = root_children(&tree)[0];
    assert_eq!(tree.node(heading).kind, NodeKind::Heading(1));
    assert_eq!(attr(&tree, heading, "id"), Some("my-great-title"));
    assert_eq!(tree.flatten_text(heading), "My Great Title");
}

#[test]
fn heading_custom_id_wins_over_slug() {
    let tree = parse("##(my-id) Title");
    let heading = root_children(&tree)[0];
    assert_eq!(tree.node(heading).kind, NodeKind::Heading(2));
    assert_eq!(attr(&tree, heading, "id"), Some("my-id"));
}

#[test]
fn hashes_without_space_fall_through_to_paragraph() {
    let tree = parse("#NoSpace");
    let children = root_children(&tree);
    assert_eq!(tree.node(children[0]).kind, NodeKind::Paragraph);
    assert_eq!(tree.flatten_text(children[0]), "#NoSpace");
}

#[test]
fn list_indentation_nests() {
    let tree = parse("- a\n  - b\n- c");
    let children = root_children(&tree);
    assert_eq!(children.len(), 1);
    let list = children[0];
    assert_eq!(tree.node(list).kind, NodeKind::List);
    let items = tree.node(list).children.clone();
    assert_eq!(items.len(), 2);
    assert_eq!(tree.flatten_text(items[1]), "c");

    let nested = tree
        .node(items[0])
        .children
        .iter()
        .copied()
        .find(|&child| tree.node(child).kind == NodeKind::List)
        .expect("nested sub-list under the first item");
    let nested_items = tree.node(nested).children.clone();
    assert_eq!(nested_items.len(), 1);
    assert_eq!(tree.flatten_text(nested_items[0]), "b");
}

#[test]
fn blank_line_resets_list_nesting() {
    let tree = parse("- a\n\n- b");
    let lists: Vec<NodeId> = root_children(&tree)
        .into_iter()
        .filter(|&child| tree.node(child).kind == NodeKind::List)
        .collect();
    assert_eq!(lists.len(), 2);
}

#[test]
fn paragraph_before_list_becomes_its_label() {
    let tree = parse("Shopping:\n- eggs\n- ham");
    let children = root_children(&tree);
    assert_eq!(children.len(), 2);
    let label = children[0];
    assert_eq!(tree.node(label).kind, NodeKind::Span);
    assert_eq!(attr(&tree, label, "class"), Some("list-label"));
    assert_eq!(tree.flatten_text(label), "Shopping:");
    assert_eq!(tree.node(children[1]).kind, NodeKind::List);
}

#[test]
fn toc_mirrors_heading_hierarchy() {
    let tree = parse("@toc\n# A\n## B\n# C");
    let children = root_children(&tree);
    let toc = children[0];
    assert_eq!(attr(&tree, toc, "class"), Some("toc"));

    let toc_list = tree.node(toc).children[1];
    assert_eq!(tree.node(toc_list).kind, NodeKind::List);
    let entries = tree.node(toc_list).children.clone();
    assert_eq!(entries.len(), 2);

    let first_link = tree.node(entries[0]).children[0];
    assert_eq!(tree.node(first_link).kind, NodeKind::Link);
    assert_eq!(tree.flatten_text(first_link), "A");
    assert_eq!(attr(&tree, first_link, "href"), Some("#a"));

    let nested = tree
        .node(entries[0])
        .children
        .iter()
        .copied()
        .find(|&child| tree.node(child).kind == NodeKind::List)
        .expect("sub-list under the first entry");
    let nested_entries = tree.node(nested).children.clone();
    assert_eq!(nested_entries.len(), 1);
    assert_eq!(tree.flatten_text(nested_entries[0]), "B");

    let second_link = tree.node(entries[1]).children[0];
    assert_eq!(tree.flatten_text(second_link), "C");

    for &child in &children {
        if let NodeKind::Heading(_) = tree.node(child).kind {
            assert!(!attr(&tree, child, "id").unwrap_or_default().is_empty());
        }
    }
}

#[test]
fn toc_max_depth_excludes_deeper_headings() {
    let tree = parse("@toc 1\n# A\n## B");
    let toc = root_children(&tree)[0];
    let toc_list = tree.node(toc).children[1];
    let entries = tree.node(toc_list).children.clone();
    assert_eq!(entries.len(), 1);
    assert!(!contains_kind(&tree, entries[0], &NodeKind::List));
}

#[test]
fn aside_wraps_the_marked_span_of_siblings() {
    let tree = parse("before\n\n@aside\none\n\ntwo\n\n@aside-end\nafter");
    let children = root_children(&tree);
    assert_eq!(children.len(), 3);
    assert_eq!(tree.node(children[0]).kind, NodeKind::Paragraph);
    let aside = children[1];
    assert_eq!(tree.node(aside).kind, NodeKind::Aside);
    assert_eq!(tree.node(aside).children.len(), 2);
    assert_eq!(tree.node(aside).source, "one\ntwo");
    assert_eq!(tree.flatten_text(children[2]), "after");
}

#[test]
fn unmatched_aside_end_produces_nothing() {
    let tree = parse("text\n@aside-end");
    let children = root_children(&tree);
    assert_eq!(children.len(), 1);
    assert_eq!(tree.node(children[0]).kind, NodeKind::Paragraph);
}

#[test]
fn directive_falls_through_to_command_table() {
    let tree = parse("@img http://example.com/pic.png@");
    let children = root_children(&tree);
    assert_eq!(children.len(), 1);
    let container = children[0];
    assert_eq!(attr(&tree, container, "class"), Some("img-container"));
    let image = tree.node(container).children[0];
    assert_eq!(tree.node(image).kind, NodeKind::Image);
    assert_eq!(
        attr(&tree, image, "src"),
        Some("http://example.com/pic.png")
    );
}

#[test]
fn unknown_directive_produces_no_node() {
    let tree = parse("@wat foo bar");
    assert!(root_children(&tree).is_empty());
}

#[test]
fn paragraph_spans_consecutive_lines_and_trailing_flush() {
    let tree = parse("first\nsecond");
    let children = root_children(&tree);
    assert_eq!(children.len(), 1);
    assert_eq!(tree.flatten_text(children[0]), "first\nsecond");
    assert_eq!(tree.node(children[0]).source, "first\nsecond");
}
