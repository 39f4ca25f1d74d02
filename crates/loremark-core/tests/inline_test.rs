use loremark_core::{AttrValue, NodeId, NodeKind, Tree, parse};

fn attr<'a>(tree: &'a Tree, id: NodeId, key: &str) -> Option<&'a str> {
    tree.node(id).attrs.get(key).and_then(AttrValue::as_str)
}

fn find_kind(tree: &Tree, id: NodeId, kind: &NodeKind) -> Option<NodeId> {
    if &tree.node(id).kind == kind {
        return Some(id);
    }
    tree.node(id)
        .children
        .iter()
        .find_map(|&child| find_kind(tree, child, kind))
}

#[test]
fn link_with_parsed_label() {
    let tree = parse("see [the *docs*](http://example.com) here");
    let link = find_kind(&tree, tree.root(), &NodeKind::Link).expect("link node");
    assert_eq!(attr(&tree, link, "href"), Some("http://example.com"));
    assert_eq!(tree.flatten_text(link), "the docs");
    assert!(find_kind(&tree, link, &NodeKind::Em).is_some());
    assert_eq!(tree.flatten_text(tree.root()), "see the docs here");
}

#[test]
fn image_takes_flattened_alt_and_consumes_the_bang() {
    let tree = parse("a ![some *alt*](pic.png) b");
    let image = find_kind(&tree, tree.root(), &NodeKind::Image).expect("image node");
    assert_eq!(attr(&tree, image, "src"), Some("pic.png"));
    assert_eq!(attr(&tree, image, "alt"), Some("some alt"));
    // The bang belongs to the image syntax, not the text.
    assert_eq!(tree.flatten_text(tree.root()), "a  b");
}

#[test]
fn malformed_link_backtracks_to_literal_text() {
    let tree = parse("a [text](oops");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Link).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "a [text](oops");
}

#[test]
fn unclosed_label_stays_literal() {
    let tree = parse("a ![text");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Image).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "a ![text");
}

#[test]
fn label_without_url_stays_literal() {
    let tree = parse("[not a link] just text");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Link).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "[not a link] just text");
}

#[test]
fn inline_command_produces_a_placeholder_node() {
    let tree = parse("value: @data stats strength@ pts");
    let command = find_kind(&tree, tree.root(), &NodeKind::Command).expect("command node");
    assert_eq!(tree.node(command).content, "%");
    assert_eq!(tree.node(command).source, "@data stats strength@");
    assert_eq!(tree.flatten_text(tree.root()), "value: % pts");
}

#[test]
fn command_opener_requires_leading_whitespace() {
    let tree = parse("mail a@data x@ done");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Command).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "mail a@data x@ done");
}

#[test]
fn unclosed_inline_command_is_literal() {
    let tree = parse("a @data foo");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Command).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "a @data foo");
}

#[test]
fn unknown_inline_command_produces_nothing() {
    let tree = parse("see @wat arg@ done");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Command).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "see  done");
}

#[test]
fn escaped_at_sign_never_opens_a_command() {
    let tree = parse("ping \\@data foo@ ok");
    assert!(find_kind(&tree, tree.root(), &NodeKind::Command).is_none());
    assert_eq!(tree.flatten_text(tree.root()), "ping @data foo@ ok");
}

#[test]
fn quoted_command_arguments_keep_spaces() {
    let tree = parse("pic: @img \"a b.png\" 'my alt'@");
    let image = find_kind(&tree, tree.root(), &NodeKind::Image).expect("image node");
    assert_eq!(attr(&tree, image, "src"), Some("a b.png"));
    assert_eq!(attr(&tree, image, "alt"), Some("my alt"));
}

#[test]
fn lone_star_inside_bold_is_literal() {
    let tree = parse("**a * b**");
    let strong = find_kind(&tree, tree.root(), &NodeKind::Strong).expect("bold node");
    assert_eq!(tree.flatten_text(strong), "a * b");
}

#[test]
fn underscore_opens_italics() {
    let tree = parse("an _aside_ here");
    let em = find_kind(&tree, tree.root(), &NodeKind::Em).expect("italics node");
    assert_eq!(tree.flatten_text(em), "aside");
}

#[test]
fn pathological_emphasis_terminates() {
    let body = format!("{}x{}", "**".repeat(100), "**".repeat(100));
    // Must terminate without exhausting the stack or losing content.
    let tree = parse(&body);
    assert!(tree.flatten_text(tree.root()).contains('x'));
}
