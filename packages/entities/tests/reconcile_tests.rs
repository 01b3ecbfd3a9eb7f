use proptest::prelude::*;
use tandem_entities::{
    DocumentId, EntityDocument, EntityId, EntityKind, EntityTree, Expression, LoadOutcome,
};

fn children(tags: &[&str]) -> Expression {
    Expression::element("div").with_children(tags.iter().map(|tag| Expression::element(*tag)))
}

fn child_names(tree: &EntityTree, parent: EntityId) -> Vec<String> {
    tree.children(parent)
        .unwrap()
        .iter()
        .map(|id| tree.get(*id).unwrap().node_name().to_string())
        .collect()
}

#[test]
fn patch_children_remove_update_insert() {
    let mut tree = EntityTree::new(DocumentId::next());
    let current = tree.create(&children(&["div", "span", "p"])).unwrap();
    let old = tree.children(current).unwrap().to_vec();

    let next = tree.create(&children(&["span", "p", "a"])).unwrap();
    let summary = tree.patch(current, next).unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.moved, 0);

    let new = tree.children(current).unwrap().to_vec();
    assert_eq!(child_names(&tree, current), vec!["span", "p", "a"]);
    // span and p survive with their ids
    assert_eq!(&new[..2], &old[1..]);
    assert!(!tree.contains(old[0]));
    assert_eq!(
        tree.to_html(current).unwrap(),
        "<div><span></span><p></p><a></a></div>"
    );
}

#[test]
fn second_patch_is_noop() {
    let mut tree = EntityTree::new(DocumentId::next());
    let expression = Expression::element("ul")
        .with_child(Expression::element("li").with_attr("class", "x"))
        .with_child(Expression::text("tail"));
    let target = Expression::element("ul")
        .with_child(Expression::text("tail"))
        .with_child(Expression::element("li").with_attr("class", "y"));

    let current = tree.create(&expression).unwrap();
    let next = tree.create(&target).unwrap();
    assert!(!tree.patch(current, next).unwrap().is_noop());

    let next = tree.create(&target).unwrap();
    let summary = tree.patch(current, next).unwrap();
    assert!(summary.is_noop(), "{summary:?}");
}

#[test]
fn logical_children_are_diffed_and_skipped_for_anchors() {
    let mut tree = EntityTree::new(DocumentId::next());
    let current = tree
        .create(
            &Expression::element("div")
                .with_child(Expression::logical("if"))
                .with_child(Expression::text("b")),
        )
        .unwrap();
    let next = tree
        .create(
            &Expression::element("div")
                .with_child(Expression::text("a"))
                .with_child(Expression::logical("if"))
                .with_child(Expression::text("b")),
        )
        .unwrap();

    tree.patch(current, next).unwrap();
    let kinds: Vec<_> = tree
        .children(current)
        .unwrap()
        .iter()
        .map(|id| tree.get(*id).unwrap().kind())
        .collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&EntityKind::Logical));
    // Rendered order follows entity order, whichever text matched which
    let texts: String = tree
        .children(current)
        .unwrap()
        .iter()
        .map(|id| tree.get(*id).unwrap().value().to_string())
        .collect();
    assert_eq!(tree.to_html(current).unwrap(), format!("<div>{texts}</div>"));
    assert_eq!(texts, "ab");
}

#[test]
fn logical_children_reorder_in_document() {
    let rows = |items: &[&str]| {
        Expression::element("div")
            .with_child(
                Expression::logical("repeat")
                    .with_children(items.iter().map(|item| {
                        Expression::element("li").with_child(Expression::text(*item))
                    })),
            )
            .with_child(Expression::element("footer"))
    };

    let mut document = EntityDocument::new("rows.json");
    document.load(rows(&["row"])).unwrap();
    assert_eq!(document.to_html(), "<div><li>row</li><footer></footer></div>");

    document.load(rows(&["c", "a", "b"])).unwrap();
    assert_eq!(
        document.to_html(),
        "<div><li>c</li><li>a</li><li>b</li><footer></footer></div>"
    );

    document.load(rows(&["b", "c"])).unwrap();
    assert_eq!(
        document.to_html(),
        "<div><li>b</li><li>c</li><footer></footer></div>"
    );
    let root = document.root().unwrap();
    assert_eq!(document.to_html(), document.tree().to_html(root).unwrap());
}

#[test]
fn groups_move_with_their_content() {
    let mut tree = EntityTree::new(DocumentId::next());
    let current = tree
        .create(
            &Expression::element("div")
                .with_child(Expression::group("one").with_child(Expression::text("1")))
                .with_child(Expression::element("hr")),
        )
        .unwrap();
    let next = tree
        .create(
            &Expression::element("div")
                .with_child(Expression::element("hr"))
                .with_child(Expression::group("one").with_child(Expression::text("1"))),
        )
        .unwrap();

    tree.patch(current, next).unwrap();
    assert_eq!(tree.to_html(current).unwrap(), "<div><hr></hr>1</div>");
}

#[test]
fn document_reload_keeps_entity_ids() {
    let mut document = EntityDocument::new("list.json");
    let items = |names: &[&str]| {
        Expression::element("ul").with_children(
            names
                .iter()
                .map(|name| Expression::element("li").with_child(Expression::text(*name))),
        )
    };

    document.load(items(&["a", "b"])).unwrap();
    let root = document.root().unwrap();
    let first = document.tree().children(root).unwrap()[0];

    let outcome = document.load(items(&["a", "b", "c"])).unwrap();
    assert!(matches!(outcome, LoadOutcome::Patched { summary } if summary.inserted == 1));
    assert_eq!(document.tree().children(root).unwrap()[0], first);
    assert_eq!(
        document.to_html(),
        "<ul><li>a</li><li>b</li><li>c</li></ul>"
    );
}

#[test]
fn expression_from_json_reconciles() {
    let old: Expression = serde_json::from_str(
        r#"{"type":"element","name":"div","attributes":{"style":"color: red"}}"#,
    )
    .unwrap();
    let new: Expression = serde_json::from_str(
        r#"{"type":"element","name":"div","attributes":{"style":"color: blue"}}"#,
    )
    .unwrap();

    let mut document = EntityDocument::new("styled.json");
    document.load(old).unwrap();
    document.load(new).unwrap();
    assert_eq!(document.to_html(), "<div style=\"color:blue;\"></div>");
}

fn node_strategy() -> impl Strategy<Value = Expression> {
    prop_oneof![
        prop::sample::select(vec!["a", "b", "c"]).prop_map(Expression::text),
        prop::sample::select(vec!["li", "p"]).prop_map(Expression::element),
        Just(Expression::logical("if")),
        Just(
            Expression::logical("repeat")
                .with_child(Expression::text("r"))
                .with_child(Expression::element("li"))
        ),
        Just(Expression::group("slot").with_child(Expression::text("g"))),
    ]
}

fn list_strategy() -> impl Strategy<Value = Expression> {
    prop::collection::vec(node_strategy(), 0..8)
        .prop_map(|children| Expression::element("div").with_children(children))
}

proptest! {
    #[test]
    fn patched_tree_renders_like_fresh_tree(old in list_strategy(), new in list_strategy()) {
        let mut tree = EntityTree::new(DocumentId::next());
        let current = tree.create(&old).unwrap();
        let next = tree.create(&new).unwrap();
        tree.patch(current, next).unwrap();

        let fresh = tree.create(&new).unwrap();
        prop_assert_eq!(tree.to_html(current).unwrap(), tree.to_html(fresh).unwrap());

        let names: Vec<_> = new.children().iter().map(|child| child.node_name().to_string()).collect();
        prop_assert_eq!(child_names(&tree, current), names);

        // Patching again with the same target changes nothing
        let summary = tree.patch(current, fresh).unwrap();
        prop_assert!(summary.is_noop());
    }
}
