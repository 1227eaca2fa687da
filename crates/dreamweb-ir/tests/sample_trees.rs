use anyhow::Result;
use dreamweb_ir::{HandlerId, Node, NodeTag, Tag};
use std::fs::File;
use std::path::PathBuf;

fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(name)
}

#[test]
fn loads_counter_sample() -> Result<()> {
    let path = sample_path("counter.json");
    assert!(path.exists(), "counter sample missing at {:?}", path);

    let tree = Node::from_reader(File::open(&path)?)?;
    assert_eq!(tree.tag, NodeTag::Known(Tag::Container));
    assert_eq!(tree.props.str("background"), Some("#0f172a"));
    assert_eq!(tree.children.len(), 2);

    let column = &tree.children[1];
    assert_eq!(column.known_tag(), Some(Tag::Column));

    let row = column
        .children
        .iter()
        .find(|n| n.known_tag() == Some(Tag::Row))
        .expect("row of buttons");
    let handlers: Vec<_> = row
        .children
        .iter()
        .filter_map(|b| b.events.click.clone())
        .collect();
    assert_eq!(
        handlers,
        vec![
            HandlerId::from("on_click_140001"),
            HandlerId::from("on_click_140002")
        ]
    );

    let fetch = column
        .children
        .iter()
        .find(|n| n.known_tag() == Some(Tag::FetchData))
        .expect("fetch node");
    assert_eq!(fetch.callbacks.on_success, Some(HandlerId::from(140005u64)));
    assert_eq!(fetch.props.bool("auto_fetch"), Some(false));

    Ok(())
}

#[test]
fn sample_survives_reserialization() -> Result<()> {
    let source = std::fs::read_to_string(sample_path("counter.json"))?;
    let tree = Node::from_json_str(&source)?;
    let again = Node::from_json_str(&tree.to_json_string()?)?;
    assert_eq!(tree, again);
    assert_eq!(tree.count(), again.count());
    Ok(())
}
