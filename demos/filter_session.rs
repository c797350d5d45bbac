use build_filter::{
    compile, deserialize, operators_for, to_sql, AttributeKind, Field, FilterNode, FilterSession,
    NodeId, SequentialIds, ShareLink,
};
use std::{sync::Arc, time::Duration};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Follow the shareable URL
    let link = Arc::new(ShareLink::new("/builds"));
    let mut urls = link.subscribe();
    let mut session = FilterSession::with_ids(Arc::clone(&link), SequentialIds::new())
        .debounce(Duration::from_millis(50));

    println!("Operators for numbers:");
    for option in operators_for(AttributeKind::Number) {
        println!("  {} ({})", option.label, option.value);
    }

    // os = linux AND (cores >= 8 OR arch contains "arm")
    session.add_condition(&NodeId::root());
    session.add_group(&NodeId::root());
    let ids: Vec<NodeId> = session.current().conditions.iter().map(FilterNode::id).cloned().collect();
    let (os, nested) = (&ids[0], &ids[1]);
    session.update_field(os, Field::AttributeId, "attr-os");
    session.update_field(os, Field::Value, "linux");
    session.update_field(nested, Field::Operator, "OR");
    session.add_condition(nested);
    session.add_condition(nested);
    let cores = NodeId::from("node-3");
    let arch = NodeId::from("node-4");
    session.update_field(&cores, Field::AttributeId, "attr-cores");
    session.update_field(&cores, Field::Operator, "gte");
    session.update_field(&cores, Field::Value, "8");
    session.update_field(&arch, Field::AttributeId, "attr-arch");
    session.update_field(&arch, Field::Operator, "contains");
    session.update_field(&arch, Field::Value, "arm");

    // Only the final tree gets published
    urls.changed().await?;
    let url = urls.borrow_and_update().clone();
    println!("Shareable URL: {url}");

    // Someone opening the link gets the same tree back
    let token = url.split_once("?filter=").map(|(_, token)| token).unwrap_or_default();
    let restored = deserialize(token)?;
    assert_eq!(session.current(), &restored);

    let predicate = compile(&restored)?;
    println!("Predicate: {predicate}");
    let sql = to_sql(&predicate);
    println!("WHERE {}", sql.clause);
    println!("Binds: {:?}", sql.binds);

    // Saved filters drop the node ids
    println!("Saved as: {}", serde_json::to_string(&session.snapshot())?);
    Ok(())
}
