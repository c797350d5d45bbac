use build_filter::{
    add_condition, add_group, compile, delete_item, deserialize, find_node, node_ids, serialize,
    to_sql, update_field, Field, FilterGroup, FilterNode, GroupOperator, NodeId, NodeRef,
    SequentialIds,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use itertools::Itertools;

const DEPTH: usize = 4;
const FANOUT: usize = 4;
const OPERATORS: [&str; 3] = ["equals", "gte", "lt"];

/// A full tree of groups, `FANOUT` conditions and `FANOUT` groups per level.
fn a_large_tree() -> FilterGroup {
    let mut ids = SequentialIds::with_prefix("bench");
    let mut root = FilterGroup::empty_root();
    let mut parents = vec![NodeId::root()];
    for _ in 0..DEPTH {
        let mut next_parents = Vec::with_capacity(parents.len() * FANOUT);
        for parent in &parents {
            for _ in 0..FANOUT {
                root = add_condition(&root, parent, &mut ids);
                root = add_group(&root, parent, &mut ids);
            }
            next_parents.extend(children_groups(&root, parent));
        }
        parents = next_parents;
    }

    let conditions = condition_ids(&root);
    for (index, id) in conditions.iter().enumerate() {
        root = update_field(&root, id, Field::AttributeId, &format!("attr-{}", index % 8));
        root = update_field(&root, id, Field::Operator, OPERATORS[index % OPERATORS.len()]);
        root = update_field(&root, id, Field::Value, &index.to_string());
    }
    for group in group_ids(&root).into_iter().step_by(2) {
        root = update_field(&root, &group, Field::Operator, &GroupOperator::Or.to_string());
    }
    root
}

fn children_groups(root: &FilterGroup, parent: &NodeId) -> Vec<NodeId> {
    match find_node(root, parent) {
        Some(NodeRef::Group(group)) => group
            .conditions
            .iter()
            .filter_map(FilterNode::as_group)
            .map(|group| group.id.clone())
            .collect(),
        _ => vec![],
    }
}

fn group_ids(group: &FilterGroup) -> Vec<NodeId> {
    group
        .conditions
        .iter()
        .filter_map(FilterNode::as_group)
        .flat_map(|inner| std::iter::once(inner.id.clone()).chain(group_ids(inner)))
        .collect_vec()
}

fn condition_ids(group: &FilterGroup) -> Vec<NodeId> {
    group
        .conditions
        .iter()
        .flat_map(|node| match node {
            FilterNode::Condition(condition) => vec![condition.id.clone()],
            FilterNode::Group(group) => condition_ids(group),
        })
        .collect()
}

pub fn mutate(c: &mut Criterion) {
    let tree = a_large_tree();
    let deepest = node_ids(&tree).last().map(|id| (*id).clone()).unwrap();
    c.bench_function("add_condition_deep", |b| {
        b.iter_batched(
            || SequentialIds::with_prefix("extra"),
            |mut ids| std::hint::black_box(add_condition(&tree, &deepest, &mut ids)),
            BatchSize::SmallInput,
        )
    });
    c.bench_function("delete_item_deep", |b| {
        b.iter(|| std::hint::black_box(delete_item(&tree, &deepest)))
    });
    c.bench_function("update_field_deep", |b| {
        b.iter(|| std::hint::black_box(update_field(&tree, &deepest, Field::Value, "42")))
    });
}

pub fn codec(c: &mut Criterion) {
    let tree = a_large_tree();
    let token = serialize(&tree).unwrap();
    c.bench_function("serialize", |b| {
        b.iter(|| std::hint::black_box(serialize(&tree)))
    });
    c.bench_function("deserialize", |b| {
        b.iter(|| std::hint::black_box(deserialize(&token)))
    });
}

pub fn compilation(c: &mut Criterion) {
    let tree = a_large_tree();
    let predicate = compile(&tree).unwrap();
    c.bench_function("compile", |b| {
        b.iter(|| std::hint::black_box(compile(&tree)))
    });
    c.bench_function("to_sql", |b| {
        b.iter(|| std::hint::black_box(to_sql(&predicate)))
    });
}

criterion_group!(benches, mutate, codec, compilation);
criterion_main!(benches);
