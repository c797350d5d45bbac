//! Pure edits of a filter tree.
//!
//! Every function borrows the current root and returns a brand new root; the input is never
//! modified. A target id that cannot be found is not an error: the returned tree is simply
//! equal to the input. When several nodes could match, the first one found in a depth-first,
//! left-to-right walk wins.
use crate::{
    ids::IdGenerator,
    tree::{Field, FilterCondition, FilterGroup, FilterNode, GroupOperator, NodeId},
};
use std::collections::HashSet;

/// Append a new empty `AND` group to the children of the group `parent`.
///
/// The new node takes the next id of `ids` that is not already used in `root`, so a generator
/// that restarts its sequence on a restored tree never produces a duplicate.
pub fn add_group<G: IdGenerator + ?Sized>(
    root: &FilterGroup,
    parent: &NodeId,
    ids: &mut G,
) -> FilterGroup {
    append_child(root, parent, ids, |id| FilterGroup::new(id).into())
}

/// Append a new blank condition to the children of the group `parent`.
///
/// Ids already used in `root` are skipped, as for [`add_group`].
pub fn add_condition<G: IdGenerator + ?Sized>(
    root: &FilterGroup,
    parent: &NodeId,
    ids: &mut G,
) -> FilterGroup {
    append_child(root, parent, ids, |id| FilterCondition::blank(id).into())
}

/// Remove the node `item` (and its whole subtree) from the group that directly contains it.
///
/// A match among the direct children of a group is preferred over any match deeper down. The
/// root itself is never removed.
pub fn delete_item(root: &FilterGroup, item: &NodeId) -> FilterGroup {
    let mut next = root.clone();
    if !item.is_root() {
        remove_first(&mut next, item);
    }
    next
}

/// Replace `field` of the node `item` with `value`.
///
/// Targeting the root id with [`Field::Operator`] changes the root combinator. Fields that do
/// not exist on the targeted node, and group operators other than `AND`/`OR`, leave the tree
/// unchanged.
pub fn update_field(root: &FilterGroup, item: &NodeId, field: Field, value: &str) -> FilterGroup {
    let mut next = root.clone();
    if item.is_root() && field == Field::Operator {
        set_group_operator(&mut next, value);
        return next;
    }

    match find_node_mut(&mut next, item) {
        Some(FilterNode::Condition(condition)) => match field {
            Field::AttributeId => condition.attribute_id = value.to_owned(),
            Field::Operator => condition.operator = value.to_owned(),
            Field::Value => condition.value = value.to_owned(),
        },
        Some(FilterNode::Group(group)) => {
            if field == Field::Operator {
                set_group_operator(group, value);
            }
        }
        None => {}
    }
    next
}

/// A borrowed node of a tree, the root included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeRef<'a> {
    Group(&'a FilterGroup),
    Condition(&'a FilterCondition),
}

impl NodeRef<'_> {
    #[inline]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Group(group) => &group.id,
            Self::Condition(condition) => &condition.id,
        }
    }
}

/// Find the first node whose id is `id`, looking at the root first.
pub fn find_node<'a>(root: &'a FilterGroup, id: &NodeId) -> Option<NodeRef<'a>> {
    if root.id == *id {
        return Some(NodeRef::Group(root));
    }

    root.conditions.iter().find_map(|node| match node {
        FilterNode::Condition(condition) if condition.id == *id => {
            Some(NodeRef::Condition(condition))
        }
        FilterNode::Condition(_) => None,
        FilterNode::Group(group) => find_node(group, id),
    })
}

/// All the ids of a tree in depth-first, left-to-right order, starting with the root.
pub fn node_ids(root: &FilterGroup) -> Vec<&NodeId> {
    let mut ids = Vec::with_capacity(root.node_count());
    collect_ids(root, &mut ids);
    ids
}

fn collect_ids<'a>(group: &'a FilterGroup, ids: &mut Vec<&'a NodeId>) {
    ids.push(&group.id);
    for node in &group.conditions {
        match node {
            FilterNode::Condition(condition) => ids.push(&condition.id),
            FilterNode::Group(group) => collect_ids(group, ids),
        }
    }
}

fn append_child<G, F>(root: &FilterGroup, parent: &NodeId, ids: &mut G, make_child: F) -> FilterGroup
where
    G: IdGenerator + ?Sized,
    F: FnOnce(NodeId) -> FilterNode,
{
    let mut next = root.clone();
    if let Some(group) = find_group_mut(&mut next, parent) {
        let id = unused_id(root, ids);
        group.conditions.push(make_child(id));
    }
    next
}

fn unused_id<G: IdGenerator + ?Sized>(root: &FilterGroup, ids: &mut G) -> NodeId {
    let taken: HashSet<&NodeId> = node_ids(root).into_iter().collect();
    loop {
        let id = ids.next_id();
        if !taken.contains(&id) {
            return id;
        }
    }
}

fn find_group_mut<'a>(group: &'a mut FilterGroup, id: &NodeId) -> Option<&'a mut FilterGroup> {
    if group.id == *id {
        return Some(group);
    }

    group.conditions.iter_mut().find_map(|node| match node {
        FilterNode::Group(inner) => find_group_mut(inner, id),
        FilterNode::Condition(_) => None,
    })
}

fn find_node_mut<'a>(group: &'a mut FilterGroup, id: &NodeId) -> Option<&'a mut FilterNode> {
    for node in group.conditions.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let FilterNode::Group(inner) = node {
            if let Some(found) = find_node_mut(inner, id) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_first(group: &mut FilterGroup, item: &NodeId) -> bool {
    if let Some(position) = group.conditions.iter().position(|node| node.id() == item) {
        group.conditions.remove(position);
        return true;
    }

    group.conditions.iter_mut().any(|node| match node {
        FilterNode::Group(inner) => remove_first(inner, item),
        FilterNode::Condition(_) => false,
    })
}

fn set_group_operator(group: &mut FilterGroup, value: &str) {
    if let Ok(operator) = value.parse::<GroupOperator>() {
        group.operator = operator;
    }
}
