//! Id-less snapshots of a filter tree, as stored with a saved filter.
use crate::{
    ids::IdGenerator,
    tree::{FilterCondition, FilterGroup, FilterNode, GroupOperator, NodeId},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCondition {
    pub attribute_id: String,
    pub operator: String,
    pub value: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub operator: GroupOperator,
    pub conditions: Vec<TemplateNode>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TemplateNode {
    Condition(TemplateCondition),
    Group(TemplateGroup),
}

impl From<TemplateCondition> for TemplateNode {
    fn from(condition: TemplateCondition) -> Self {
        Self::Condition(condition)
    }
}

impl From<TemplateGroup> for TemplateNode {
    fn from(group: TemplateGroup) -> Self {
        Self::Group(group)
    }
}

/// A filter tree with every node id removed.
///
/// Built with [`strip_ids`]; turned back into an editable tree with
/// [`FilterTemplate::instantiate`], which mints new ids for every node.
pub type FilterTemplate = TemplateGroup;

/// Drop every node id of a tree, keeping its shape, operators and values.
pub fn strip_ids(root: &FilterGroup) -> FilterTemplate {
    TemplateGroup {
        operator: root.operator,
        conditions: root
            .conditions
            .iter()
            .map(|node| match node {
                FilterNode::Condition(condition) => TemplateNode::Condition(TemplateCondition {
                    attribute_id: condition.attribute_id.clone(),
                    operator: condition.operator.clone(),
                    value: condition.value.clone(),
                }),
                FilterNode::Group(group) => TemplateNode::Group(strip_ids(group)),
            })
            .collect(),
    }
}

impl TemplateGroup {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Rebuild an editable tree. The root receives the reserved root id and every other node a
    /// fresh id from `ids`.
    pub fn instantiate<G: IdGenerator + ?Sized>(&self, ids: &mut G) -> FilterGroup {
        self.instantiate_as(NodeId::root(), ids)
    }

    fn instantiate_as<G: IdGenerator + ?Sized>(&self, id: NodeId, ids: &mut G) -> FilterGroup {
        FilterGroup {
            id,
            operator: self.operator,
            conditions: self
                .conditions
                .iter()
                .map(|node| match node {
                    TemplateNode::Condition(condition) => FilterNode::Condition(FilterCondition {
                        id: ids.next_id(),
                        attribute_id: condition.attribute_id.clone(),
                        operator: condition.operator.clone(),
                        value: condition.value.clone(),
                    }),
                    TemplateNode::Group(group) => {
                        let id = ids.next_id();
                        FilterNode::Group(group.instantiate_as(id, &mut *ids))
                    }
                })
                .collect(),
        }
    }
}
