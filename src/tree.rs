use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Identifier of a node inside a filter tree.
///
/// Identifiers are unique across a whole tree. The root group always uses the reserved
/// [`NodeId::ROOT`] value.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub const ROOT: &'static str = "root";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn root() -> Self {
        Self(Self::ROOT.to_owned())
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The combinator applied by a [`FilterGroup`] to its children.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GroupOperator {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl FromStr for GroupOperator {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(()),
        }
    }
}

impl Display for GroupOperator {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::And => write!(formatter, "AND"),
            Self::Or => write!(formatter, "OR"),
        }
    }
}

/// A leaf comparison: `attribute <operator> value`.
///
/// The operator is kept as the raw name chosen in the interface; it is only checked when the
/// tree gets compiled (see [`crate::compile`]). An empty `attribute_id` marks a condition whose
/// attribute has not been picked yet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCondition {
    pub id: NodeId,
    pub attribute_id: String,
    pub operator: String,
    pub value: String,
}

impl FilterCondition {
    pub const DEFAULT_OPERATOR: &'static str = "equals";

    /// A condition with no attribute selected, comparing with `equals` against an empty value.
    pub fn blank(id: NodeId) -> Self {
        Self {
            id,
            attribute_id: String::new(),
            operator: Self::DEFAULT_OPERATOR.to_owned(),
            value: String::new(),
        }
    }
}

/// An internal node combining its children with an AND/OR operator.
///
/// The order of `conditions` is the display order and is preserved by every operation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub id: NodeId,
    pub operator: GroupOperator,
    pub conditions: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            operator: GroupOperator::And,
            conditions: Vec::new(),
        }
    }

    /// The fresh tree every session starts from: an empty `AND` group with the root id.
    #[inline]
    pub fn empty_root() -> Self {
        Self::new(NodeId::root())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of nodes in the tree, the group itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .conditions
            .iter()
            .map(|node| match node {
                FilterNode::Condition(_) => 1,
                FilterNode::Group(group) => group.node_count(),
            })
            .sum::<usize>()
    }
}

impl Default for FilterGroup {
    fn default() -> Self {
        Self::empty_root()
    }
}

/// A child of a [`FilterGroup`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterNode {
    Condition(FilterCondition),
    Group(FilterGroup),
}

impl FilterNode {
    #[inline]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Condition(condition) => &condition.id,
            Self::Group(group) => &group.id,
        }
    }

    #[inline]
    pub fn as_group(&self) -> Option<&FilterGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Condition(_) => None,
        }
    }

    #[inline]
    pub fn as_condition(&self) -> Option<&FilterCondition> {
        match self {
            Self::Condition(condition) => Some(condition),
            Self::Group(_) => None,
        }
    }
}

impl From<FilterCondition> for FilterNode {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        Self::Group(group)
    }
}

/// The editable fields of a node, as targeted by [`crate::update_field`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    AttributeId,
    Operator,
    Value,
}

impl FromStr for Field {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "attributeId" => Ok(Self::AttributeId),
            "operator" => Ok(Self::Operator),
            "value" => Ok(Self::Value),
            _ => Err(()),
        }
    }
}
