use crate::{
    error::FilterError,
    tree::{FilterCondition, FilterGroup, FilterNode, GroupOperator},
};
use itertools::Itertools;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// The comparison applied between a stored attribute value and the value of a condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Comparator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
}

impl Comparator {
    pub const ALL: [Comparator; 6] = [
        Self::Equals,
        Self::Contains,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanEqual,
        Self::LessThanEqual,
    ];

    /// The operator name used by conditions.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::GreaterThanEqual => "gte",
            Self::LessThanEqual => "lte",
        }
    }

    /// Whether the comparator orders values rather than matching them.
    #[inline]
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::LessThan | Self::GreaterThanEqual | Self::LessThanEqual
        )
    }
}

impl FromStr for Comparator {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|comparator| comparator.name() == value)
            .ok_or_else(|| FilterError::UnsupportedOperator(value.to_owned()))
    }
}

impl Display for Comparator {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

/// A compiled filter, ready to be translated by a persistence layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    /// Satisfied by every record. This is what an empty group compiles to, whatever its
    /// operator.
    MatchAll,
    Combinator {
        operator: GroupOperator,
        children: Vec<Predicate>,
    },
    Comparison {
        attribute_id: String,
        comparator: Comparator,
        value: String,
    },
}

impl Predicate {
    pub fn comparison(attribute_id: &str, comparator: Comparator, value: &str) -> Self {
        Self::Comparison {
            attribute_id: attribute_id.to_owned(),
            comparator,
            value: value.to_owned(),
        }
    }

    #[inline]
    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll)
    }
}

impl Display for Predicate {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::MatchAll => write!(formatter, "TRUE"),
            Self::Combinator { operator, children } => {
                write!(formatter, "{operator}({})", children.iter().join(", "))
            }
            Self::Comparison {
                attribute_id,
                comparator,
                value,
            } => write!(formatter, "({attribute_id} {comparator} {value:?})"),
        }
    }
}

/// Compile a filter tree into a [`Predicate`].
///
/// Groups become combinators over their compiled children, conditions become comparisons with
/// the same attribute, operator and value. Operators are not checked against the attribute
/// type here.
///
/// # Examples
///
/// ```rust
/// use build_filter::{compile, Comparator, FilterGroup, Predicate};
///
/// assert_eq!(Predicate::MatchAll, compile(&FilterGroup::empty_root()).unwrap());
/// ```
pub fn compile(root: &FilterGroup) -> Result<Predicate, FilterError> {
    if root.is_empty() {
        return Ok(Predicate::MatchAll);
    }

    let children = root
        .conditions
        .iter()
        .map(|node| match node {
            FilterNode::Condition(condition) => compile_condition(condition),
            FilterNode::Group(group) => compile(group),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Predicate::Combinator {
        operator: root.operator,
        children,
    })
}

fn compile_condition(condition: &FilterCondition) -> Result<Predicate, FilterError> {
    let comparator = condition.operator.parse::<Comparator>()?;
    Ok(Predicate::comparison(
        &condition.attribute_id,
        comparator,
        &condition.value,
    ))
}
