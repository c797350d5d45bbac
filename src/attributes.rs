use crate::{
    predicate::Comparator,
    tree::{FilterGroup, FilterNode, NodeId},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

#[derive(Error, PartialEq, Debug)]
pub enum AttributeError {
    #[error("filter refers to non-existing attribute '{0}'")]
    UnknownAttribute(String),
    #[error("condition {node} has no attribute selected")]
    MissingAttribute { node: NodeId },
    #[error("{attribute:?}: operator '{operator}' is not supported for {kind} attributes")]
    IncompatibleOperator {
        attribute: String,
        kind: AttributeKind,
        operator: String,
    },
    #[error("{attribute:?}: '{value}' is not a valid {kind} value")]
    InvalidValue {
        attribute: String,
        kind: AttributeKind,
        value: String,
    },
    #[error("filter has no conditions")]
    EmptyFilter,
}

/// The type of the values stored for an attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Number,
    Boolean,
    Date,
}

impl AttributeKind {
    const DATE_FORMAT: &'static str = "%Y-%m-%d";

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// The comparators a condition may use against an attribute of this type.
    pub fn comparators(&self) -> &'static [Comparator] {
        const STRING: &[Comparator] = &[Comparator::Equals, Comparator::Contains];
        const ORDERED: &[Comparator] = &[
            Comparator::Equals,
            Comparator::GreaterThan,
            Comparator::LessThan,
            Comparator::GreaterThanEqual,
            Comparator::LessThanEqual,
        ];
        const BOOLEAN: &[Comparator] = &[Comparator::Equals];

        match self {
            Self::String => STRING,
            Self::Number | Self::Date => ORDERED,
            Self::Boolean => BOOLEAN,
        }
    }

    #[inline]
    pub fn supports(&self, comparator: Comparator) -> bool {
        self.comparators().contains(&comparator)
    }

    /// Whether `value` is a well-formed value for this type.
    ///
    /// Numbers are decimals, booleans are `true`/`false` and dates are `YYYY-MM-DD`.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::String => true,
            Self::Number => Decimal::from_str(value.trim()).is_ok(),
            Self::Boolean => matches!(value, "true" | "false"),
            Self::Date => NaiveDate::parse_from_str(value, Self::DATE_FORMAT).is_ok(),
        }
    }
}

impl Display for AttributeKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            other => Err(format!("unknown attribute type '{other}'")),
        }
    }
}

/// A named, typed field that conditions and builds refer to by id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(id: &str, name: &str, kind: AttributeKind) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            kind,
        }
    }
}

/// An operator choice as offered to the interface for a given attribute type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct OperatorOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// The operator choices for an attribute type, in display order.
pub fn operators_for(kind: AttributeKind) -> Vec<OperatorOption> {
    kind.comparators()
        .iter()
        .map(|comparator| OperatorOption {
            value: comparator.name(),
            label: label(*comparator),
        })
        .collect()
}

fn label(comparator: Comparator) -> &'static str {
    match comparator {
        Comparator::Equals => "Equals",
        Comparator::Contains => "Contains",
        Comparator::GreaterThan => "Greater Than",
        Comparator::LessThan => "Less Than",
        Comparator::GreaterThanEqual => "Greater or Equal",
        Comparator::LessThanEqual => "Less or Equal",
    }
}

/// The known attributes, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct AttributeTable {
    by_ids: HashMap<String, Attribute>,
}

impl AttributeTable {
    pub fn new(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let by_ids = attributes
            .into_iter()
            .map(|attribute| (attribute.id.clone(), attribute))
            .collect();
        Self { by_ids }
    }

    #[inline]
    pub fn by_id(&self, id: &str) -> Option<&Attribute> {
        self.by_ids.get(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_ids.is_empty()
    }

    /// Check that a value may be stored for the attribute `id`.
    pub fn check_value(&self, id: &str, value: &str) -> Result<&Attribute, AttributeError> {
        let attribute = self
            .by_id(id)
            .ok_or_else(|| AttributeError::UnknownAttribute(id.to_owned()))?;
        if !attribute.kind.accepts(value) {
            return Err(AttributeError::InvalidValue {
                attribute: attribute.name.clone(),
                kind: attribute.kind,
                value: value.to_owned(),
            });
        }
        Ok(attribute)
    }

    /// Check that a tree is complete enough to be saved.
    ///
    /// The tree must hold at least one condition, and every condition must refer to a known
    /// attribute with an operator supported by the attribute type.
    pub fn validate_tree(&self, root: &FilterGroup) -> Result<(), AttributeError> {
        if root.is_empty() {
            return Err(AttributeError::EmptyFilter);
        }
        self.validate_group(root)
    }

    fn validate_group(&self, group: &FilterGroup) -> Result<(), AttributeError> {
        group.conditions.iter().try_for_each(|node| match node {
            FilterNode::Group(inner) => self.validate_group(inner),
            FilterNode::Condition(condition) => {
                if condition.attribute_id.is_empty() {
                    return Err(AttributeError::MissingAttribute {
                        node: condition.id.clone(),
                    });
                }
                let attribute = self
                    .by_id(&condition.attribute_id)
                    .ok_or_else(|| AttributeError::UnknownAttribute(condition.attribute_id.clone()))?;
                let incompatible = || AttributeError::IncompatibleOperator {
                    attribute: attribute.name.clone(),
                    kind: attribute.kind,
                    operator: condition.operator.clone(),
                };
                let comparator = condition
                    .operator
                    .parse::<Comparator>()
                    .map_err(|_| incompatible())?;
                if !attribute.kind.supports(comparator) {
                    return Err(incompatible());
                }
                Ok(())
            }
        })
    }
}
