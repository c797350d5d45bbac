macro_rules! group {
    ($id:expr, $operator:ident, [$($child:expr),* $(,)?]) => {
        $crate::tree::FilterGroup {
            id: $crate::tree::NodeId::from($id),
            operator: $crate::tree::GroupOperator::$operator,
            conditions: vec![$($crate::tree::FilterNode::from($child)),*],
        }
    };
}

macro_rules! condition {
    ($id:expr, $attribute:expr, $operator:expr, $value:expr) => {
        $crate::tree::FilterCondition {
            id: $crate::tree::NodeId::from($id),
            attribute_id: String::from($attribute),
            operator: String::from($operator),
            value: String::from($value),
        }
    };
}

pub(crate) use condition;
pub(crate) use group;

pub mod templates {
    macro_rules! group {
        ($operator:ident, [$($child:expr),* $(,)?]) => {
            $crate::template::TemplateGroup {
                operator: $crate::tree::GroupOperator::$operator,
                conditions: vec![$($crate::template::TemplateNode::from($child)),*],
            }
        };
    }

    macro_rules! condition {
        ($attribute:expr, $operator:expr, $value:expr) => {
            $crate::template::TemplateCondition {
                attribute_id: String::from($attribute),
                operator: String::from($operator),
                value: String::from($value),
            }
        };
    }

    pub(crate) use condition;
    pub(crate) use group;
}

pub mod attributes {
    use crate::attributes::{Attribute, AttributeKind, AttributeTable};

    pub const AN_ATTRIBUTE: &str = "attr-os";
    pub const A_NUMBER_ATTRIBUTE: &str = "attr-cores";
    pub const A_BOOLEAN_ATTRIBUTE: &str = "attr-debug";
    pub const A_DATE_ATTRIBUTE: &str = "attr-released";

    pub fn define_attributes() -> AttributeTable {
        AttributeTable::new(vec![
            Attribute::new(AN_ATTRIBUTE, "os", AttributeKind::String),
            Attribute::new(A_NUMBER_ATTRIBUTE, "cores", AttributeKind::Number),
            Attribute::new(A_BOOLEAN_ATTRIBUTE, "debug", AttributeKind::Boolean),
            Attribute::new(A_DATE_ATTRIBUTE, "released", AttributeKind::Date),
        ])
    }
}
