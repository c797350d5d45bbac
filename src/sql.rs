//! Translation of a compiled [`Predicate`] into a SQLite `WHERE` expression.
//!
//! The expression is written against the `builds` table aliased as `b`. Every comparison
//! becomes an `EXISTS` over the attribute values of the build, so a build matches a condition
//! when at least one of its values for the attribute satisfies it.
use crate::{
    predicate::{Comparator, Predicate},
    tree::GroupOperator,
};

/// A boolean SQL expression and the values to bind to its `?` placeholders, in order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SqlCondition {
    pub clause: String,
    pub binds: Vec<String>,
}

impl SqlCondition {
    const MATCH_ALL: &'static str = "1 = 1";
}

/// Translate `predicate` into SQL.
///
/// Ordering comparisons against a `number` attribute cast both sides to `REAL`; any other
/// attribute type compares as text. `contains` is a case-sensitive substring match.
pub fn to_sql(predicate: &Predicate) -> SqlCondition {
    let mut condition = SqlCondition::default();
    write_predicate(predicate, &mut condition);
    condition
}

fn write_predicate(predicate: &Predicate, out: &mut SqlCondition) {
    match predicate {
        Predicate::MatchAll => out.clause.push_str(SqlCondition::MATCH_ALL),
        Predicate::Combinator { children, .. } if children.is_empty() => {
            out.clause.push_str(SqlCondition::MATCH_ALL)
        }
        Predicate::Combinator { operator, children } => {
            let separator = match operator {
                GroupOperator::And => " AND ",
                GroupOperator::Or => " OR ",
            };
            out.clause.push('(');
            for (index, child) in children.iter().enumerate() {
                if index > 0 {
                    out.clause.push_str(separator);
                }
                write_predicate(child, out);
            }
            out.clause.push(')');
        }
        Predicate::Comparison {
            attribute_id,
            comparator,
            value,
        } => write_comparison(attribute_id, *comparator, value, out),
    }
}

fn write_comparison(attribute_id: &str, comparator: Comparator, value: &str, out: &mut SqlCondition) {
    out.clause.push_str(
        "EXISTS (SELECT 1 FROM build_attributes ba JOIN attributes a ON a.id = ba.attribute_id \
         WHERE ba.build_id = b.id AND ba.attribute_id = ? AND ",
    );
    out.binds.push(attribute_id.to_owned());

    match comparator {
        Comparator::Equals => {
            out.clause.push_str("ba.value = ?");
            out.binds.push(value.to_owned());
        }
        Comparator::Contains => {
            out.clause.push_str("instr(ba.value, ?) > 0");
            out.binds.push(value.to_owned());
        }
        Comparator::GreaterThan => write_ordering(">", value, out),
        Comparator::LessThan => write_ordering("<", value, out),
        Comparator::GreaterThanEqual => write_ordering(">=", value, out),
        Comparator::LessThanEqual => write_ordering("<=", value, out),
    }
    out.clause.push(')');
}

fn write_ordering(symbol: &str, value: &str, out: &mut SqlCondition) {
    out.clause.push_str(&format!(
        "CASE WHEN a.type = 'number' THEN CAST(ba.value AS REAL) {symbol} CAST(? AS REAL) \
         ELSE ba.value {symbol} ? END"
    ));
    out.binds.push(value.to_owned());
    out.binds.push(value.to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        predicate::compile,
        test_utils::{condition, group},
    };

    const EXISTS: &str = "EXISTS (SELECT 1 FROM build_attributes ba JOIN attributes a ON a.id = ba.attribute_id WHERE ba.build_id = b.id AND ba.attribute_id = ? AND ";

    #[test]
    fn match_all_is_always_true() {
        assert_eq!(
            SqlCondition {
                clause: "1 = 1".to_owned(),
                binds: vec![],
            },
            to_sql(&Predicate::MatchAll)
        );
    }

    #[test]
    fn an_empty_combinator_is_always_true() {
        let predicate = Predicate::Combinator {
            operator: GroupOperator::Or,
            children: vec![],
        };

        assert_eq!("1 = 1", to_sql(&predicate).clause);
    }

    #[test]
    fn can_translate_an_equality() {
        let sql = to_sql(&Predicate::comparison("a1", Comparator::Equals, "linux"));

        assert_eq!(format!("{EXISTS}ba.value = ?)"), sql.clause);
        assert_eq!(vec!["a1", "linux"], sql.binds);
    }

    #[test]
    fn can_translate_a_substring_match() {
        let sql = to_sql(&Predicate::comparison("a1", Comparator::Contains, "arm"));

        assert_eq!(format!("{EXISTS}instr(ba.value, ?) > 0)"), sql.clause);
        assert_eq!(vec!["a1", "arm"], sql.binds);
    }

    #[test]
    fn ordering_comparisons_cast_numbers() {
        let sql = to_sql(&Predicate::comparison("a2", Comparator::GreaterThanEqual, "4"));

        assert_eq!(
            format!(
                "{EXISTS}CASE WHEN a.type = 'number' THEN CAST(ba.value AS REAL) >= CAST(? AS REAL) ELSE ba.value >= ? END)"
            ),
            sql.clause
        );
        assert_eq!(vec!["a2", "4", "4"], sql.binds);
    }

    #[test]
    fn every_ordering_comparator_uses_its_own_symbol() {
        for (comparator, symbol) in [
            (Comparator::GreaterThan, ">"),
            (Comparator::LessThan, "<"),
            (Comparator::GreaterThanEqual, ">="),
            (Comparator::LessThanEqual, "<="),
        ] {
            let sql = to_sql(&Predicate::comparison("a2", comparator, "4"));

            assert!(
                sql.clause
                    .contains(&format!("CAST(ba.value AS REAL) {symbol} CAST(? AS REAL)")),
                "{comparator}: {}",
                sql.clause
            );
            assert!(sql.clause.contains(&format!("ELSE ba.value {symbol} ? END")));
        }
    }

    #[test]
    fn can_translate_nested_groups() {
        let tree = group!("root", Or, [
            condition!("c1", "a1", "equals", "linux"),
            group!("g1", And, [
                condition!("c2", "a2", "lt", "16"),
                condition!("c3", "a3", "contains", "x"),
            ]),
        ]);

        let sql = to_sql(&compile(&tree).unwrap());

        assert!(sql.clause.starts_with(&format!("({EXISTS}ba.value = ?) OR (")));
        assert!(sql.clause.ends_with("instr(ba.value, ?) > 0)))"));
        assert_eq!(1, sql.clause.matches(" AND EXISTS").count());
        assert_eq!(vec!["a1", "linux", "a2", "16", "16", "a3", "x"], sql.binds);
    }

    #[test]
    fn every_placeholder_has_a_bind() {
        let tree = group!("root", And, [
            condition!("c1", "a1", "gt", "1"),
            condition!("c2", "a1", "lte", "9"),
            group!("g1", Or, []),
            condition!("c3", "a1", "equals", "5"),
        ]);

        let sql = to_sql(&compile(&tree).unwrap());

        assert_eq!(sql.clause.matches('?').count(), sql.binds.len());
    }
}
