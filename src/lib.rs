//! Nested boolean filters over typed build attributes.
//!
//! A filter is a tree of [groups](FilterGroup) combining [conditions](FilterCondition) with
//! `AND`/`OR`. The tree is edited through pure functions that return a new tree, shared as an
//! opaque URL-safe token, compiled into a [`Predicate`] and finally translated into SQL to query
//! the stored builds.
//!
//! # Examples
//!
//! Building a filter, sharing it and compiling it:
//!
//! ```
//! use build_filter::{
//!     add_condition, compile, deserialize, serialize, update_field, Comparator, Field,
//!     FilterGroup, GroupOperator, NodeId, Predicate, SequentialIds,
//! };
//!
//! let mut ids = SequentialIds::new();
//! let root = FilterGroup::empty_root();
//!
//! // Add a blank condition to the root and fill it in
//! let root = add_condition(&root, &NodeId::root(), &mut ids);
//! let id = root.conditions[0].id().clone();
//! let root = update_field(&root, &id, Field::AttributeId, "attr-os");
//! let root = update_field(&root, &id, Field::Value, "linux");
//!
//! // Share it as a token
//! let token = serialize(&root).unwrap();
//! assert_eq!(root, deserialize(&token).unwrap());
//!
//! // Compile it for the persistence layer
//! assert_eq!(
//!     Predicate::Combinator {
//!         operator: GroupOperator::And,
//!         children: vec![Predicate::comparison("attr-os", Comparator::Equals, "linux")],
//!     },
//!     compile(&root).unwrap()
//! );
//! ```
//!
//! # Operators
//!
//! Conditions support the following operators, depending on the type of their attribute:
//!
//! * `equals`: every type;
//! * `contains`: `string` only, a case-sensitive substring match;
//! * `gt`, `lt`, `gte` and `lte`: `number` (compared numerically) and `date` (`YYYY-MM-DD`,
//!   compared chronologically).
//!
//! An empty group matches every build, whatever its operator.
//!
//! # Sharing
//!
//! A [`FilterSession`] holds the tree being edited and publishes it, debounced, through a
//! [`UrlPublisher`] such as [`ShareLink`]. Saved filters keep the tree without its node ids (see
//! [`strip_ids`]) and get fresh ids when loaded back.
mod api;
mod attributes;
mod codec;
mod config;
mod error;
mod ids;
mod mutation;
mod predicate;
mod repository;
mod session;
mod sql;
mod template;
#[cfg(test)]
mod test_utils;
mod tree;
mod url_sync;

pub use crate::{
    api::{router, ApiError, ErrorResponse},
    attributes::{
        operators_for, Attribute, AttributeError, AttributeKind, AttributeTable, OperatorOption,
    },
    codec::{deserialize, serialize},
    config::ServerConfig,
    error::{FilterError, StoreError},
    ids::{IdGenerator, SequentialIds, UuidGenerator},
    mutation::{
        add_condition, add_group, delete_item, find_node, node_ids, update_field, NodeRef,
    },
    predicate::{compile, Comparator, Predicate},
    repository::{
        Build, BuildAttribute, NewAttribute, NewBuild, NewBuildAttribute, Repository,
        SavedFilter, SqliteRepository,
    },
    session::FilterSession,
    sql::{to_sql, SqlCondition},
    template::{strip_ids, FilterTemplate, TemplateCondition, TemplateGroup, TemplateNode},
    tree::{Field, FilterCondition, FilterGroup, FilterNode, GroupOperator, NodeId},
    url_sync::{ShareLink, UrlPublisher, UrlSync, DEFAULT_DEBOUNCE},
};
