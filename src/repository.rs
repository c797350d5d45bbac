use crate::{
    attributes::{Attribute, AttributeKind, AttributeTable},
    error::StoreError,
    predicate::Predicate,
    sql::to_sql,
    template::FilterTemplate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StoreError>;

/// A build record with its attribute values.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub attributes: Vec<BuildAttribute>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildAttribute {
    pub attribute_id: String,
    pub value: String,
    pub attribute: Attribute,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NewAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBuildAttribute {
    pub attribute_id: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewBuild {
    pub name: String,
    pub description: String,
    pub attributes: Vec<NewBuildAttribute>,
}

/// A named filter. `conditions` holds the JSON text of the tree, without node ids.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
    pub conditions: String,
    pub created_at: DateTime<Utc>,
}

impl SavedFilter {
    /// The stored tree, ready to be instantiated.
    pub fn template(&self) -> Result<FilterTemplate> {
        Ok(serde_json::from_str(&self.conditions)?)
    }
}

/// Storage of attributes, builds and saved filters.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    async fn list_attributes(&self) -> Result<Vec<Attribute>>;
    async fn create_attribute(&self, attribute: &NewAttribute) -> Result<Attribute>;

    /// The builds matching `filter`, oldest first.
    async fn list_builds(&self, filter: &Predicate) -> Result<Vec<Build>>;
    async fn create_build(&self, build: &NewBuild) -> Result<Build>;

    async fn list_filters(&self) -> Result<Vec<SavedFilter>>;
    async fn create_filter(&self, name: &str, template: &FilterTemplate) -> Result<SavedFilter>;

    async fn attribute_table(&self) -> Result<AttributeTable> {
        Ok(AttributeTable::new(self.list_attributes().await?))
    }
}

#[derive(Clone, Debug)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS attributes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS builds (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS build_attributes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                build_id TEXT NOT NULL REFERENCES builds(id),
                attribute_id TEXT NOT NULL REFERENCES attributes(id),
                value TEXT NOT NULL
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_build_attributes_build
            ON build_attributes (build_id, attribute_id)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS filters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                conditions TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Attribute values of the builds selected by `clause`, grouped by build id.
    async fn attributes_of(
        connection: &mut SqliteConnection,
        clause: &str,
        binds: &[String],
    ) -> Result<HashMap<String, Vec<BuildAttribute>>> {
        let sql = format!(
            r#"
            SELECT bav.build_id, bav.value, attr.id AS attribute_id, attr.name, attr.type AS kind
            FROM build_attributes bav
            JOIN attributes attr ON attr.id = bav.attribute_id
            WHERE bav.build_id IN (SELECT b.id FROM builds b WHERE {clause})
            ORDER BY bav.id ASC
            "#
        );
        let mut query = sqlx::query_as::<_, BuildAttributeRow>(&sql);
        for bind in binds {
            query = query.bind(bind.as_str());
        }
        let rows = query.fetch_all(connection).await?;

        rows.into_iter()
            .map(|row| {
                let build_id = row.build_id.clone();
                BuildAttribute::try_from(row).map(|attribute| (build_id, attribute))
            })
            .process_results(|pairs| pairs.into_group_map())
    }

    /// Builds selected by `clause` with their attribute values, read in one transaction.
    async fn builds_where(&self, clause: &str, binds: &[String]) -> Result<Vec<Build>> {
        let sql = format!(
            r#"
            SELECT b.id, b.name, b.description, b.created_at
            FROM builds b
            WHERE {clause}
            ORDER BY b.rowid ASC
            "#
        );
        let mut query = sqlx::query_as::<_, BuildRow>(&sql);
        for bind in binds {
            query = query.bind(bind.as_str());
        }
        let mut tx = self.pool.begin().await?;
        let rows = query.fetch_all(&mut *tx).await?;
        let mut attributes = Self::attributes_of(&mut *tx, clause, binds).await?;
        tx.commit().await?;

        rows.into_iter()
            .map(|row| {
                let values = attributes.remove(&row.id).unwrap_or_default();
                row.into_build(values)
            })
            .collect()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    #[instrument(skip(self))]
    async fn list_attributes(&self) -> Result<Vec<Attribute>> {
        let rows = sqlx::query_as::<_, AttributeRow>(
            r#"
            SELECT id, name, type AS kind
            FROM attributes
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, attribute), fields(name = %attribute.name, kind = %attribute.kind))]
    async fn create_attribute(&self, attribute: &NewAttribute) -> Result<Attribute> {
        let created = Attribute::new(&Uuid::new_v4().to_string(), &attribute.name, attribute.kind);
        sqlx::query(
            r#"
            INSERT INTO attributes (id, name, type, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(created.kind.name())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self, filter), fields(filter = %filter))]
    async fn list_builds(&self, filter: &Predicate) -> Result<Vec<Build>> {
        let condition = to_sql(filter);
        self.builds_where(&condition.clause, &condition.binds).await
    }

    #[instrument(skip(self, build), fields(name = %build.name, values = build.attributes.len()))]
    async fn create_build(&self, build: &NewBuild) -> Result<Build> {
        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO builds (id, name, description, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&build.name)
        .bind(&build.description)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for value in &build.attributes {
            sqlx::query(
                r#"
                INSERT INTO build_attributes (build_id, attribute_id, value)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(&value.attribute_id)
            .bind(&value.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.builds_where("b.id = ?", &[id.clone()])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Corrupt(format!("build {id} vanished after insert")))
    }

    #[instrument(skip(self))]
    async fn list_filters(&self) -> Result<Vec<SavedFilter>> {
        let rows = sqlx::query_as::<_, SavedFilterRow>(
            r#"
            SELECT id, name, conditions, created_at
            FROM filters
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self, template), fields(name = %name))]
    async fn create_filter(&self, name: &str, template: &FilterTemplate) -> Result<SavedFilter> {
        let created_at = Utc::now();
        let filter = SavedFilter {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            conditions: serde_json::to_string(template)?,
            created_at,
        };
        sqlx::query(
            r#"
            INSERT INTO filters (id, name, conditions, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&filter.id)
        .bind(&filter.name)
        .bind(&filter.conditions)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(filter)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| StoreError::Corrupt(format!("invalid timestamp '{value}'")))
}

fn parse_kind(value: &str) -> Result<AttributeKind> {
    value.parse().map_err(StoreError::Corrupt)
}

#[derive(sqlx::FromRow)]
struct AttributeRow {
    id: String,
    name: String,
    kind: String,
}

impl TryFrom<AttributeRow> for Attribute {
    type Error = StoreError;

    fn try_from(row: AttributeRow) -> Result<Self> {
        Ok(Attribute {
            kind: parse_kind(&row.kind)?,
            id: row.id,
            name: row.name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BuildRow {
    id: String,
    name: String,
    description: String,
    created_at: String,
}

impl BuildRow {
    fn into_build(self, attributes: Vec<BuildAttribute>) -> Result<Build> {
        Ok(Build {
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            name: self.name,
            description: self.description,
            attributes,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BuildAttributeRow {
    build_id: String,
    value: String,
    attribute_id: String,
    name: String,
    kind: String,
}

impl TryFrom<BuildAttributeRow> for BuildAttribute {
    type Error = StoreError;

    fn try_from(row: BuildAttributeRow) -> Result<Self> {
        Ok(BuildAttribute {
            attribute: Attribute {
                id: row.attribute_id.clone(),
                name: row.name,
                kind: parse_kind(&row.kind)?,
            },
            attribute_id: row.attribute_id,
            value: row.value,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SavedFilterRow {
    id: String,
    name: String,
    conditions: String,
    created_at: String,
}

impl TryFrom<SavedFilterRow> for SavedFilter {
    type Error = StoreError;

    fn try_from(row: SavedFilterRow) -> Result<Self> {
        Ok(SavedFilter {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            name: row.name,
            conditions: row.conditions,
        })
    }
}
