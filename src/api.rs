//! JSON over HTTP access to attributes, builds and saved filters.
use crate::{
    attributes::{Attribute, AttributeError},
    codec::deserialize,
    error::{FilterError, StoreError},
    ids::SequentialIds,
    predicate::{compile, Predicate},
    repository::{Build, NewAttribute, NewBuild, NewBuildAttribute, Repository, SavedFilter},
    template::{strip_ids, FilterTemplate},
};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

/// Unwrap a JSON request body, reporting a body axum cannot read as `invalid_body`.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request("invalid_body", rejection.body_text()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            Self::Filter(FilterError::MalformedToken { .. }) => {
                (StatusCode::BAD_REQUEST, "malformed_filter")
            }
            Self::Filter(FilterError::UnsupportedOperator(_)) => {
                (StatusCode::BAD_REQUEST, "unsupported_operator")
            }
            Self::Filter(FilterError::Encode(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            Self::Attribute(_) => (StatusCode::BAD_REQUEST, "invalid_attributes"),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "An internal error occurred".to_owned()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_owned(),
                message,
            }),
        )
            .into_response()
    }
}

pub fn router<R: Repository>(repository: Arc<R>) -> Router {
    Router::new()
        .route(
            "/attributes",
            get(list_attributes::<R>).post(create_attribute::<R>),
        )
        .route("/builds", get(list_builds::<R>).post(create_build::<R>))
        .route("/filters", get(list_filters::<R>).post(create_filter::<R>))
        .with_state(repository)
}

async fn list_attributes<R: Repository>(
    State(repository): State<Arc<R>>,
) -> Result<Json<Vec<Attribute>>, ApiError> {
    Ok(Json(repository.list_attributes().await?))
}

async fn create_attribute<R: Repository>(
    State(repository): State<Arc<R>>,
    payload: Result<Json<NewAttribute>, JsonRejection>,
) -> Result<Json<Attribute>, ApiError> {
    let attribute = json_body(payload)?;
    Ok(Json(repository.create_attribute(&attribute).await?))
}

#[derive(Debug, Default, Deserialize)]
struct BuildsQuery {
    filter: Option<String>,
}

async fn list_builds<R: Repository>(
    State(repository): State<Arc<R>>,
    Query(query): Query<BuildsQuery>,
) -> Result<Json<Vec<Build>>, ApiError> {
    let predicate = match query.filter.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => compile(&deserialize(token)?)?,
        None => Predicate::MatchAll,
    };
    debug!(%predicate, "listing builds");

    Ok(Json(repository.list_builds(&predicate).await?))
}

#[derive(Debug, Deserialize)]
struct CreateBuildRequest {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    attributes: serde_json::Value,
}

async fn create_build<R: Repository>(
    State(repository): State<Arc<R>>,
    payload: Result<Json<CreateBuildRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Build>), ApiError> {
    let request = json_body(payload)?;
    let name = request
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing_fields", r#""name" and "attributes" are required."#))?;
    if !request.attributes.is_array() {
        return Err(ApiError::bad_request(
            "missing_fields",
            r#""name" and "attributes" are required."#,
        ));
    }
    let attributes: Vec<NewBuildAttribute> = serde_json::from_value(request.attributes)
        .map_err(|error| ApiError::bad_request("invalid_attributes", error.to_string()))?;

    let table = repository.attribute_table().await?;
    for value in &attributes {
        table.check_value(&value.attribute_id, &value.value)?;
    }

    let build = repository
        .create_build(&NewBuild {
            name,
            description: request.description.unwrap_or_default(),
            attributes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(build)))
}

async fn list_filters<R: Repository>(
    State(repository): State<Arc<R>>,
) -> Result<Json<Vec<SavedFilter>>, ApiError> {
    Ok(Json(repository.list_filters().await?))
}

#[derive(Debug, Deserialize)]
struct CreateFilterRequest {
    name: Option<String>,
    filter: Option<FilterTemplate>,
}

async fn create_filter<R: Repository>(
    State(repository): State<Arc<R>>,
    payload: Result<Json<CreateFilterRequest>, JsonRejection>,
) -> Result<Json<SavedFilter>, ApiError> {
    let request = json_body(payload)?;
    let name = request
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing_fields", r#""name" is required."#))?;
    let template = request
        .filter
        .ok_or_else(|| ApiError::bad_request("missing_fields", r#""filter" is required."#))?;

    // Nodes are reported by their preorder position, e.g. `node-2`.
    let tree = template.instantiate(&mut SequentialIds::new());
    repository.attribute_table().await?.validate_tree(&tree)?;

    Ok(Json(repository.create_filter(&name, &strip_ids(&tree)).await?))
}
