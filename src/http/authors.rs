use crate::http::AppState;
use crate::http::handler::{ApiError, ApiJson, ApiQuery, ApiSuccess, ExistsResponse, PageResponse};
use crate::models::author::{
    Author, AuthorExistsError, AuthorName, AuthorNameEmptyError, BirthDate, BirthDateError,
    CreateAuthorError, CreateAuthorRequest, DeleteAuthorError, FindAuthorError, ListAuthorsError,
    ListAuthorsQuery, UpdateAuthorError, UpdateAuthorRequest,
};
use crate::models::page::{DEFAULT_PAGE_SIZE, PageParams};
use crate::repositories::{AuthorRepository, BookRepository};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorBody {
    name: String,
    birth_date: NaiveDate,
}

#[derive(Error, Debug)]
pub enum ParseAuthorBodyError {
    #[error(transparent)]
    Name(#[from] AuthorNameEmptyError),
    #[error(transparent)]
    BirthDate(#[from] BirthDateError),
}

impl From<ParseAuthorBodyError> for ApiError {
    fn from(err: ParseAuthorBodyError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl TryFrom<AuthorBody> for CreateAuthorRequest {
    type Error = ParseAuthorBodyError;

    fn try_from(value: AuthorBody) -> Result<Self, Self::Error> {
        let name = AuthorName::new(&value.name)?;
        let birth_date = BirthDate::new(value.birth_date)?;
        Ok(Self::new(name, birth_date))
    }
}

impl TryFrom<(i64, AuthorBody)> for UpdateAuthorRequest {
    type Error = ParseAuthorBodyError;

    fn try_from((id, value): (i64, AuthorBody)) -> Result<Self, Self::Error> {
        let name = AuthorName::new(&value.name)?;
        let birth_date = BirthDate::new(value.birth_date)?;
        Ok(Self::new(id, name, birth_date))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    id: i64,
    name: String,
    birth_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Author> for AuthorResponse {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id(),
            name: author.name().to_string(),
            birth_date: author.birth_date().date(),
            created_at: author.created_at(),
            updated_at: author.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAuthorsParams {
    page: Option<i64>,
    size: Option<i64>,
    name: Option<String>,
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        match err {
            err @ CreateAuthorError::Duplicate { .. } => Self::Conflict(err.to_string()),
            CreateAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<FindAuthorError> for ApiError {
    fn from(err: FindAuthorError) -> Self {
        match err {
            err @ FindAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            FindAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<ListAuthorsError> for ApiError {
    fn from(err: ListAuthorsError) -> Self {
        Self::Internal(err.0)
    }
}

impl From<UpdateAuthorError> for ApiError {
    fn from(err: UpdateAuthorError) -> Self {
        match err {
            err @ UpdateAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ UpdateAuthorError::Duplicate { .. } => Self::Conflict(err.to_string()),
            UpdateAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<DeleteAuthorError> for ApiError {
    fn from(err: DeleteAuthorError) -> Self {
        match err {
            err @ DeleteAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ DeleteAuthorError::SoleAuthor { .. } => Self::InvalidState(err.to_string()),
            DeleteAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<AuthorExistsError> for ApiError {
    fn from(err: AuthorExistsError) -> Self {
        Self::Internal(err.0)
    }
}

pub(crate) fn page_params(page: Option<i64>, size: Option<i64>) -> Result<PageParams, ApiError> {
    PageParams::new(page.unwrap_or(0), size.unwrap_or(DEFAULT_PAGE_SIZE))
        .map_err(|err| ApiError::InvalidArgument(err.to_string()))
}

pub async fn create_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiJson(body): ApiJson<AuthorBody>,
) -> Result<ApiSuccess<AuthorResponse>, ApiError> {
    let req = body.try_into()?;
    state
        .author_repo
        .create_author(&req)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::CREATED, AuthorResponse::from(&author)))
}

pub async fn find_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<AuthorResponse>, ApiError> {
    state
        .author_repo
        .find_author(id)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, AuthorResponse::from(&author)))
}

pub async fn list_authors<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiQuery(params): ApiQuery<ListAuthorsParams>,
) -> Result<ApiSuccess<PageResponse<AuthorResponse>>, ApiError> {
    let page = page_params(params.page, params.size)?;
    let query = ListAuthorsQuery::new(page, params.name);
    state
        .author_repo
        .list_authors(&query)
        .await
        .map_err(ApiError::from)
        .map(|page| {
            let page = page.map(|author| AuthorResponse::from(&author));
            ApiSuccess::new(StatusCode::OK, PageResponse::from(page))
        })
}

pub async fn update_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<AuthorBody>,
) -> Result<ApiSuccess<AuthorResponse>, ApiError> {
    let req = (id, body).try_into()?;
    state
        .author_repo
        .update_author(&req)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, AuthorResponse::from(&author)))
}

pub async fn delete_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.author_repo.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn author_exists<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<ExistsResponse>, ApiError> {
    let exists = state.author_repo.author_exists(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, ExistsResponse { exists }))
}
