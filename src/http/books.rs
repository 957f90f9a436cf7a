use crate::http::AppState;
use crate::http::authors::{AuthorResponse, page_params};
use crate::http::handler::{ApiError, ApiJson, ApiQuery, ApiSuccess, ExistsResponse, PageResponse};
use crate::models::book::{
    AddBookAuthorError, Book, BookExistsError, BookFilter, BookTitle, BookTitleEmptyError,
    CreateBookError, CreateBookRequest, DeleteBookError, EmptyAuthorSetError, FindBookError,
    ListBooksError, ListBooksQuery, NegativePriceError, ParsePublicationStatusError, Price,
    PublicationStatus, RemoveBookAuthorError, UpdateBookError, UpdateBookRequest,
    UpdatePublicationStatusError,
};
use crate::repositories::{AuthorRepository, BookRepository};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookBody {
    title: String,
    price: Decimal,
    #[serde(default)]
    publication_status: PublicationStatus,
    author_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookBody {
    title: String,
    price: Decimal,
    author_ids: Vec<i64>,
}

#[derive(Error, Debug)]
pub enum ParseBookBodyError {
    #[error(transparent)]
    Title(#[from] BookTitleEmptyError),
    #[error(transparent)]
    Price(#[from] NegativePriceError),
    #[error(transparent)]
    Authors(#[from] EmptyAuthorSetError),
}

impl From<ParseBookBodyError> for ApiError {
    fn from(err: ParseBookBodyError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl TryFrom<CreateBookBody> for CreateBookRequest {
    type Error = ParseBookBodyError;

    fn try_from(value: CreateBookBody) -> Result<Self, Self::Error> {
        let title = BookTitle::new(&value.title)?;
        let price = Price::new(value.price)?;
        let req = Self::new(title, price, value.publication_status, value.author_ids)?;
        Ok(req)
    }
}

impl TryFrom<(i64, UpdateBookBody)> for UpdateBookRequest {
    type Error = ParseBookBodyError;

    fn try_from((id, value): (i64, UpdateBookBody)) -> Result<Self, Self::Error> {
        let title = BookTitle::new(&value.title)?;
        let price = Price::new(value.price)?;
        let req = Self::new(id, title, price, value.author_ids)?;
        Ok(req)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    id: i64,
    title: String,
    price: Decimal,
    publication_status: PublicationStatus,
    is_published: bool,
    authors: Vec<AuthorResponse>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id(),
            title: book.title().to_string(),
            price: book.price().value(),
            publication_status: book.publication_status(),
            is_published: book.publication_status().is_published(),
            authors: book.authors().iter().map(AuthorResponse::from).collect(),
            created_at: book.created_at(),
            updated_at: book.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksParams {
    page: Option<i64>,
    size: Option<i64>,
    title: Option<String>,
    status: Option<String>,
    author_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageOnlyParams {
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PublicationStatusParams {
    status: String,
}

impl From<ParsePublicationStatusError> for ApiError {
    fn from(err: ParsePublicationStatusError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CreateBookError> for ApiError {
    fn from(err: CreateBookError) -> Self {
        match err {
            err @ CreateBookError::Duplicate { .. } => Self::Conflict(err.to_string()),
            err @ CreateBookError::AuthorNotFound { .. } => Self::NotFound(err.to_string()),
            CreateBookError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<FindBookError> for ApiError {
    fn from(err: FindBookError) -> Self {
        match err {
            err @ FindBookError::NotFound { .. } => Self::NotFound(err.to_string()),
            FindBookError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<ListBooksError> for ApiError {
    fn from(err: ListBooksError) -> Self {
        Self::Internal(err.0)
    }
}

impl From<UpdateBookError> for ApiError {
    fn from(err: UpdateBookError) -> Self {
        match err {
            err @ UpdateBookError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ UpdateBookError::AuthorNotFound { .. } => Self::NotFound(err.to_string()),
            err @ UpdateBookError::Duplicate { .. } => Self::Conflict(err.to_string()),
            UpdateBookError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<DeleteBookError> for ApiError {
    fn from(err: DeleteBookError) -> Self {
        match err {
            err @ DeleteBookError::NotFound { .. } => Self::NotFound(err.to_string()),
            DeleteBookError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<BookExistsError> for ApiError {
    fn from(err: BookExistsError) -> Self {
        Self::Internal(err.0)
    }
}

impl From<UpdatePublicationStatusError> for ApiError {
    fn from(err: UpdatePublicationStatusError) -> Self {
        match err {
            err @ UpdatePublicationStatusError::NotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            err @ UpdatePublicationStatusError::IllegalTransition(_) => {
                Self::InvalidState(err.to_string())
            }
            UpdatePublicationStatusError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<AddBookAuthorError> for ApiError {
    fn from(err: AddBookAuthorError) -> Self {
        match err {
            err @ AddBookAuthorError::BookNotFound { .. } => Self::NotFound(err.to_string()),
            err @ AddBookAuthorError::AuthorNotFound { .. } => Self::NotFound(err.to_string()),
            err @ AddBookAuthorError::AlreadyAssociated(_) => {
                Self::InvalidArgument(err.to_string())
            }
            AddBookAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

impl From<RemoveBookAuthorError> for ApiError {
    fn from(err: RemoveBookAuthorError) -> Self {
        match err {
            err @ RemoveBookAuthorError::BookNotFound { .. } => Self::NotFound(err.to_string()),
            err @ RemoveBookAuthorError::NotAssociated { .. } => {
                Self::InvalidArgument(err.to_string())
            }
            err @ RemoveBookAuthorError::LastAuthor { .. } => Self::InvalidState(err.to_string()),
            RemoveBookAuthorError::Other(cause) => Self::Internal(cause),
        }
    }
}

pub async fn create_book<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiJson(body): ApiJson<CreateBookBody>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    let req = body.try_into()?;
    state
        .book_repo
        .create_book(&req)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::CREATED, BookResponse::from(&book)))
}

pub async fn find_book<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    state
        .book_repo
        .find_book(id)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::OK, BookResponse::from(&book)))
}

async fn list_books_page<AR: AuthorRepository, BR: BookRepository>(
    state: &AppState<AR, BR>,
    query: ListBooksQuery,
) -> Result<ApiSuccess<PageResponse<BookResponse>>, ApiError> {
    state
        .book_repo
        .list_books(&query)
        .await
        .map_err(ApiError::from)
        .map(|page| {
            let page = page.map(|book| BookResponse::from(&book));
            ApiSuccess::new(StatusCode::OK, PageResponse::from(page))
        })
}

pub async fn list_books<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiQuery(params): ApiQuery<ListBooksParams>,
) -> Result<ApiSuccess<PageResponse<BookResponse>>, ApiError> {
    let page = page_params(params.page, params.size)?;

    // Filters are mutually exclusive: title wins over status, status over author.
    let filter = if let Some(title) = params.title {
        BookFilter::Title(title)
    } else if let Some(status) = params.status {
        BookFilter::Status(status.parse()?)
    } else if let Some(author_id) = params.author_id {
        BookFilter::Author(author_id)
    } else {
        BookFilter::None
    };

    list_books_page(&state, ListBooksQuery::new(page, filter)).await
}

pub async fn list_published_books<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiQuery(params): ApiQuery<PageOnlyParams>,
) -> Result<ApiSuccess<PageResponse<BookResponse>>, ApiError> {
    let page = page_params(params.page, params.size)?;
    let query = ListBooksQuery::new(page, BookFilter::Status(PublicationStatus::Published));
    list_books_page(&state, query).await
}

pub async fn list_unpublished_books<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    ApiQuery(params): ApiQuery<PageOnlyParams>,
) -> Result<ApiSuccess<PageResponse<BookResponse>>, ApiError> {
    let page = page_params(params.page, params.size)?;
    let query = ListBooksQuery::new(page, BookFilter::Status(PublicationStatus::Unpublished));
    list_books_page(&state, query).await
}

pub async fn update_book<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UpdateBookBody>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    let req = (id, body).try_into()?;
    state
        .book_repo
        .update_book(&req)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::OK, BookResponse::from(&book)))
}

pub async fn delete_book<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.book_repo.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn book_exists<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
) -> Result<ApiSuccess<ExistsResponse>, ApiError> {
    let exists = state.book_repo.book_exists(id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, ExistsResponse { exists }))
}

pub async fn update_publication_status<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path(id): Path<i64>,
    ApiQuery(params): ApiQuery<PublicationStatusParams>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    let status: PublicationStatus = params.status.parse()?;
    state
        .book_repo
        .update_publication_status(id, status)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::OK, BookResponse::from(&book)))
}

pub async fn add_book_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path((id, author_id)): Path<(i64, i64)>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    state
        .book_repo
        .add_book_author(id, author_id)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::OK, BookResponse::from(&book)))
}

pub async fn remove_book_author<AR: AuthorRepository, BR: BookRepository>(
    State(state): State<AppState<AR, BR>>,
    Path((id, author_id)): Path<(i64, i64)>,
) -> Result<ApiSuccess<BookResponse>, ApiError> {
    state
        .book_repo
        .remove_book_author(id, author_id)
        .await
        .map_err(ApiError::from)
        .map(|book| ApiSuccess::new(StatusCode::OK, BookResponse::from(&book)))
}
