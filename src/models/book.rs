use crate::models::author::Author;
use crate::models::page::PageParams;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(raw: &str) -> Result<Self, BookTitleEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(BookTitleEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for BookTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("Book title cannot be empty")]
pub struct BookTitleEmptyError;

/// A non-negative decimal price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, NegativePriceError> {
        if value < Decimal::ZERO {
            Err(NegativePriceError { price: value })
        } else {
            Ok(Self(value))
        }
    }

    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug)]
#[error("Price must not be negative, got {price}")]
pub struct NegativePriceError {
    pub price: Decimal,
}

/// Two states, one irreversible edge: once published, a book stays published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublicationStatus {
    #[default]
    #[serde(alias = "Unpublished", alias = "unpublished")]
    Unpublished,
    #[serde(alias = "Published", alias = "published")]
    Published,
}

impl PublicationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpublished => "UNPUBLISHED",
            Self::Published => "PUBLISHED",
        }
    }

    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }

    pub const fn transition_to(
        self,
        next: Self,
    ) -> Result<Self, PublicationStatusTransitionError> {
        match (self, next) {
            (Self::Published, Self::Unpublished) => Err(PublicationStatusTransitionError {
                from: self,
                to: next,
            }),
            _ => Ok(next),
        }
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = ParsePublicationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unpublished" => Ok(Self::Unpublished),
            "published" => Ok(Self::Published),
            _ => Err(ParsePublicationStatusError(s.into())),
        }
    }
}

#[derive(Error, Debug)]
#[error("\"{0}\" is not a valid publication status")]
pub struct ParsePublicationStatusError(String);

#[derive(Error, Debug)]
#[error("Publication status cannot change from {from} to {to}")]
pub struct PublicationStatusTransitionError {
    pub from: PublicationStatus,
    pub to: PublicationStatus,
}

#[derive(Error, Debug)]
#[error("A book must have at least one author")]
pub struct EmptyAuthorSetError;

#[derive(Error, Debug)]
#[error("Author with id \"{id}\" is already associated with this book")]
pub struct AuthorAlreadyAssociatedError {
    pub id: i64,
}

#[derive(Error, Debug)]
pub enum RemoveAuthorError {
    #[error("Author with id \"{id}\" is not associated with this book")]
    NotAssociated { id: i64 },
    #[error("Cannot remove the last author of a book")]
    LastAuthor,
}

#[derive(Debug, Clone)]
pub struct Book {
    id: i64,
    title: BookTitle,
    price: Price,
    status: PublicationStatus,
    authors: Vec<Author>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    pub const fn new(
        id: i64,
        title: BookTitle,
        price: Price,
        status: PublicationStatus,
        authors: Vec<Author>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            price,
            status,
            authors,
            created_at,
            updated_at,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> &BookTitle {
        &self.title
    }

    pub const fn price(&self) -> Price {
        self.price
    }

    pub const fn publication_status(&self) -> PublicationStatus {
        self.status
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces title, price and the author set. Publication status is untouched.
    pub fn update(
        &mut self,
        title: BookTitle,
        price: Price,
        authors: Vec<Author>,
    ) -> Result<(), EmptyAuthorSetError> {
        if authors.is_empty() {
            return Err(EmptyAuthorSetError);
        }
        self.title = title;
        self.price = price;
        self.authors = authors;
        self.touch();
        Ok(())
    }

    pub fn update_publication_status(
        &mut self,
        next: PublicationStatus,
    ) -> Result<(), PublicationStatusTransitionError> {
        self.status = self.status.transition_to(next)?;
        self.touch();
        Ok(())
    }

    pub fn add_author(&mut self, author: Author) -> Result<(), AuthorAlreadyAssociatedError> {
        if self.authors.iter().any(|a| a.id() == author.id()) {
            return Err(AuthorAlreadyAssociatedError { id: author.id() });
        }
        self.authors.push(author);
        self.touch();
        Ok(())
    }

    pub fn remove_author(&mut self, author_id: i64) -> Result<(), RemoveAuthorError> {
        let Some(position) = self.authors.iter().position(|a| a.id() == author_id) else {
            return Err(RemoveAuthorError::NotAssociated { id: author_id });
        };
        if self.authors.len() == 1 {
            return Err(RemoveAuthorError::LastAuthor);
        }
        self.authors.remove(position);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug)]
pub struct CreateBookRequest {
    title: BookTitle,
    price: Price,
    status: PublicationStatus,
    author_ids: Vec<i64>,
}

impl CreateBookRequest {
    pub fn new(
        title: BookTitle,
        price: Price,
        status: PublicationStatus,
        author_ids: Vec<i64>,
    ) -> Result<Self, EmptyAuthorSetError> {
        if author_ids.is_empty() {
            return Err(EmptyAuthorSetError);
        }
        Ok(Self {
            title,
            price,
            status,
            author_ids,
        })
    }

    pub const fn title(&self) -> &BookTitle {
        &self.title
    }

    pub const fn price(&self) -> Price {
        self.price
    }

    pub const fn status(&self) -> PublicationStatus {
        self.status
    }

    pub fn author_ids(&self) -> &[i64] {
        &self.author_ids
    }
}

#[derive(Debug)]
pub struct UpdateBookRequest {
    id: i64,
    title: BookTitle,
    price: Price,
    author_ids: Vec<i64>,
}

impl UpdateBookRequest {
    pub fn new(
        id: i64,
        title: BookTitle,
        price: Price,
        author_ids: Vec<i64>,
    ) -> Result<Self, EmptyAuthorSetError> {
        if author_ids.is_empty() {
            return Err(EmptyAuthorSetError);
        }
        Ok(Self {
            id,
            title,
            price,
            author_ids,
        })
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn title(&self) -> &BookTitle {
        &self.title
    }

    pub const fn price(&self) -> Price {
        self.price
    }

    pub fn author_ids(&self) -> &[i64] {
        &self.author_ids
    }
}

/// List filters are mutually exclusive; the boundary resolves the
/// priority title > status > author before building one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Title(String),
    Status(PublicationStatus),
    Author(i64),
    None,
}

#[derive(Debug)]
pub struct ListBooksQuery {
    page: PageParams,
    filter: BookFilter,
}

impl ListBooksQuery {
    pub const fn new(page: PageParams, filter: BookFilter) -> Self {
        Self { page, filter }
    }

    pub const fn page(&self) -> PageParams {
        self.page
    }

    pub const fn filter(&self) -> &BookFilter {
        &self.filter
    }
}

#[derive(Error, Debug)]
pub enum CreateBookError {
    #[error("Book with title \"{title}\" already exists")]
    Duplicate { title: String },
    #[error("Author with id \"{id}\" does not exist")]
    AuthorNotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum FindBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ListBooksError(#[from] pub anyhow::Error);

#[derive(Error, Debug)]
pub enum UpdateBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error("Book with title \"{title}\" already exists")]
    Duplicate { title: String },
    #[error("Author with id \"{id}\" does not exist")]
    AuthorNotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum DeleteBookError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct BookExistsError(#[from] pub anyhow::Error);

#[derive(Error, Debug)]
pub enum UpdatePublicationStatusError {
    #[error("Book with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    IllegalTransition(#[from] PublicationStatusTransitionError),
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum AddBookAuthorError {
    #[error("Book with id \"{id}\" does not exist")]
    BookNotFound { id: i64 },
    #[error("Author with id \"{id}\" does not exist")]
    AuthorNotFound { id: i64 },
    #[error(transparent)]
    AlreadyAssociated(#[from] AuthorAlreadyAssociatedError),
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RemoveBookAuthorError {
    #[error("Book with id \"{id}\" does not exist")]
    BookNotFound { id: i64 },
    #[error("Author with id \"{id}\" is not associated with book \"{book_id}\"")]
    NotAssociated { id: i64, book_id: i64 },
    #[error("Cannot remove the last author of book \"{book_id}\"")]
    LastAuthor { book_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::author::{AuthorName, BirthDate};
    use chrono::NaiveDate;

    fn author(id: i64, name: &str) -> Author {
        let birth_date = BirthDate::new_unchecked(NaiveDate::from_ymd_opt(1867, 2, 9).unwrap());
        Author::new(
            id,
            AuthorName::new_unchecked(name),
            birth_date,
            Utc::now(),
            Utc::now(),
        )
    }

    fn book(status: PublicationStatus, authors: Vec<Author>) -> Book {
        Book::new(
            1,
            BookTitle::new_unchecked("Kokoro"),
            Price::new_unchecked(Decimal::new(150_000, 2)),
            status,
            authors,
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn book_title_rejects_blank_input() {
        assert!(BookTitle::new("").is_err());
        assert!(BookTitle::new("  \t").is_err());
    }

    #[test]
    fn price_rejects_negative_values() {
        assert!(Price::new(Decimal::new(-1, 2)).is_err());
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(Decimal::new(180_000, 2)).is_ok());
    }

    #[test]
    fn create_book_request_requires_at_least_one_author() {
        let result = CreateBookRequest::new(
            BookTitle::new_unchecked("Kokoro"),
            Price::new_unchecked(Decimal::ZERO),
            PublicationStatus::Unpublished,
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unpublished_book_can_be_published() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        book.update_publication_status(PublicationStatus::Published)
            .unwrap();
        assert!(book.publication_status().is_published());
    }

    #[test]
    fn publication_transitions_are_idempotent_within_a_state() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        book.update_publication_status(PublicationStatus::Unpublished)
            .unwrap();
        assert!(!book.publication_status().is_published());

        book.update_publication_status(PublicationStatus::Published)
            .unwrap();
        book.update_publication_status(PublicationStatus::Published)
            .unwrap();
        assert!(book.publication_status().is_published());
    }

    #[test]
    fn published_book_cannot_be_unpublished() {
        let mut book = book(PublicationStatus::Published, vec![author(1, "Soseki")]);
        let err = book
            .update_publication_status(PublicationStatus::Unpublished)
            .unwrap_err();
        assert_eq!(err.from, PublicationStatus::Published);
        assert_eq!(err.to, PublicationStatus::Unpublished);
        assert!(book.publication_status().is_published());
    }

    #[test]
    fn update_replaces_fields_but_not_status() {
        let mut book = book(PublicationStatus::Published, vec![author(1, "Soseki")]);
        book.update(
            BookTitle::new_unchecked("Botchan"),
            Price::new_unchecked(Decimal::new(90_000, 2)),
            vec![author(2, "Ogai")],
        )
        .unwrap();
        assert_eq!(book.title().to_string(), "Botchan");
        assert_eq!(book.authors().len(), 1);
        assert_eq!(book.authors()[0].id(), 2);
        assert!(book.publication_status().is_published());
    }

    #[test]
    fn update_rejects_empty_author_set() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        let result = book.update(
            BookTitle::new_unchecked("Botchan"),
            Price::new_unchecked(Decimal::ZERO),
            Vec::new(),
        );
        assert!(result.is_err());
        assert_eq!(book.authors().len(), 1);
    }

    #[test]
    fn adding_an_already_associated_author_fails() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        let err = book.add_author(author(1, "Soseki")).unwrap_err();
        assert_eq!(err.id, 1);
        assert_eq!(book.authors().len(), 1);
    }

    #[test]
    fn adding_a_new_author_grows_the_set() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        book.add_author(author(2, "Ogai")).unwrap();
        assert_eq!(book.authors().len(), 2);
    }

    #[test]
    fn removing_the_last_author_fails() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        let err = book.remove_author(1).unwrap_err();
        assert!(matches!(err, RemoveAuthorError::LastAuthor));
        assert_eq!(book.authors().len(), 1);
    }

    #[test]
    fn removing_an_unassociated_author_fails() {
        let mut book = book(PublicationStatus::Unpublished, vec![author(1, "Soseki")]);
        let err = book.remove_author(42).unwrap_err();
        assert!(matches!(err, RemoveAuthorError::NotAssociated { id: 42 }));
    }

    #[test]
    fn removing_one_of_several_authors_succeeds() {
        let mut book = book(
            PublicationStatus::Unpublished,
            vec![author(1, "Soseki"), author(2, "Ogai")],
        );
        book.remove_author(1).unwrap();
        assert_eq!(book.authors().len(), 1);
        assert_eq!(book.authors()[0].id(), 2);
    }

    #[test]
    fn publication_status_parses_case_insensitively() {
        assert_eq!(
            "Published".parse::<PublicationStatus>().unwrap(),
            PublicationStatus::Published
        );
        assert_eq!(
            "UNPUBLISHED".parse::<PublicationStatus>().unwrap(),
            PublicationStatus::Unpublished
        );
        assert!("archived".parse::<PublicationStatus>().is_err());
    }
}
