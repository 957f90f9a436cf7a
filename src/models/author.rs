use crate::models::page::PageParams;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(raw: &str) -> Result<Self, AuthorNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(AuthorNameEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for AuthorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("Author name cannot be empty")]
pub struct AuthorNameEmptyError;

/// A date of birth, always strictly in the past. Today's date is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate(NaiveDate);

impl BirthDate {
    pub fn new(date: NaiveDate) -> Result<Self, BirthDateError> {
        let today = Utc::now().date_naive();
        if date < today {
            Ok(Self(date))
        } else {
            Err(BirthDateError { date })
        }
    }

    pub const fn new_unchecked(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for BirthDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug)]
#[error("Birth date {date} must be strictly before today")]
pub struct BirthDateError {
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Author {
    id: i64,
    name: AuthorName,
    birth_date: BirthDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Author {
    pub const fn new(
        id: i64,
        name: AuthorName,
        birth_date: BirthDate,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            birth_date,
            created_at,
            updated_at,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }

    pub const fn birth_date(&self) -> BirthDate {
        self.birth_date
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug)]
pub struct CreateAuthorRequest {
    name: AuthorName,
    birth_date: BirthDate,
}

impl CreateAuthorRequest {
    pub const fn new(name: AuthorName, birth_date: BirthDate) -> Self {
        Self { name, birth_date }
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }

    pub const fn birth_date(&self) -> BirthDate {
        self.birth_date
    }
}

#[derive(Debug)]
pub struct UpdateAuthorRequest {
    id: i64,
    name: AuthorName,
    birth_date: BirthDate,
}

impl UpdateAuthorRequest {
    pub const fn new(id: i64, name: AuthorName, birth_date: BirthDate) -> Self {
        Self {
            id,
            name,
            birth_date,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }

    pub const fn birth_date(&self) -> BirthDate {
        self.birth_date
    }
}

#[derive(Debug)]
pub struct ListAuthorsQuery {
    page: PageParams,
    name: Option<String>,
}

impl ListAuthorsQuery {
    pub const fn new(page: PageParams, name: Option<String>) -> Self {
        Self { page, name }
    }

    pub const fn page(&self) -> PageParams {
        self.page
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[derive(Error, Debug)]
pub enum CreateAuthorError {
    #[error("Author with name \"{name}\" already exists")]
    Duplicate { name: String },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum FindAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct ListAuthorsError(#[from] pub anyhow::Error);

#[derive(Error, Debug)]
pub enum UpdateAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error("Author with name \"{name}\" already exists")]
    Duplicate { name: String },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum DeleteAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: i64 },
    #[error("Author with id \"{id}\" is the sole author of book \"{book_id}\" and cannot be deleted")]
    SoleAuthor { id: i64, book_id: i64 },
    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct AuthorExistsError(#[from] pub anyhow::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_name_rejects_blank_input() {
        assert!(AuthorName::new("").is_err());
        assert!(AuthorName::new("   ").is_err());
        assert!(AuthorName::new("\t\n").is_err());
    }

    #[test]
    fn author_name_trims_surrounding_whitespace() {
        let name = AuthorName::new("  Soseki  ").unwrap();
        assert_eq!(name.to_string(), "Soseki");
    }

    #[test]
    fn birth_date_accepts_past_dates() {
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let birth_date = BirthDate::new(yesterday).unwrap();
        assert_eq!(birth_date.date(), yesterday);
    }

    #[test]
    fn birth_date_rejects_today() {
        let today = Utc::now().date_naive();
        assert!(BirthDate::new(today).is_err());
    }

    #[test]
    fn birth_date_rejects_future_dates() {
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        assert!(BirthDate::new(tomorrow).is_err());
    }
}
