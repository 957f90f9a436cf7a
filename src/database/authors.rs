use crate::database::is_unique_violation;
use crate::models::author::{
    Author, AuthorExistsError, AuthorName, BirthDate, CreateAuthorError, CreateAuthorRequest,
    DeleteAuthorError, FindAuthorError, ListAuthorsError, ListAuthorsQuery, UpdateAuthorError,
    UpdateAuthorRequest,
};
use crate::models::page::Page;
use crate::repositories::AuthorRepository;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

#[derive(Debug, Clone)]
pub struct SqliteAuthorRepository {
    pool: SqlitePool,
}

impl SqliteAuthorRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id = row.try_get("id")?;
        let name: &str = row.try_get("name")?;
        let birth_date: NaiveDate = row.try_get("birth_date")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Self::new(
            id,
            AuthorName::new_unchecked(name),
            BirthDate::new_unchecked(birth_date),
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl AuthorRepository for SqliteAuthorRepository {
    async fn create_author(&self, req: &CreateAuthorRequest) -> Result<Author, CreateAuthorError> {
        let now = Utc::now();
        let author = sqlx::query_as(
            "INSERT INTO authors (name, birth_date, created_at, updated_at) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(req.name().to_string())
        .bind(req.birth_date().date())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CreateAuthorError::Duplicate {
                    name: req.name().to_string(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create author with name "{}""#,
                    req.name()
                ));
                CreateAuthorError::Other(err)
            }
        })?;

        Ok(author)
    }

    async fn find_author(&self, id: i64) -> Result<Author, FindAuthorError> {
        let author = sqlx::query_as("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                let err =
                    anyhow!(err).context(format!(r#"Failed to retrieve author with id "{id}""#));
                FindAuthorError::Other(err)
            })?;

        author.ok_or(FindAuthorError::NotFound { id })
    }

    async fn list_authors(
        &self,
        query: &ListAuthorsQuery,
    ) -> Result<Page<Author>, ListAuthorsError> {
        let page = query.page();

        // Filtered listings order by name, unfiltered by id, so that
        // pagination stays deterministic across calls.
        let (total, authors) = match query.name() {
            Some(name) => {
                let pattern = format!("%{name}%");
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE name LIKE ?")
                        .bind(&pattern)
                        .fetch_one(&self.pool)
                        .await
                        .context("Failed to count authors")?;
                let authors = sqlx::query_as(
                    "SELECT * FROM authors WHERE name LIKE ? ORDER BY name LIMIT ? OFFSET ?",
                )
                .bind(&pattern)
                .bind(page.size())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .context("Failed to retrieve authors")?;
                (total, authors)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
                    .fetch_one(&self.pool)
                    .await
                    .context("Failed to count authors")?;
                let authors =
                    sqlx::query_as("SELECT * FROM authors ORDER BY id LIMIT ? OFFSET ?")
                        .bind(page.size())
                        .bind(page.offset())
                        .fetch_all(&self.pool)
                        .await
                        .context("Failed to retrieve authors")?;
                (total, authors)
            }
        };

        Ok(Page::new(authors, page, total))
    }

    async fn update_author(&self, req: &UpdateAuthorRequest) -> Result<Author, UpdateAuthorError> {
        let author: Option<Author> = sqlx::query_as(
            "UPDATE authors SET name = ?, birth_date = ?, updated_at = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(req.name().to_string())
        .bind(req.birth_date().date())
        .bind(Utc::now())
        .bind(req.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                UpdateAuthorError::Duplicate {
                    name: req.name().to_string(),
                }
            } else {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to update author with id "{}""#, req.id()));
                UpdateAuthorError::Other(err)
            }
        })?;

        author.ok_or(UpdateAuthorError::NotFound { id: req.id() })
    }

    async fn delete_author(&self, id: i64) -> Result<(), DeleteAuthorError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(DeleteAuthorError::Other)?;

        // Deleting an author must never leave a book without authors.
        let sole_authored_book: Option<i64> = sqlx::query_scalar(
            "SELECT ba.book_id FROM book_authors ba \
             WHERE ba.author_id = ? \
               AND (SELECT COUNT(*) FROM book_authors b2 WHERE b2.book_id = ba.book_id) = 1 \
             LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| {
            let err = anyhow!(err)
                .context(format!(r#"Failed to check books of author with id "{id}""#));
            DeleteAuthorError::Other(err)
        })?;

        if let Some(book_id) = sole_authored_book {
            return Err(DeleteAuthorError::SoleAuthor { id, book_id });
        }

        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err =
                    anyhow!(err).context(format!(r#"Failed to delete author with id "{id}""#));
                DeleteAuthorError::Other(err)
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteAuthorError::NotFound { id });
        }

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(DeleteAuthorError::Other)?;

        Ok(())
    }

    async fn author_exists(&self, id: i64) -> Result<bool, AuthorExistsError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM authors WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!(r#"Failed to check existence of author with id "{id}""#))?;

        Ok(exists)
    }
}
