use crate::database::is_unique_violation;
use crate::models::author::Author;
use crate::models::book::{
    AddBookAuthorError, Book, BookExistsError, BookFilter, BookTitle, CreateBookError,
    CreateBookRequest, DeleteBookError, FindBookError, ListBooksError, ListBooksQuery, Price,
    PublicationStatus, RemoveAuthorError, RemoveBookAuthorError, UpdateBookError,
    UpdateBookRequest, UpdatePublicationStatusError,
};
use crate::models::page::Page;
use crate::repositories::BookRepository;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Raw row from the books table; authors are attached separately.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    price: String,
    publication_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookRow {
    fn into_book(self, authors: Vec<Author>) -> anyhow::Result<Book> {
        let price = Decimal::from_str(&self.price).with_context(|| {
            format!(r#"Invalid price "{}" stored for book {}"#, self.price, self.id)
        })?;
        let status = self.publication_status.parse::<PublicationStatus>().with_context(|| {
            format!(
                r#"Invalid publication status "{}" stored for book {}"#,
                self.publication_status, self.id
            )
        })?;

        Ok(Book::new(
            self.id,
            BookTitle::new_unchecked(&self.title),
            Price::new_unchecked(price),
            status,
            authors,
            self.created_at,
            self.updated_at,
        ))
    }
}

#[derive(Error, Debug)]
enum AuthorLookupError {
    #[error("Author with id \"{0}\" does not exist")]
    Missing(i64),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

async fn load_authors_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<Vec<Author>, AuthorLookupError> {
    let mut authors = Vec::with_capacity(ids.len());
    for &id in ids {
        let author: Option<Author> = sqlx::query_as("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        match author {
            Some(author) => authors.push(author),
            None => return Err(AuthorLookupError::Missing(id)),
        }
    }
    authors.sort_by_key(Author::id);
    Ok(authors)
}

async fn load_book_authors(
    conn: &mut SqliteConnection,
    book_id: i64,
) -> Result<Vec<Author>, sqlx::Error> {
    sqlx::query_as(
        "SELECT a.* FROM authors a \
         JOIN book_authors ba ON ba.author_id = a.id \
         WHERE ba.book_id = ? ORDER BY a.id",
    )
    .bind(book_id)
    .fetch_all(&mut *conn)
    .await
}

async fn fetch_book_row(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<BookRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn load_book(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<Option<Book>> {
    let Some(row) = fetch_book_row(conn, id).await? else {
        return Ok(None);
    };
    let authors = load_book_authors(conn, id).await?;
    Ok(Some(row.into_book(authors)?))
}

async fn replace_book_authors(
    conn: &mut SqliteConnection,
    book_id: i64,
    authors: &[Author],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    for author in authors {
        sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(author.id())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CreateBookError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(CreateBookError::Other)?;

        let authors = load_authors_by_ids(&mut tx, req.author_ids())
            .await
            .map_err(|err| match err {
                AuthorLookupError::Missing(id) => CreateBookError::AuthorNotFound { id },
                AuthorLookupError::Database(err) => CreateBookError::Other(
                    anyhow!(err).context("Failed to resolve authors for new book"),
                ),
            })?;

        let now = Utc::now();
        let row: BookRow = sqlx::query_as(
            "INSERT INTO books (title, price, publication_status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(req.title().to_string())
        .bind(req.price().to_string())
        .bind(req.status().as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                CreateBookError::Duplicate {
                    title: req.title().to_string(),
                }
            } else {
                let err = anyhow!(err).context(format!(
                    r#"Failed to create book with title "{}""#,
                    req.title()
                ));
                CreateBookError::Other(err)
            }
        })?;

        for author in &authors {
            sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?, ?)")
                .bind(row.id)
                .bind(author.id())
                .execute(&mut *tx)
                .await
                .map_err(|err| {
                    let err = anyhow!(err)
                        .context(format!("Failed to associate author with book {}", row.id));
                    CreateBookError::Other(err)
                })?;
        }

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(CreateBookError::Other)?;

        row.into_book(authors).map_err(CreateBookError::Other)
    }

    async fn find_book(&self, id: i64) -> Result<Book, FindBookError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")
            .map_err(FindBookError::Other)?;

        let book = load_book(&mut conn, id)
            .await
            .map_err(|err| {
                FindBookError::Other(
                    err.context(format!(r#"Failed to retrieve book with id "{id}""#)),
                )
            })?;

        book.ok_or(FindBookError::NotFound { id })
    }

    async fn list_books(&self, query: &ListBooksQuery) -> Result<Page<Book>, ListBooksError> {
        let page = query.page();
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;

        // Filtered listings order by title, unfiltered by id, so that
        // pagination stays deterministic across calls.
        let (total, rows): (i64, Vec<BookRow>) = match query.filter() {
            BookFilter::Title(title) => {
                let pattern = format!("%{title}%");
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title LIKE ?")
                    .bind(&pattern)
                    .fetch_one(&mut *conn)
                    .await
                    .context("Failed to count books")?;
                let rows = sqlx::query_as(
                    "SELECT * FROM books WHERE title LIKE ? ORDER BY title LIMIT ? OFFSET ?",
                )
                .bind(&pattern)
                .bind(page.size())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await
                .context("Failed to retrieve books")?;
                (total, rows)
            }
            BookFilter::Status(status) => {
                let total = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM books WHERE publication_status = ?",
                )
                .bind(status.as_str())
                .fetch_one(&mut *conn)
                .await
                .context("Failed to count books")?;
                let rows = sqlx::query_as(
                    "SELECT * FROM books WHERE publication_status = ? \
                     ORDER BY title LIMIT ? OFFSET ?",
                )
                .bind(status.as_str())
                .bind(page.size())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await
                .context("Failed to retrieve books")?;
                (total, rows)
            }
            BookFilter::Author(author_id) => {
                let total = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM books b \
                     JOIN book_authors ba ON ba.book_id = b.id WHERE ba.author_id = ?",
                )
                .bind(author_id)
                .fetch_one(&mut *conn)
                .await
                .context("Failed to count books")?;
                let rows = sqlx::query_as(
                    "SELECT b.* FROM books b \
                     JOIN book_authors ba ON ba.book_id = b.id WHERE ba.author_id = ? \
                     ORDER BY b.title LIMIT ? OFFSET ?",
                )
                .bind(author_id)
                .bind(page.size())
                .bind(page.offset())
                .fetch_all(&mut *conn)
                .await
                .context("Failed to retrieve books")?;
                (total, rows)
            }
            BookFilter::None => {
                let total = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                    .fetch_one(&mut *conn)
                    .await
                    .context("Failed to count books")?;
                let rows =
                    sqlx::query_as("SELECT * FROM books ORDER BY id LIMIT ? OFFSET ?")
                        .bind(page.size())
                        .bind(page.offset())
                        .fetch_all(&mut *conn)
                        .await
                        .context("Failed to retrieve books")?;
                (total, rows)
            }
        };

        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            let authors = load_book_authors(&mut conn, row.id)
                .await
                .with_context(|| format!("Failed to retrieve authors of book {}", row.id))?;
            books.push(row.into_book(authors)?);
        }

        Ok(Page::new(books, page, total))
    }

    async fn update_book(&self, req: &UpdateBookRequest) -> Result<Book, UpdateBookError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(UpdateBookError::Other)?;

        let mut book = load_book(&mut tx, req.id())
            .await
            .map_err(|err| {
                UpdateBookError::Other(
                    err.context(format!(r#"Failed to retrieve book with id "{}""#, req.id())),
                )
            })?
            .ok_or(UpdateBookError::NotFound { id: req.id() })?;

        let authors = load_authors_by_ids(&mut tx, req.author_ids())
            .await
            .map_err(|err| match err {
                AuthorLookupError::Missing(id) => UpdateBookError::AuthorNotFound { id },
                AuthorLookupError::Database(err) => UpdateBookError::Other(
                    anyhow!(err).context("Failed to resolve authors for book update"),
                ),
            })?;

        book.update(req.title().clone(), req.price(), authors)
            .map_err(|err| UpdateBookError::Other(anyhow!(err)))?;

        sqlx::query("UPDATE books SET title = ?, price = ?, updated_at = ? WHERE id = ?")
            .bind(book.title().to_string())
            .bind(book.price().to_string())
            .bind(book.updated_at())
            .bind(book.id())
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UpdateBookError::Duplicate {
                        title: req.title().to_string(),
                    }
                } else {
                    let err = anyhow!(err)
                        .context(format!(r#"Failed to update book with id "{}""#, req.id()));
                    UpdateBookError::Other(err)
                }
            })?;

        replace_book_authors(&mut tx, book.id(), book.authors())
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!("Failed to replace authors of book {}", book.id()));
                UpdateBookError::Other(err)
            })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(UpdateBookError::Other)?;

        Ok(book)
    }

    async fn delete_book(&self, id: i64) -> Result<(), DeleteBookError> {
        // Association rows go with the book via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!(r#"Failed to delete book with id "{id}""#));
                DeleteBookError::Other(err)
            })?;

        if result.rows_affected() == 0 {
            return Err(DeleteBookError::NotFound { id });
        }

        Ok(())
    }

    async fn book_exists(&self, id: i64) -> Result<bool, BookExistsError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!(r#"Failed to check existence of book with id "{id}""#))?;

        Ok(exists)
    }

    async fn update_publication_status(
        &self,
        id: i64,
        status: PublicationStatus,
    ) -> Result<Book, UpdatePublicationStatusError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(UpdatePublicationStatusError::Other)?;

        let mut book = load_book(&mut tx, id)
            .await
            .map_err(|err| {
                UpdatePublicationStatusError::Other(
                    err.context(format!(r#"Failed to retrieve book with id "{id}""#)),
                )
            })?
            .ok_or(UpdatePublicationStatusError::NotFound { id })?;

        book.update_publication_status(status)?;

        sqlx::query("UPDATE books SET publication_status = ?, updated_at = ? WHERE id = ?")
            .bind(book.publication_status().as_str())
            .bind(book.updated_at())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to update status of book with id "{id}""#));
                UpdatePublicationStatusError::Other(err)
            })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(UpdatePublicationStatusError::Other)?;

        Ok(book)
    }

    async fn add_book_author(
        &self,
        book_id: i64,
        author_id: i64,
    ) -> Result<Book, AddBookAuthorError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AddBookAuthorError::Other)?;

        let mut book = load_book(&mut tx, book_id)
            .await
            .map_err(|err| {
                AddBookAuthorError::Other(
                    err.context(format!(r#"Failed to retrieve book with id "{book_id}""#)),
                )
            })?
            .ok_or(AddBookAuthorError::BookNotFound { id: book_id })?;

        let author: Option<Author> = sqlx::query_as("SELECT * FROM authors WHERE id = ?")
            .bind(author_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!(r#"Failed to retrieve author with id "{author_id}""#));
                AddBookAuthorError::Other(err)
            })?;
        let author = author.ok_or(AddBookAuthorError::AuthorNotFound { id: author_id })?;

        book.add_author(author)?;

        sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!("Failed to associate author with book {book_id}"));
                AddBookAuthorError::Other(err)
            })?;

        sqlx::query("UPDATE books SET updated_at = ? WHERE id = ?")
            .bind(book.updated_at())
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!("Failed to touch book {book_id}"));
                AddBookAuthorError::Other(err)
            })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(AddBookAuthorError::Other)?;

        Ok(book)
    }

    async fn remove_book_author(
        &self,
        book_id: i64,
        author_id: i64,
    ) -> Result<Book, RemoveBookAuthorError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(RemoveBookAuthorError::Other)?;

        let mut book = load_book(&mut tx, book_id)
            .await
            .map_err(|err| {
                RemoveBookAuthorError::Other(
                    err.context(format!(r#"Failed to retrieve book with id "{book_id}""#)),
                )
            })?
            .ok_or(RemoveBookAuthorError::BookNotFound { id: book_id })?;

        book.remove_author(author_id).map_err(|err| match err {
            RemoveAuthorError::NotAssociated { id } => {
                RemoveBookAuthorError::NotAssociated { id, book_id }
            }
            RemoveAuthorError::LastAuthor => RemoveBookAuthorError::LastAuthor { book_id },
        })?;

        sqlx::query("DELETE FROM book_authors WHERE book_id = ? AND author_id = ?")
            .bind(book_id)
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err)
                    .context(format!("Failed to dissociate author from book {book_id}"));
                RemoveBookAuthorError::Other(err)
            })?;

        sqlx::query("UPDATE books SET updated_at = ? WHERE id = ?")
            .bind(book.updated_at())
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                let err = anyhow!(err).context(format!("Failed to touch book {book_id}"));
                RemoveBookAuthorError::Other(err)
            })?;

        tx.commit()
            .await
            .context("Failed to commit transaction")
            .map_err(RemoveBookAuthorError::Other)?;

        Ok(book)
    }
}
