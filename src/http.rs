pub mod authors;
pub mod books;
pub mod handler;

use crate::repositories::{AuthorRepository, BookRepository};
use anyhow::Context;
use axum::Router;
use axum::routing::{get, patch, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Debug)]
pub struct AppState<AR, BR> {
    pub author_repo: Arc<AR>,
    pub book_repo: Arc<BR>,
}

impl<AR, BR> Clone for AppState<AR, BR> {
    fn clone(&self) -> Self {
        Self {
            author_repo: Arc::clone(&self.author_repo),
            book_repo: Arc::clone(&self.book_repo),
        }
    }
}

impl<AR, BR> AppState<AR, BR>
where
    AR: AuthorRepository,
    BR: BookRepository,
{
    pub fn new(author_repo: AR, book_repo: BR) -> Self {
        Self {
            author_repo: Arc::new(author_repo),
            book_repo: Arc::new(book_repo),
        }
    }
}

#[derive(Debug)]
pub struct HttpServerConfig {
    port: u16,
}

impl HttpServerConfig {
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self { port }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<AR, BR>(
        state: AppState<AR, BR>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self>
    where
        AR: AuthorRepository,
        BR: BookRepository,
    {
        let router = router(state);

        let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("Failed to bind to port {}", config.port))?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router)
            .await
            .context("Received error from running server")?;
        Ok(())
    }
}

pub fn router<AR, BR>(state: AppState<AR, BR>) -> Router
where
    AR: AuthorRepository,
    BR: BookRepository,
{
    Router::new()
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes<AR, BR>() -> Router<AppState<AR, BR>>
where
    AR: AuthorRepository,
    BR: BookRepository,
{
    Router::new()
        .route(
            "/authors",
            get(authors::list_authors::<AR, BR>).post(authors::create_author::<AR, BR>),
        )
        .route(
            "/authors/{id}",
            get(authors::find_author::<AR, BR>)
                .put(authors::update_author::<AR, BR>)
                .delete(authors::delete_author::<AR, BR>),
        )
        .route("/authors/{id}/exists", get(authors::author_exists::<AR, BR>))
        .route(
            "/books",
            get(books::list_books::<AR, BR>).post(books::create_book::<AR, BR>),
        )
        .route("/books/published", get(books::list_published_books::<AR, BR>))
        .route(
            "/books/unpublished",
            get(books::list_unpublished_books::<AR, BR>),
        )
        .route(
            "/books/{id}",
            get(books::find_book::<AR, BR>)
                .put(books::update_book::<AR, BR>)
                .delete(books::delete_book::<AR, BR>),
        )
        .route("/books/{id}/exists", get(books::book_exists::<AR, BR>))
        .route(
            "/books/{id}/publication-status",
            patch(books::update_publication_status::<AR, BR>),
        )
        .route(
            "/books/{id}/authors/{author_id}",
            post(books::add_book_author::<AR, BR>).delete(books::remove_book_author::<AR, BR>),
        )
}
