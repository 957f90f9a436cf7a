use book_catalog::config::Config;
use book_catalog::database::{self, SqliteAuthorRepository, SqliteBookRepository};
use book_catalog::http::{AppState, HttpServer, HttpServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let config = Config::from_env()?;
    let pool = database::establish_pool(config.database_url()).await?;

    let state = AppState::new(
        SqliteAuthorRepository::new(pool.clone()),
        SqliteBookRepository::new(pool),
    );
    let server_config = HttpServerConfig::new(config.server_port());
    let http_server = HttpServer::new(state, server_config).await?;
    http_server.run().await
}
