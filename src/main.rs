//! Multi-user to-do lists over Actix Web and Diesel.
//!
//! Diesel v2 is not an async library, so handlers execute queries in
//! `web::block` closures which offload blocking code (like Diesel's) to a
//! thread-pool in order to not block the server.

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::{middleware, web, App, HttpServer};
use diesel::prelude::*;
use diesel::r2d2;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

mod actions;
mod auth;
mod config;
mod error;
mod flash;
mod forms;
mod models;
mod pages;
mod passwords;
mod routes;
mod schema;
#[cfg(test)]
mod tests;

use config::Config;

/// Short-hand for the database pool type to use throughout the app.
pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    // initialize DB pool outside of `HttpServer::new` so that it is shared
    // across all workers
    let pool = initialize_db_pool(&config.database_url);
    run_migrations(&pool);

    let templates = pages::templates().expect("templates should parse");
    let cookie_key = config.cookie_key();

    log::info!("starting HTTP server at http://{}", config.bind_addr);

    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        App::new()
            // app state; enables `web::Data` extractors in handlers
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(templates.clone()))
            .app_data(web::Data::new(config.clone()))
            // session cookie carries the identity and the flash queue
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), cookie_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            // add request logger middleware
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}

/// Initialize database connection pool based on the configured database URL.
///
/// See more: <https://docs.rs/diesel/latest/diesel/r2d2/index.html>.
fn initialize_db_pool(database_url: &str) -> DbPool {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(database_url);
    r2d2::Pool::builder()
        .build(manager)
        .expect("database URL should be valid path to SQLite DB file")
}

fn run_migrations(pool: &DbPool) {
    let mut conn = pool
        .get()
        .expect("couldn't get db connection from pool");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("migrations should apply cleanly");
}
