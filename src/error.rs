use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Application error. Handlers propagate with `?`; anything that reaches
/// actix is turned into a page by the `ResponseError` impl below.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("password hashing error: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("session error: {0}")]
    Session(#[from] actix_session::SessionInsertError),
    #[error("blocking worker gone: {0}")]
    Canceled(#[from] actix_web::error::BlockingError),
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            other => Error::Database(other),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Error::NotFound => HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body("<!DOCTYPE html><html><body><h1>Not Found</h1></body></html>"),
            other => {
                log::error!("request failed: {other}");
                HttpResponse::InternalServerError()
                    .content_type("text/html; charset=utf-8")
                    .body("<!DOCTYPE html><html><body><h1>Internal Server Error</h1></body></html>")
            }
        }
    }
}
