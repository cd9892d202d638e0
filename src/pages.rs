//! Template environment and render helpers. Handlers build a context and
//! hand it over; everything visual lives in `templates/`.

use actix_session::Session;
use actix_web::http::header;
use actix_web::HttpResponse;
use tera::{Context, Tera};

use crate::auth::Identity;
use crate::error::Error;
use crate::flash;

/// Parse all templates once at startup; the instance is cloned into each
/// worker via `web::Data`.
pub fn templates() -> Result<Tera, tera::Error> {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html"))
}

/// Base context for any page: the caller (when authenticated) and the
/// pending one-shot notifications, which this drains.
pub fn context_for(identity: &Identity, session: &Session) -> Context {
    let mut ctx = Context::new();
    if let Some(user) = identity.user() {
        ctx.insert("user", user);
    }
    ctx.insert("messages", &flash::take(session));
    ctx
}

pub fn render(tmpl: &Tera, name: &str, ctx: &Context) -> Result<HttpResponse, Error> {
    let body = tmpl.render(name, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// The denial page for anonymous callers on a protected route. Deliberately
/// a plain 200 render, not a redirect or a 403.
pub fn forbidden(tmpl: &Tera, identity: &Identity, session: &Session) -> Result<HttpResponse, Error> {
    render(tmpl, "forbidden.html", &context_for(identity, session))
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}
