//! Sign-up, login and logout.

use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use tera::Tera;

use crate::auth::Identity;
use crate::error::Error;
use crate::forms::{FieldErrors, LoginForm, SignupForm};
use crate::{actions, auth, flash, pages, DbPool};

const LOGIN_FAILED: &str = "Please enter a correct username and password. \
                            Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

fn signup_page(
    tmpl: &Tera,
    identity: &Identity,
    session: &Session,
    form: &SignupForm,
    errors: &FieldErrors,
) -> Result<HttpResponse, Error> {
    let mut ctx = pages::context_for(identity, session);
    ctx.insert("page_title", "New User");
    ctx.insert("form", &form.display());
    ctx.insert("errors", errors);
    pages::render(tmpl, "signup.html", &ctx)
}

#[get("/signup")]
pub async fn signup_form(
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
) -> Result<HttpResponse, Error> {
    signup_page(
        &tmpl,
        &identity,
        &session,
        &SignupForm {
            username: String::new(),
            password: String::new(),
            password2: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
        },
        &FieldErrors::new(),
    )
}

#[post("/signup")]
pub async fn signup(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, Error> {
    if let Err(errors) = form.validate() {
        return signup_page(&tmpl, &identity, &session, &form, &errors);
    }

    let new_user = form.to_new_user(auth::hash_password(&form.password)?);
    let inserted = web::block(move || {
        let mut conn = pool.get()?;
        actions::insert_user(&mut conn, &new_user)
    })
    .await??;

    match inserted {
        Some(user) => {
            flash::push(&session, format!("User {} Added", user.username));
            Ok(pages::redirect("/login"))
        }
        None => {
            let errors = FieldErrors::from([("username", USERNAME_TAKEN.to_owned())]);
            signup_page(&tmpl, &identity, &session, &form, &errors)
        }
    }
}

fn login_page(
    tmpl: &Tera,
    identity: &Identity,
    session: &Session,
    username: &str,
    error: Option<&str>,
) -> Result<HttpResponse, Error> {
    let mut ctx = pages::context_for(identity, session);
    ctx.insert("username", username);
    if let Some(message) = error {
        ctx.insert("error", message);
    }
    pages::render(tmpl, "login.html", &ctx)
}

#[get("/login")]
pub async fn login_form(
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
) -> Result<HttpResponse, Error> {
    login_page(&tmpl, &identity, &session, "", None)
}

#[post("/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    let credentials = form.into_inner();
    let uname = credentials.username.clone();

    let found = web::block(move || {
        let mut conn = pool.get()?;
        actions::find_user_by_username(&mut conn, &uname)
    })
    .await??;

    if let Some(user) = found {
        if auth::verify_password(&credentials.password, &user.password_hash)? {
            auth::log_in(&session, &user)?;
            log::info!("user {} logged in", user.username);
            return Ok(pages::redirect("/"));
        }
    }

    login_page(
        &tmpl,
        &identity,
        &session,
        &credentials.username,
        Some(LOGIN_FAILED),
    )
}

#[post("/logout")]
pub async fn logout(session: Session) -> HttpResponse {
    auth::log_out(&session);
    pages::redirect("/login")
}
