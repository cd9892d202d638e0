//! Handlers for the list-of-lists pages: index, create, edit, delete.

use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use tera::Tera;

use crate::actions::{self, ListDeletion};
use crate::auth::Identity;
use crate::config::Config;
use crate::error::Error;
use crate::forms::ListForm;
use crate::models::List;
use crate::{flash, pages, DbPool};

/// The index: every list owned by the caller, in creation order.
#[get("/")]
pub async fn index(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;

    let list_of_lists = web::block(move || {
        let mut conn = pool.get()?;
        actions::find_lists_for_user(&mut conn, uid)
    })
    .await??;

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("list_of_lists", &list_of_lists);
    pages::render(&tmpl, "index.html", &ctx)
}

#[get("/lists/new")]
pub async fn new_list_form(
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
) -> Result<HttpResponse, Error> {
    if identity.user().is_none() {
        return pages::forbidden(&tmpl, &identity, &session);
    }

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("page_title", "New List");
    ctx.insert("form", &ListForm { name: String::new() }.display());
    ctx.insert("errors", &crate::forms::FieldErrors::new());
    ctx.insert("action", "/lists/new");
    pages::render(&tmpl, "list_form.html", &ctx)
}

#[post("/lists/new")]
pub async fn create_list(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    form: web::Form<ListForm>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;

    let name = match form.validate() {
        Ok(name) => name,
        Err(errors) => {
            let mut ctx = pages::context_for(&identity, &session);
            ctx.insert("page_title", "New List");
            ctx.insert("form", &form.display());
            ctx.insert("errors", &errors);
            ctx.insert("action", "/lists/new");
            return pages::render(&tmpl, "list_form.html", &ctx);
        }
    };

    let list = web::block(move || {
        let mut conn = pool.get()?;
        actions::insert_list(&mut conn, &name, uid)
    })
    .await??;

    flash::push(&session, format!("List {} created successfully", list.name));
    Ok(pages::redirect("/"))
}

/// Owner-scoped list lookup shared by the edit and delete handlers.
async fn load_list(pool: web::Data<DbPool>, lid: i32, uid: i32) -> Result<List, Error> {
    web::block(move || {
        let mut conn = pool.get()?;
        actions::find_list_for_user(&mut conn, lid, uid)
    })
    .await??
    .ok_or(Error::NotFound)
}

#[get("/lists/{id}/edit")]
pub async fn edit_list_form(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let list = load_list(pool, path.into_inner(), user.id).await?;

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("page_title", &format!("Edit List {}", list.name));
    ctx.insert("form", &ListForm { name: list.name.clone() }.display());
    ctx.insert("errors", &crate::forms::FieldErrors::new());
    ctx.insert("action", &format!("/lists/{}/edit", list.id));
    pages::render(&tmpl, "list_form.html", &ctx)
}

#[post("/lists/{id}/edit")]
pub async fn update_list(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
    form: web::Form<ListForm>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let lid = path.into_inner();

    let list = load_list(pool.clone(), lid, uid).await?;

    let name = match form.validate() {
        Ok(name) => name,
        Err(errors) => {
            let mut ctx = pages::context_for(&identity, &session);
            ctx.insert("page_title", &format!("Edit List {}", list.name));
            ctx.insert("form", &form.display());
            ctx.insert("errors", &errors);
            ctx.insert("action", &format!("/lists/{lid}/edit"));
            return pages::render(&tmpl, "list_form.html", &ctx);
        }
    };

    let renamed = name.clone();
    web::block(move || {
        let mut conn = pool.get()?;
        actions::update_list_name(&mut conn, lid, &renamed)
    })
    .await??;

    flash::push(&session, format!("List {name} Edited"));
    Ok(pages::redirect("/"))
}

#[get("/lists/{id}/delete")]
pub async fn delete_list_confirm(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let list = load_list(pool, path.into_inner(), user.id).await?;

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("list", &list);
    pages::render(&tmpl, "list_confirm_delete.html", &ctx)
}

#[post("/lists/{id}/delete")]
pub async fn delete_list(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    config: web::Data<Config>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let lid = path.into_inner();
    let policy = config.list_delete_policy;

    let list = load_list(pool.clone(), lid, uid).await?;

    let outcome = web::block(move || {
        let mut conn = pool.get()?;
        actions::delete_list(&mut conn, lid, policy)
    })
    .await??;

    match outcome {
        ListDeletion::Deleted => {
            flash::push(&session, format!("List {} deleted successfully", list.name));
            Ok(pages::redirect("/"))
        }
        ListDeletion::HasTasks(open) => {
            log::info!("refusing to delete list {lid}: {open} tasks left");
            let mut ctx = pages::context_for(&identity, &session);
            ctx.insert("list", &list);
            ctx.insert(
                "error",
                &format!("List {} cannot be deleted while it still has tasks", list.name),
            );
            pages::render(&tmpl, "list_confirm_delete.html", &ctx)
        }
    }
}
