//! Handlers for tasks within a list: the task view with its remaining-time
//! total, plus create, details, edit and delete.

use actix_session::Session;
use actix_web::{get, post, web, HttpResponse};
use tera::Tera;

use crate::actions;
use crate::auth::Identity;
use crate::error::Error;
use crate::forms::{FieldErrors, TaskForm};
use crate::models::{List, Task};
use crate::{flash, pages, DbPool};

/// Tasks of one list, important ones first, with the minutes still needed
/// to finish everything that is not done.
#[get("/lists/{id}")]
pub async fn list_tasks(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let lid = path.into_inner();

    let (list, list_of_task) = web::block(move || {
        let mut conn = pool.get()?;
        let list = actions::find_list_for_user(&mut conn, lid, uid)?.ok_or(Error::NotFound)?;
        let tasks = actions::find_tasks_for_list(&mut conn, lid)?;
        Ok::<_, Error>((list, tasks))
    })
    .await??;

    let time_finish_list: i64 = list_of_task.iter().map(Task::remaining_minutes).sum();

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("list", &list);
    ctx.insert("list_of_task", &list_of_task);
    ctx.insert("time_finish_list", &time_finish_list);
    pages::render(&tmpl, "list_tasks.html", &ctx)
}

async fn load_list(pool: web::Data<DbPool>, lid: i32, uid: i32) -> Result<List, Error> {
    web::block(move || {
        let mut conn = pool.get()?;
        actions::find_list_for_user(&mut conn, lid, uid)
    })
    .await??
    .ok_or(Error::NotFound)
}

/// A task plus its parent list, owner-scoped through the list.
async fn load_task(pool: web::Data<DbPool>, tid: i32, uid: i32) -> Result<(Task, List), Error> {
    web::block(move || {
        let mut conn = pool.get()?;
        actions::find_task_for_user(&mut conn, tid, uid)
    })
    .await??
    .ok_or(Error::NotFound)
}

fn task_form_page(
    tmpl: &Tera,
    identity: &Identity,
    session: &Session,
    title: &str,
    action: &str,
    form: &TaskForm,
    existing: Option<&Task>,
    errors: &FieldErrors,
) -> Result<HttpResponse, Error> {
    let mut ctx = pages::context_for(identity, session);
    ctx.insert("page_title", title);
    ctx.insert("action", action);
    ctx.insert("form", &form.display(existing));
    ctx.insert("errors", errors);
    pages::render(tmpl, "task_form.html", &ctx)
}

#[get("/lists/{id}/tasks/new")]
pub async fn new_task_form(
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

    task_form_page(
        &tmpl,
        &identity,
        &session,
        "Adding a new task to the list",
        &format!("/lists/{}/tasks/new", list.id),
        &TaskForm::default(),
        None,
        &FieldErrors::new(),
    )
}

#[post("/lists/{id}/tasks/new")]
pub async fn create_task(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let lid = path.into_inner();

    let list = load_list(pool.clone(), lid, uid).await?;

    let values = match form.values() {
        Ok(values) => values,
        Err(errors) => {
            return task_form_page(
                &tmpl,
                &identity,
                &session,
                "Adding a new task to the list",
                &format!("/lists/{lid}/tasks/new"),
                &form,
                None,
                &errors,
            )
        }
    };

    let task = web::block(move || {
        let mut conn = pool.get()?;
        actions::insert_task(&mut conn, lid, &values)
    })
    .await??;

    flash::push(&session, format!("Task {} created successfully", task.name));
    Ok(pages::redirect(&format!("/lists/{}", list.id)))
}

#[get("/tasks/{id}")]
pub async fn task_details(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let (task, list) = load_task(pool, path.into_inner(), user.id).await?;

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("task", &task);
    ctx.insert("list", &list);
    pages::render(&tmpl, "task_details.html", &ctx)
}

#[get("/tasks/{id}/edit")]
pub async fn edit_task_form(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let (task, list) = load_task(pool, path.into_inner(), user.id).await?;

    task_form_page(
        &tmpl,
        &identity,
        &session,
        &format!("Editing task of {}", list.name),
        &format!("/tasks/{}/edit", task.id),
        &TaskForm::default(),
        Some(&task),
        &FieldErrors::new(),
    )
}

#[post("/tasks/{id}/edit")]
pub async fn update_task(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
    form: web::Form<TaskForm>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let tid = path.into_inner();

    let (task, list) = load_task(pool.clone(), tid, uid).await?;

    let values = match form.merged(Some(&task)) {
        Ok(values) => values,
        Err(errors) => {
            return task_form_page(
                &tmpl,
                &identity,
                &session,
                &format!("Editing task of {}", list.name),
                &format!("/tasks/{tid}/edit"),
                &form,
                Some(&task),
                &errors,
            )
        }
    };

    let name = values.name.clone();
    web::block(move || {
        let mut conn = pool.get()?;
        actions::update_task(&mut conn, tid, &values)
    })
    .await??;

    flash::push(&session, format!("Task {name} edited"));
    Ok(pages::redirect(&format!("/lists/{}", list.id)))
}

#[get("/tasks/{id}/delete")]
pub async fn delete_task_confirm(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let (task, list) = load_task(pool, path.into_inner(), user.id).await?;

    let mut ctx = pages::context_for(&identity, &session);
    ctx.insert("task", &task);
    ctx.insert("list", &list);
    pages::render(&tmpl, "task_confirm_delete.html", &ctx)
}

#[post("/tasks/{id}/delete")]
pub async fn delete_task(
    pool: web::Data<DbPool>,
    tmpl: web::Data<Tera>,
    session: Session,
    identity: Identity,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let Some(user) = identity.user() else {
        return pages::forbidden(&tmpl, &identity, &session);
    };
    let uid = user.id;
    let tid = path.into_inner();

    let (task, list) = load_task(pool.clone(), tid, uid).await?;

    web::block(move || {
        let mut conn = pool.get()?;
        actions::delete_task(&mut conn, tid)
    })
    .await??;

    flash::push(&session, format!("Task {} deleted successfully", task.name));
    Ok(pages::redirect(&format!("/lists/{}", list.id)))
}
