pub mod accounts;
pub mod lists;
pub mod tasks;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(lists::index)
        .service(lists::new_list_form)
        .service(lists::create_list)
        .service(lists::edit_list_form)
        .service(lists::update_list)
        .service(lists::delete_list_confirm)
        .service(lists::delete_list)
        .service(tasks::list_tasks)
        .service(tasks::new_task_form)
        .service(tasks::create_task)
        .service(tasks::task_details)
        .service(tasks::edit_task_form)
        .service(tasks::update_task)
        .service(tasks::delete_task_confirm)
        .service(tasks::delete_task)
        .service(accounts::signup_form)
        .service(accounts::signup)
        .service(accounts::login_form)
        .service(accounts::login)
        .service(accounts::logout);
}
