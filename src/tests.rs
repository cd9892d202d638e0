//! Route-level tests: the full application wired against an in-memory
//! SQLite database, driven through `actix_web::test`.

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use diesel::prelude::*;
use diesel::r2d2;
use diesel_migrations::MigrationHarness;

use crate::config::{Config, DeletePolicy};
use crate::models::Task;
use crate::{pages, routes, DbPool, MIGRATIONS};

fn test_pool() -> DbPool {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(":memory:");
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("couldn't build test pool");
    let mut conn = pool.get().expect("couldn't get db connection from pool");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("migrations should apply cleanly");
    pool
}

fn test_config(policy: DeletePolicy) -> Config {
    Config {
        database_url: ":memory:".to_owned(),
        bind_addr: "127.0.0.1:0".to_owned(),
        session_key: None,
        list_delete_policy: policy,
    }
}

/// Build the full application against the given pool.
macro_rules! init_app {
    ($pool:expr) => {
        init_app!($pool, DeletePolicy::Cascade)
    };
    ($pool:expr, $policy:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(
                    pages::templates().expect("templates should parse"),
                ))
                .app_data(web::Data::new(test_config($policy)))
                .wrap(
                    SessionMiddleware::builder(
                        CookieSessionStore::default(),
                        Key::from(&[7u8; 64]),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(routes::configure),
        )
        .await
    };
}

/// Send a request carrying the tracked session cookie, then pick up the
/// refreshed cookie from the response (the cookie store rewrites it on
/// every session change, including flash messages being drained).
macro_rules! send {
    ($app:expr, $cookie:expr, $req:expr) => {{
        let cookie: &mut Option<Cookie<'static>> = $cookie;
        let mut req = $req;
        if let Some(current) = cookie.as_ref() {
            req = req.cookie(current.clone());
        }
        let res = test::call_service(&$app, req.to_request()).await;
        if let Some(fresh) = res.response().cookies().find(|c| c.name() == "id") {
            *cookie = Some(fresh.into_owned());
        }
        res
    }};
}

macro_rules! body {
    ($res:expr) => {{
        let bytes = test::read_body($res).await;
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }};
}

/// Register an account with a strong password and establish a session,
/// draining the sign-up notification so tests start from a clean page.
macro_rules! sign_up_and_log_in {
    ($app:expr, $cookie:expr, $username:expr) => {{
        let res = send!(
            $app,
            $cookie,
            test::TestRequest::post().uri("/signup").set_form([
                ("username", $username),
                ("password", "super123*secure"),
                ("password2", "super123*secure"),
            ])
        );
        assert_eq!(res.status(), StatusCode::FOUND);

        let res = send!(
            $app,
            $cookie,
            test::TestRequest::post()
                .uri("/login")
                .set_form([("username", $username), ("password", "super123*secure")])
        );
        assert_eq!(res.status(), StatusCode::FOUND);

        let _ = send!($app, $cookie, test::TestRequest::get().uri("/"));
    }};
}

fn last_list_id(pool: &DbPool) -> i32 {
    use crate::schema::lists::dsl::*;
    let mut conn = pool.get().expect("couldn't get db connection from pool");
    lists
        .select(id)
        .order(id.desc())
        .first(&mut conn)
        .expect("a list should exist")
}

fn task_by_name(pool: &DbPool, wanted: &str) -> Task {
    use crate::schema::tasks::dsl::*;
    let mut conn = pool.get().expect("couldn't get db connection from pool");
    tasks
        .filter(name.eq(wanted))
        .first(&mut conn)
        .expect("task should exist")
}

#[actix_web::test]
async fn anonymous_access_is_forbidden_with_status_200() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    for uri in ["/", "/lists/1", "/lists/new", "/lists/1/edit", "/lists/1/tasks/new"] {
        let res = send!(app, &mut cookie, test::TestRequest::get().uri(uri));
        assert_eq!(res.status(), StatusCode::OK, "GET {uri}");
        let body = body!(res);
        assert!(body.contains("Access Forbidden"), "unexpected body for {uri}: {body}");
    }
}

#[actix_web::test]
async fn signup_rejects_missing_required_fields() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    let cases = [
        [("username", ""), ("password", "123456789"), ("password2", "123456789")],
        [("username", "test"), ("password", ""), ("password2", "123456789")],
        [("username", "test"), ("password", "123456789"), ("password2", "")],
    ];
    for case in cases {
        let res = send!(
            app,
            &mut cookie,
            test::TestRequest::post().uri("/signup").set_form(case)
        );
        assert_eq!(res.status(), StatusCode::OK);
        let body = body!(res);
        assert!(body.contains("This field is required"), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn signup_runs_the_password_rule_chain() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    let cases: [(&str, &str, &str); 4] = [
        ("test", "123456789", "This password is entirely numeric"),
        ("test", "usterst", "This password is too short. It must contain at least 8 characters."),
        ("testcase", "testcase", "The password is too similar to the username"),
        ("test", "password", "This password is too common"),
    ];
    for (username, password, message) in cases {
        let res = send!(
            app,
            &mut cookie,
            test::TestRequest::post().uri("/signup").set_form([
                ("username", username),
                ("password", password),
                ("password2", password),
            ])
        );
        assert_eq!(res.status(), StatusCode::OK);
        let body = body!(res);
        assert!(body.contains(message), "expected {message:?} in: {body}");
    }
}

#[actix_web::test]
async fn signup_flags_similarity_to_profile_fields() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/signup").set_form([
            ("username", "lucifer"),
            ("first_name", "morningstar"),
            ("password", "morningstar1"),
            ("password2", "morningstar1"),
        ])
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(
        body.contains("The password is too similar to the first name"),
        "unexpected body: {body}"
    );
}

#[actix_web::test]
async fn signup_redirects_to_login_and_notifies() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/signup").set_form([
            ("username", "test"),
            ("password", "super123*secure"),
            ("password2", "super123*secure"),
        ])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");

    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/login"));
    let body = body!(res);
    assert!(body.contains("User test Added"), "unexpected body: {body}");

    // duplicate username is refused with the field message
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/signup").set_form([
            ("username", "test"),
            ("password", "super123*secure"),
            ("password2", "super123*secure"),
        ])
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(
        body.contains("A user with that username already exists."),
        "unexpected body: {body}"
    );
}

#[actix_web::test]
async fn login_rejects_bad_credentials() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/signup").set_form([
            ("username", "test"),
            ("password", "super123*secure"),
            ("password2", "super123*secure"),
        ])
    );
    assert_eq!(res.status(), StatusCode::FOUND);

    for (username, password) in [("tester", "super123*secure"), ("test", "super123*wrong")] {
        let res = send!(
            app,
            &mut cookie,
            test::TestRequest::post()
                .uri("/login")
                .set_form([("username", username), ("password", password)])
        );
        assert_eq!(res.status(), StatusCode::OK);
        let body = body!(res);
        assert!(
            body.contains(
                "Please enter a correct username and password. \
                 Note that both fields may be case-sensitive."
            ),
            "unexpected body: {body}"
        );
    }

    // still anonymous
    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("Access Forbidden"), "unexpected body: {body}");
}

#[actix_web::test]
async fn login_establishes_session_and_logout_ends_it() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("Lists of user test"), "unexpected body: {body}");
    assert!(body.contains("No lists available"), "unexpected body: {body}");

    let res = send!(app, &mut cookie, test::TestRequest::post().uri("/logout"));
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/login");

    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("Access Forbidden"), "unexpected body: {body}");
}

#[actix_web::test]
async fn list_crud_flow() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    // empty name re-renders the form, nothing persisted
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "")])
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("This field is required"), "unexpected body: {body}");

    // create
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "test")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/");

    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("List test created successfully"), "unexpected body: {body}");
    assert!(body.contains("test"), "unexpected body: {body}");

    // the notification is one-shot
    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(!body.contains("List test created successfully"), "unexpected body: {body}");

    // edit pre-populates, then renames
    let lid = last_list_id(&pool);
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}/edit"))
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("value=\"test\""), "unexpected body: {body}");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/lists/{lid}/edit"))
            .set_form([("name", "renamed")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("List renamed Edited"), "unexpected body: {body}");
    assert!(body.contains("renamed"), "unexpected body: {body}");

    // delete confirms on GET, deletes on POST
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("Delete list renamed?"), "unexpected body: {body}");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri(&format!("/lists/{lid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("List renamed deleted successfully"), "unexpected body: {body}");
    assert!(body.contains("No lists available"), "unexpected body: {body}");
}

#[actix_web::test]
async fn lists_are_scoped_to_their_owner() {
    let pool = test_pool();
    let app = init_app!(pool);

    let mut alice = None;
    sign_up_and_log_in!(app, &mut alice, "alice");
    let res = send!(
        app,
        &mut alice,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "groceries")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let mut bob = None;
    sign_up_and_log_in!(app, &mut bob, "bob");

    // another user's list behaves like a missing one
    for uri in [
        format!("/lists/{lid}"),
        format!("/lists/{lid}/edit"),
        format!("/lists/{lid}/delete"),
    ] {
        let res = send!(app, &mut bob, test::TestRequest::get().uri(&uri));
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "GET {uri}");
    }

    // bob's own index does not show it either
    let res = send!(app, &mut bob, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(!body.contains("groceries"), "unexpected body: {body}");
}

#[actix_web::test]
async fn task_flow_computes_remaining_time() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "planner")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}"))
    );
    let body = body!(res);
    assert!(body.contains("No tasks available"), "unexpected body: {body}");

    // name is the only required field
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/lists/{lid}/tasks/new"))
            .set_form([("name", "")])
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("This field is required"), "unexpected body: {body}");

    let fixtures: [(&str, &str, &str); 4] = [
        ("alpha", "20", "Yes"),
        ("bravo", "45", "Yes"),
        ("charlie", "1000", ""),
        ("delta", "350", ""),
    ];
    for (name, minutes, done) in fixtures {
        let res = send!(
            app,
            &mut cookie,
            test::TestRequest::post()
                .uri(&format!("/lists/{lid}/tasks/new"))
                .set_form([("name", name), ("time_it_takes", minutes), ("is_done", done)])
        );
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            format!("/lists/{lid}").as_str()
        );
    }

    // drain the creation notifications, then check the computed total:
    // only charlie and delta are still open
    let _ = send!(app, &mut cookie, test::TestRequest::get().uri(&format!("/lists/{lid}")));
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}"))
    );
    let body = body!(res);
    assert!(
        body.contains("Remaining time to finish all tasks of the list is : 1350 minutes"),
        "unexpected body: {body}"
    );

    // deleting a task removes it and updates the total
    let tid = task_by_name(&pool, "delta").id;
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri(&format!("/tasks/{tid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}"))
    );
    let body = body!(res);
    assert!(body.contains("Task delta deleted successfully"), "unexpected body: {body}");
    assert!(
        body.contains("Remaining time to finish all tasks of the list is : 1000 minutes"),
        "unexpected body: {body}"
    );

    // once the notification is drained the deleted task is gone entirely
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}"))
    );
    let body = body!(res);
    assert!(!body.contains("delta"), "unexpected body: {body}");
}

#[actix_web::test]
async fn important_tasks_come_first_in_creation_order() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "planner")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let fixtures: [(&str, &str); 5] = [
        ("alpha", ""),
        ("bravo", ""),
        ("charlie", "Yes"),
        ("delta", ""),
        ("echo", "Yes"),
    ];
    for (name, important) in fixtures {
        let res = send!(
            app,
            &mut cookie,
            test::TestRequest::post()
                .uri(&format!("/lists/{lid}/tasks/new"))
                .set_form([("name", name), ("is_important", important)])
        );
        assert_eq!(res.status(), StatusCode::FOUND);
    }

    let _ = send!(app, &mut cookie, test::TestRequest::get().uri(&format!("/lists/{lid}")));
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/lists/{lid}"))
    );
    let body = body!(res);

    let position = |name: &str| {
        body.find(name)
            .unwrap_or_else(|| panic!("{name} missing from body: {body}"))
    };
    // important first, then creation order within each group
    assert!(position("charlie") < position("echo"));
    assert!(position("echo") < position("alpha"));
    assert!(position("alpha") < position("bravo"));
    assert!(position("bravo") < position("delta"));
}

#[actix_web::test]
async fn editing_a_task_preserves_fields_not_submitted() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "planner")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/lists/{lid}/tasks/new"))
            .set_form([
                ("name", "report"),
                ("description", "quarterly numbers"),
                ("start_date", "2021-07-24"),
                ("time_it_takes", "120"),
                ("is_important", "Yes"),
            ])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let tid = task_by_name(&pool, "report").id;

    // submit only the name; everything else keeps its stored value
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/tasks/{tid}/edit"))
            .set_form([("name", "report v2")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);

    let task = task_by_name(&pool, "report v2");
    assert_eq!(task.id, tid);
    assert_eq!(task.description.as_deref(), Some("quarterly numbers"));
    assert_eq!(task.time_it_takes, Some(120));
    assert_eq!(task.is_important, Some(true));
    assert!(task.start_date.is_some());
}

#[actix_web::test]
async fn task_details_shows_stored_fields() {
    let pool = test_pool();
    let app = init_app!(pool);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "planner")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/lists/{lid}/tasks/new"))
            .set_form([
                ("name", "report"),
                ("description", "quarterly numbers"),
                ("time_it_takes", "120"),
            ])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let tid = task_by_name(&pool, "report").id;

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::get().uri(&format!("/tasks/{tid}"))
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(body.contains("report"), "unexpected body: {body}");
    assert!(body.contains("quarterly numbers"), "unexpected body: {body}");
    assert!(body.contains("120 minutes"), "unexpected body: {body}");
}

#[actix_web::test]
async fn protect_policy_blocks_deleting_a_list_with_tasks() {
    let pool = test_pool();
    let app = init_app!(pool, DeletePolicy::Protect);
    let mut cookie = None;
    sign_up_and_log_in!(app, &mut cookie, "test");

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri("/lists/new").set_form([("name", "planner")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let lid = last_list_id(&pool);

    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post()
            .uri(&format!("/lists/{lid}/tasks/new"))
            .set_form([("name", "report")])
    );
    assert_eq!(res.status(), StatusCode::FOUND);

    // refused while the task exists
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri(&format!("/lists/{lid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::OK);
    let body = body!(res);
    assert!(
        body.contains("cannot be deleted while it still has tasks"),
        "unexpected body: {body}"
    );
    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("planner"), "unexpected body: {body}");

    // once the task is gone the list can be deleted
    let tid = task_by_name(&pool, "report").id;
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri(&format!("/tasks/{tid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::FOUND);
    let res = send!(
        app,
        &mut cookie,
        test::TestRequest::post().uri(&format!("/lists/{lid}/delete"))
    );
    assert_eq!(res.status(), StatusCode::FOUND);

    let res = send!(app, &mut cookie, test::TestRequest::get().uri("/"));
    let body = body!(res);
    assert!(body.contains("List planner deleted successfully"), "unexpected body: {body}");
    assert!(body.contains("No lists available"), "unexpected body: {body}");
}
