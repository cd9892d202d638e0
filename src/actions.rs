//! Diesel queries, one function per persistence operation. Handlers call
//! these from inside `web::block` closures.

use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::sql_function;
use diesel::sql_types::{Bool, Integer, Nullable};

use crate::config::DeletePolicy;
use crate::error::Error;
use crate::models::{List, NewList, NewUser, Task, TaskValues, User};

sql_function!(fn last_insert_rowid() -> Integer);
sql_function!(fn coalesce(value: Nullable<Bool>, fallback: Bool) -> Bool);

/// Outcome of a list deletion under the configured policy.
#[derive(Debug, PartialEq, Eq)]
pub enum ListDeletion {
    Deleted,
    /// Blocked by the `protect` policy; carries the number of tasks left.
    HasTasks(i64),
}

pub fn find_user_by_username(
    conn: &mut SqliteConnection,
    uname: &str,
) -> Result<Option<User>, Error> {
    use crate::schema::users::dsl::*;

    let user = users
        .filter(username.eq(uname))
        .first::<User>(conn)
        .optional()?;

    Ok(user)
}

/// Insert a new account. Returns `None` when the username is already taken,
/// so the unique constraint is the last word even under concurrent sign-ups.
pub fn insert_user(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<Option<User>, Error> {
    use crate::schema::users::dsl::*;

    let inserted = diesel::insert_into(users).values(new_user).execute(conn);
    match inserted {
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Ok(None)
        }
        other => {
            other?;
        }
    }

    let rowid: i32 = diesel::select(last_insert_rowid()).get_result(conn)?;
    let user = users.find(rowid).first::<User>(conn)?;
    Ok(Some(user))
}

/// All lists owned by one user, in creation order.
pub fn find_lists_for_user(conn: &mut SqliteConnection, uid: i32) -> Result<Vec<List>, Error> {
    use crate::schema::lists::dsl::*;

    let rows = lists
        .filter(user_id.eq(uid))
        .order(id.asc())
        .load::<List>(conn)?;

    Ok(rows)
}

/// A single list, visible only to its owner. A list owned by someone else
/// behaves exactly like a missing one.
pub fn find_list_for_user(
    conn: &mut SqliteConnection,
    lid: i32,
    uid: i32,
) -> Result<Option<List>, Error> {
    use crate::schema::lists::dsl::*;

    let row = lists
        .find(lid)
        .filter(user_id.eq(uid))
        .first::<List>(conn)
        .optional()?;

    Ok(row)
}

pub fn insert_list(conn: &mut SqliteConnection, nm: &str, uid: i32) -> Result<List, Error> {
    use crate::schema::lists::dsl::*;

    diesel::insert_into(lists)
        .values(&NewList { name: nm, user_id: uid })
        .execute(conn)?;

    let rowid: i32 = diesel::select(last_insert_rowid()).get_result(conn)?;
    Ok(lists.find(rowid).first::<List>(conn)?)
}

pub fn update_list_name(conn: &mut SqliteConnection, lid: i32, nm: &str) -> Result<(), Error> {
    use crate::schema::lists::dsl::*;

    diesel::update(lists.find(lid)).set(name.eq(nm)).execute(conn)?;
    Ok(())
}

/// Delete a list under the configured policy. Cascade removes the child
/// tasks in the same transaction; protect refuses while tasks exist.
pub fn delete_list(
    conn: &mut SqliteConnection,
    lid: i32,
    policy: DeletePolicy,
) -> Result<ListDeletion, Error> {
    use crate::schema::{lists, tasks};

    conn.transaction(|conn| {
        let open: i64 = tasks::table
            .filter(tasks::list_id.eq(lid))
            .count()
            .get_result(conn)?;

        if policy == DeletePolicy::Protect && open > 0 {
            return Ok(ListDeletion::HasTasks(open));
        }

        diesel::delete(tasks::table.filter(tasks::list_id.eq(lid))).execute(conn)?;
        diesel::delete(lists::table.find(lid)).execute(conn)?;
        Ok(ListDeletion::Deleted)
    })
}

/// Tasks of one list: important ones first, creation order within each
/// importance group. An unset importance flag counts as not important.
pub fn find_tasks_for_list(conn: &mut SqliteConnection, lid: i32) -> Result<Vec<Task>, Error> {
    use crate::schema::tasks::dsl::*;

    let rows = tasks
        .filter(list_id.eq(lid))
        .order((coalesce(is_important, false).desc(), id.asc()))
        .load::<Task>(conn)?;

    Ok(rows)
}

/// A task together with its parent list, scoped to the list owner.
pub fn find_task_for_user(
    conn: &mut SqliteConnection,
    tid: i32,
    uid: i32,
) -> Result<Option<(Task, List)>, Error> {
    use crate::schema::{lists, tasks};

    let row = tasks::table
        .inner_join(lists::table)
        .filter(tasks::id.eq(tid))
        .filter(lists::user_id.eq(uid))
        .first::<(Task, List)>(conn)
        .optional()?;

    Ok(row)
}

pub fn insert_task(
    conn: &mut SqliteConnection,
    lid: i32,
    values: &TaskValues,
) -> Result<Task, Error> {
    use crate::schema::tasks::dsl::*;

    diesel::insert_into(tasks)
        .values((values, list_id.eq(lid)))
        .execute(conn)?;

    let rowid: i32 = diesel::select(last_insert_rowid()).get_result(conn)?;
    Ok(tasks.find(rowid).first::<Task>(conn)?)
}

pub fn update_task(
    conn: &mut SqliteConnection,
    tid: i32,
    values: &TaskValues,
) -> Result<(), Error> {
    use crate::schema::tasks::dsl::*;

    diesel::update(tasks.find(tid)).set(values).execute(conn)?;
    Ok(())
}

pub fn delete_task(conn: &mut SqliteConnection, tid: i32) -> Result<(), Error> {
    use crate::schema::tasks::dsl::*;

    diesel::delete(tasks.find(tid)).execute(conn)?;
    Ok(())
}
