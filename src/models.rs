use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{lists, tasks, users};

/// Registered account. The password is only ever stored as an Argon2id
/// PHC string, never in the clear.
#[derive(Debug, Clone, Queryable, Identifiable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// New account details.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// A named collection of tasks with exactly one owner.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable)]
pub struct List {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = lists)]
pub struct NewList<'a> {
    pub name: &'a str,
    pub user_id: i32,
}

/// A unit of work within a list. Everything except the name is optional;
/// the three-valued flags stay `None` until the user picks yes or no.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(List))]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_done: Option<bool>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub time_it_takes: Option<i32>,
    pub is_important: Option<bool>,
    pub list_id: i32,
}

impl Task {
    /// Minutes this task still contributes to the list total. Done tasks
    /// and tasks without an estimate count zero.
    pub fn remaining_minutes(&self) -> i64 {
        if self.is_done.unwrap_or(false) {
            0
        } else {
            i64::from(self.time_it_takes.unwrap_or(0))
        }
    }
}

/// Validated task fields, used both to insert (paired with a list id) and
/// to overwrite an existing row. `None` means NULL in both directions.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskValues {
    pub name: String,
    pub description: Option<String>,
    pub is_done: Option<bool>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub time_it_takes: Option<i32>,
    pub is_important: Option<bool>,
}
