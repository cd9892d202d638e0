//! Form payloads and their validation. Each DTO maps explicitly onto the
//! entity it feeds; rules run per field and failures collect into a map
//! keyed by field name for re-rendering.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::models::{NewUser, Task, TaskValues};
use crate::passwords::{self, UserAttributes};

pub const REQUIRED: &str = "This field is required";

/// Field name to error message, ordered for stable rendering.
pub type FieldErrors = BTreeMap<&'static str, String>;

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn check_max_length(
    value: &str,
    max: usize,
    field: &'static str,
    errors: &mut FieldErrors,
) {
    if value.chars().count() > max {
        errors.insert(
            field,
            format!("Ensure this value has at most {max} characters."),
        );
    }
}

#[derive(Debug, Deserialize)]
pub struct ListForm {
    #[serde(default)]
    pub name: String,
}

impl ListForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", REQUIRED.to_owned());
        }
        check_max_length(name, 200, "name", &mut errors);
        if errors.is_empty() {
            Ok(name.to_owned())
        } else {
            Err(errors)
        }
    }

    pub fn display(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([("name", self.name.clone())])
    }
}

/// Task form. Every field is optional in the payload; on edit, a field that
/// was not submitted at all keeps its stored value.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_done: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub time_it_takes: Option<String>,
    pub is_important: Option<String>,
}

impl TaskForm {
    /// Validate for creation: absent optional fields stay unset.
    pub fn values(&self) -> Result<TaskValues, FieldErrors> {
        self.merged(None)
    }

    /// Validate against an existing task: submitted fields overwrite, absent
    /// fields keep the stored value (pre-fill then overlay).
    pub fn merged(&self, existing: Option<&Task>) -> Result<TaskValues, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = match &self.name {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    errors.insert("name", REQUIRED.to_owned());
                }
                check_max_length(trimmed, 200, "name", &mut errors);
                trimmed.to_owned()
            }
            None => match existing {
                Some(task) => task.name.clone(),
                None => {
                    errors.insert("name", REQUIRED.to_owned());
                    String::new()
                }
            },
        };

        let description = match &self.description {
            Some(raw) => {
                let trimmed = raw.trim();
                check_max_length(trimmed, 400, "description", &mut errors);
                none_if_empty(trimmed)
            }
            None => existing.and_then(|task| task.description.clone()),
        };

        let is_done = overlay(
            &self.is_done,
            existing.and_then(|task| task.is_done),
            parse_tristate,
            "is_done",
            &mut errors,
        );
        let is_important = overlay(
            &self.is_important,
            existing.and_then(|task| task.is_important),
            parse_tristate,
            "is_important",
            &mut errors,
        );
        let start_date = overlay(
            &self.start_date,
            existing.and_then(|task| task.start_date),
            parse_date,
            "start_date",
            &mut errors,
        );
        let end_date = overlay(
            &self.end_date,
            existing.and_then(|task| task.end_date),
            parse_date,
            "end_date",
            &mut errors,
        );
        let time_it_takes = overlay(
            &self.time_it_takes,
            existing.and_then(|task| task.time_it_takes),
            parse_minutes,
            "time_it_takes",
            &mut errors,
        );

        if errors.is_empty() {
            Ok(TaskValues {
                name,
                description,
                is_done,
                start_date,
                end_date,
                time_it_takes,
                is_important,
            })
        } else {
            Err(errors)
        }
    }

    /// String values for re-rendering the form: submitted input where
    /// present, otherwise the stored task's values.
    pub fn display(&self, existing: Option<&Task>) -> BTreeMap<&'static str, String> {
        let submitted = |raw: &Option<String>, stored: String| match raw {
            Some(value) => value.clone(),
            None => stored,
        };
        let stored_flag = |flag: Option<bool>| match flag {
            Some(true) => "Yes".to_owned(),
            Some(false) => "No".to_owned(),
            None => String::new(),
        };
        let stored_date = |date: Option<NaiveDateTime>| {
            date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };

        BTreeMap::from([
            (
                "name",
                submitted(&self.name, existing.map(|t| t.name.clone()).unwrap_or_default()),
            ),
            (
                "description",
                submitted(
                    &self.description,
                    existing.and_then(|t| t.description.clone()).unwrap_or_default(),
                ),
            ),
            (
                "is_done",
                submitted(&self.is_done, stored_flag(existing.and_then(|t| t.is_done))),
            ),
            (
                "is_important",
                submitted(
                    &self.is_important,
                    stored_flag(existing.and_then(|t| t.is_important)),
                ),
            ),
            (
                "start_date",
                submitted(
                    &self.start_date,
                    stored_date(existing.and_then(|t| t.start_date)),
                ),
            ),
            (
                "end_date",
                submitted(&self.end_date, stored_date(existing.and_then(|t| t.end_date))),
            ),
            (
                "time_it_takes",
                submitted(
                    &self.time_it_takes,
                    existing
                        .and_then(|t| t.time_it_takes)
                        .map(|m| m.to_string())
                        .unwrap_or_default(),
                ),
            ),
        ])
    }
}

/// Overlay one optional field: absent keeps the current value, submitted
/// input is parsed and replaces it (an empty submission clears it).
fn overlay<T>(
    raw: &Option<String>,
    current: Option<T>,
    parse: impl Fn(&str) -> Result<Option<T>, String>,
    field: &'static str,
    errors: &mut FieldErrors,
) -> Option<T> {
    match raw {
        Some(input) => match parse(input.trim()) {
            Ok(value) => value,
            Err(message) => {
                errors.insert(field, message);
                None
            }
        },
        None => current,
    }
}

fn parse_tristate(raw: &str) -> Result<Option<bool>, String> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "unknown" => Ok(None),
        "yes" | "true" | "on" => Ok(Some(true)),
        "no" | "false" | "off" => Ok(Some(false)),
        _ => Err("Select a valid choice.".to_owned()),
    }
}

fn parse_minutes(raw: &str) -> Result<Option<i32>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    let minutes: i32 = raw
        .parse()
        .map_err(|_| "Enter a whole number.".to_owned())?;
    if minutes < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_owned());
    }
    Ok(Some(minutes))
}

fn parse_date(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(Some(datetime));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_hms_opt(0, 0, 0))
        .map_err(|_| "Enter a valid date.".to_owned())
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl SignupForm {
    /// Required-field checks, then the password rule chain. Password rule
    /// failures attach to the password field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("username", &self.username),
            ("password", &self.password),
            ("password2", &self.password2),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, REQUIRED.to_owned());
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        check_max_length(self.username.trim(), 150, "username", &mut errors);
        if !errors.is_empty() {
            return Err(errors);
        }

        let attrs = UserAttributes {
            username: self.username.trim(),
            first_name: self.first_name.trim(),
            last_name: self.last_name.trim(),
            email: self.email.trim(),
        };
        if let Err(message) = passwords::validate(&self.password, &self.password2, &attrs) {
            errors.insert("password", message);
            return Err(errors);
        }

        Ok(())
    }

    pub fn to_new_user(&self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username.trim().to_owned(),
            password_hash,
            first_name: none_if_empty(&self.first_name),
            last_name: none_if_empty(&self.last_name),
            email: none_if_empty(&self.email),
        }
    }

    /// Values echoed back into the form; passwords are never echoed.
    pub fn display(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("username", self.username.clone()),
            ("first_name", self.first_name.clone()),
            ("last_name", self.last_name.clone()),
            ("email", self.email.clone()),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
