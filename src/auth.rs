//! Caller identity and credential handling. The session cookie carries the
//! authenticated user's id and username; the [`Identity`] extractor turns
//! that into an explicit value handlers receive per invocation, so nothing
//! reads ambient state.

use std::future::{ready, Ready};

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Serialize;

use crate::error::Error;
use crate::models::User;

const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";

/// The authenticated caller as stored in the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i32,
    pub username: String,
}

/// Caller identity for one request: either an authenticated [`SessionUser`]
/// or anonymous.
#[derive(Debug, Clone)]
pub struct Identity(Option<SessionUser>);

impl Identity {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        let user = match (
            session.get::<i32>(USER_ID_KEY),
            session.get::<String>(USERNAME_KEY),
        ) {
            (Ok(Some(id)), Ok(Some(username))) => Some(SessionUser { id, username }),
            _ => None,
        };
        ready(Ok(Identity(user)))
    }
}

/// Establish the session identity after a successful credential check.
pub fn log_in(session: &Session, user: &User) -> Result<(), Error> {
    session.renew();
    session.insert(USER_ID_KEY, user.id)?;
    session.insert(USERNAME_KEY, user.username.clone())?;
    Ok(())
}

/// Drop the session identity and everything stored alongside it.
pub fn log_out(session: &Session) {
    session.purge();
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(Error::Hash)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored_hash).map_err(Error::Hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(other) => Err(Error::Hash(other)),
    }
}
