use actix_web::cookie::Key;

/// What happens to a list's tasks when the list is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete the tasks together with the list, in one transaction.
    Cascade,
    /// Refuse to delete the list while it still has tasks.
    Protect,
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_key: Option<String>,
    pub list_delete_policy: DeletePolicy,
}

impl Config {
    pub fn from_env() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL should be set");
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
        let session_key = std::env::var("SESSION_KEY").ok();
        let list_delete_policy = match std::env::var("LIST_DELETE_POLICY") {
            Ok(value) => match value.to_ascii_lowercase().as_str() {
                "cascade" => DeletePolicy::Cascade,
                "protect" => DeletePolicy::Protect,
                other => panic!("LIST_DELETE_POLICY should be cascade or protect, got {other:?}"),
            },
            Err(_) => DeletePolicy::Cascade,
        };

        Config {
            database_url,
            bind_addr,
            session_key,
            list_delete_policy,
        }
    }

    /// Key for signing session cookies. Without `SESSION_KEY` a fresh key is
    /// generated, which invalidates sessions across restarts.
    pub fn cookie_key(&self) -> Key {
        match &self.session_key {
            Some(secret) => Key::from(secret.as_bytes()),
            None => Key::generate(),
        }
    }
}
