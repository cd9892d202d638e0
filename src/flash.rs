//! One-shot notifications carried in the session across a redirect and
//! drained on the next page render.

use actix_session::Session;

const FLASH_KEY: &str = "_flash";

/// Queue a message for the next rendered page.
pub fn push(session: &Session, message: impl Into<String>) {
    let mut queue: Vec<String> = session.get(FLASH_KEY).ok().flatten().unwrap_or_default();
    queue.push(message.into());
    if let Err(err) = session.insert(FLASH_KEY, queue) {
        log::warn!("dropping flash message: {err}");
    }
}

/// Drain all queued messages. A second call returns nothing.
pub fn take(session: &Session) -> Vec<String> {
    let queue: Vec<String> = session.get(FLASH_KEY).ok().flatten().unwrap_or_default();
    if !queue.is_empty() {
        session.remove(FLASH_KEY);
    }
    queue
}
