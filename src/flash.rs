//! One-shot messages that survive a redirect, stored in a cookie until the
//! next page renders them.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "trainerhub_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Level::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Level::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Level::Error, text)
    }
}

fn read(jar: &CookieJar) -> Vec<Message> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| urlencoding::decode(c.value()).ok())
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// Queues `msg` for the next rendered page.
pub fn push(jar: CookieJar, msg: Message) -> CookieJar {
    let mut pending = read(&jar);
    debug!(level = ?msg.level, text = %msg.text, "flash queued");
    pending.push(msg);
    let json = serde_json::to_string(&pending).unwrap_or_else(|_| "[]".into());
    let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&json).into_owned()))
        .path("/")
        .http_only(true);
    jar.add(cookie)
}

/// Drains queued messages, clearing the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Message>) {
    let pending = read(&jar);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, pending);
    }
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_take() {
        let jar = CookieJar::new();
        let jar = push(jar, Message::success("Welcome back, user1!"));
        let jar = push(jar, Message::warning("second; with, odd \"chars\""));

        let (jar, msgs) = take(jar);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0], Message::success("Welcome back, user1!"));
        assert_eq!(msgs[1].level, Level::Warning);
        assert_eq!(msgs[1].text, "second; with, odd \"chars\"");

        let (_, again) = take(jar);
        assert!(again.is_empty());
    }

    #[test]
    fn empty_jar_has_no_messages() {
        let (_, msgs) = take(CookieJar::new());
        assert!(msgs.is_empty());
    }

    #[test]
    fn levels_serialize_lowercase() {
        let json = serde_json::to_string(&Message::error("x")).unwrap();
        assert_eq!(json, r#"{"level":"error","text":"x"}"#);
    }
}
