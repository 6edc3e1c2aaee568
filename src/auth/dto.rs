use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::repo_types::User, flash::Message};

/// Login form body (urlencoded).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Context of the login page.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub username: Option<String>,
    pub next: Option<String>,
    pub messages: Vec<Message>,
}

/// Public part of a user shown on pages.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            is_staff: u.is_privileged(),
        }
    }
}
