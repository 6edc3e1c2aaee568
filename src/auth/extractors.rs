use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;
use uuid::Uuid;

use super::session::{SessionKeys, SESSION_COOKIE};

pub const LOGIN_PATH: &str = "/login/";

fn session_user_id(parts: &Parts, keys: &SessionKeys) -> Option<Uuid> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(SESSION_COOKIE)?;
    match keys.verify(token.value()) {
        Ok(claims) => Some(claims.sub),
        Err(e) => {
            debug!(error = %e, "discarding invalid session cookie");
            None
        }
    }
}

/// Signed-in caller. Anonymous requests are sent to the login page with a
/// `next` pointing back here.
pub struct SessionUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        match session_user_id(parts, &keys) {
            Some(id) => Ok(SessionUser(id)),
            None => {
                let here = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&format!(
                    "{}?next={}",
                    LOGIN_PATH,
                    urlencoding::encode(here)
                )))
            }
        }
    }
}

/// Caller identity on routes open to everyone.
pub struct MaybeSessionUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        Ok(MaybeSessionUser(session_user_id(parts, &keys)))
    }
}
