use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginForm, LoginPage, NextQuery},
        extractors::{MaybeSessionUser, SessionUser, LOGIN_PATH},
        services::{authenticate, safe_next},
        session::SessionKeys,
    },
    errors::AppError,
    flash::{self, Message},
    state::AppState,
};

pub const DASHBOARD_PATH: &str = "/dashboard/";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", get(logout))
}

pub async fn index(MaybeSessionUser(user): MaybeSessionUser) -> Redirect {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH),
        None => Redirect::to(LOGIN_PATH),
    }
}

pub async fn login_form(
    MaybeSessionUser(user): MaybeSessionUser,
    jar: CookieJar,
    Query(q): Query<NextQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    let (jar, messages) = flash::take(jar);
    (
        jar,
        Json(LoginPage {
            username: None,
            next: q.next,
            messages,
        }),
    )
        .into_response()
}

#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    MaybeSessionUser(current): MaybeSessionUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to(DASHBOARD_PATH).into_response());
    }

    let Some(user) = authenticate(&state.db, form.username.trim(), &form.password).await? else {
        let (jar, mut messages) = flash::take(jar);
        messages.push(Message::error("Invalid username or password."));
        return Ok((
            jar,
            Json(LoginPage {
                username: Some(form.username),
                next: form.next,
                messages,
            }),
        )
            .into_response());
    };

    let keys = SessionKeys::from(&state.config.session);
    let token = keys.sign(user.id)?;
    let jar = jar.add(keys.cookie(token));
    let jar = flash::push(jar, Message::success(format!("Welcome back, {}!", user.username)));

    info!(user_id = %user.id, "user logged in");
    let dest = safe_next(form.next.as_deref(), DASHBOARD_PATH);
    Ok((jar, Redirect::to(&dest)).into_response())
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let keys = SessionKeys::from(&state.config.session);
    let jar = jar.remove(keys.removal());
    let jar = flash::push(jar, Message::success("You have been logged out successfully."));
    info!(%user_id, "user logged out");
    (jar, Redirect::to(LOGIN_PATH))
}
