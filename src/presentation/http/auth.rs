use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::application::ports::identity::AuthUser;
use crate::application::use_cases::auth::complete_sign_in::CompleteSignIn;
use crate::application::use_cases::auth::current_user::GetCurrentUser;
use crate::application::use_cases::auth::sign_out::SignOut;
use crate::bootstrap::app_context::AppContext;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/sign-in", get(sign_in))
        .route("/callback", get(callback))
        .route("/signout", post(signout))
        .with_state(ctx)
}

pub async fn sign_in(State(ctx): State<AppContext>) -> Redirect {
    let redirect_uri = ctx.cfg.callback_url();
    Redirect::temporary(&ctx.identity().authorize_url(&redirect_uri))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
}

/// OAuth redirect URI. Exchanges the inbound code for a session, persists it
/// as cookies on the outgoing redirect response, and collapses every failure
/// into the `/?error=auth_failed` marker instead of surfacing detail.
pub async fn callback(
    State(ctx): State<AppContext>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return auth_failed_redirect();
    };

    let identity = ctx.identity();
    let uc = CompleteSignIn {
        identity: identity.as_ref(),
    };
    let (session, user) = match uc.execute(code, &ctx.cfg.callback_url()).await {
        Ok(ok) => ok,
        Err(err) => {
            error!(error = %err, "sign_in_failed");
            return auth_failed_redirect();
        }
    };
    info!(user = %user.id, "user_signed_in");

    let next = sanitize_next(params.next.as_deref());
    let max_age = session.expires_in.unwrap_or(ctx.cfg.session_max_age_secs);
    let secure = ctx.cfg.cookie_secure();

    // Cookies must ride on the actual redirect response, and the redirect
    // itself must never be served from a cache.
    let mut response = Redirect::temporary(&next).into_response();
    let headers = response.headers_mut();
    append_set_cookie(
        headers,
        &build_cookie(ACCESS_COOKIE, &session.access_token, max_age, secure),
    );
    if let Some(refresh) = &session.refresh_token {
        append_set_cookie(headers, &build_cookie(REFRESH_COOKIE, refresh, max_age, secure));
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, must-revalidate"),
    );
    response
}

pub async fn signout(State(ctx): State<AppContext>, token: Option<SessionToken>) -> Response {
    if let Some(SessionToken(token)) = token {
        let identity = ctx.identity();
        SignOut {
            identity: identity.as_ref(),
        }
        .execute(&token)
        .await;
    }
    let secure = ctx.cfg.cookie_secure();
    // 303 so the browser lands back on the root page with a GET.
    let mut response = Redirect::to("/").into_response();
    let headers = response.headers_mut();
    append_set_cookie(headers, &clear_cookie(ACCESS_COOKIE, secure));
    append_set_cookie(headers, &clear_cookie(REFRESH_COOKIE, secure));
    response
}

fn auth_failed_redirect() -> Response {
    Redirect::temporary("/?error=auth_failed").into_response()
}

/// Keeps the post-login target on this origin and strips the OAuth
/// bookkeeping parameters (`code`, `next`) from whatever query string the
/// target carries.
pub(crate) fn sanitize_next(next: Option<&str>) -> String {
    let raw = next.unwrap_or("/").trim();
    if raw.is_empty() || !raw.starts_with('/') || raw.starts_with("//") {
        return "/".to_string();
    }
    let (path, query) = match raw.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (raw, None),
    };
    let kept: Vec<&str> = query
        .map(|q| {
            q.split('&')
                .filter(|pair| {
                    let key = pair.split('=').next().unwrap_or("");
                    !pair.is_empty() && key != "code" && key != "next"
                })
                .collect()
        })
        .unwrap_or_default();
    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, kept.join("&"))
    }
}

// --- Session extraction ---
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Opaque provider-issued access token, taken from the Authorization header
/// or from the HttpOnly cookie set by the callback.
pub struct SessionToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(t) = auth.strip_prefix("Bearer ") {
                return Ok(SessionToken(t.to_string()));
            }
        }

        if let Some(cookie_hdr) = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(token) = get_cookie(cookie_hdr, ACCESS_COOKIE) {
                return Ok(SessionToken(token));
            }
        }

        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Resolves the token to a user at the identity service; a dead token is
/// indistinguishable from no token.
pub(crate) async fn require_user(
    ctx: &AppContext,
    token: &SessionToken,
) -> Result<AuthUser, StatusCode> {
    let identity = ctx.identity();
    let uc = GetCurrentUser {
        identity: identity.as_ref(),
    };
    uc.execute(&token.0)
        .await
        .map_err(|err| {
            error!(error = ?err, "user_lookup_failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)
}

// --- Cookie helpers ---

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    // Note: SameSite=Lax suits the same-origin pages + API this service
    // serves. Cross-site deployments need SameSite=None; Secure plus CSRF
    // protection.
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        name,
        value,
        secure_attr,
        max_age_secs.max(0)
    )
}

fn clear_cookie(name: &str, secure: bool) -> String {
    build_cookie(name, "", 0, secure)
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(v) => {
            headers.append(header::SET_COOKIE, v);
        }
        // A dropped cookie leaves the caller signed out; leave a trace.
        Err(err) => warn!(error = %err, "set_cookie_dropped"),
    }
}
