//! Session gate. Every dashboard route sits behind [`require_session`];
//! requests without credentials are sent to the sign-in page, requests with
//! rejected credentials get a 401.

use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;
use url::form_urlencoded;

use crate::errors::AppError;
use crate::state::AppState;

/// Decides whether a bearer token belongs to a signed-in user.
pub trait SessionProvider: Send + Sync {
    fn is_authenticated(&self, token: &str) -> bool;
}

/// Fixed set of tokens from `SESSION_TOKENS`.
pub struct StaticTokenSessions {
    tokens: HashSet<String>,
}

impl StaticTokenSessions {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl SessionProvider for StaticTokenSessions {
    fn is_authenticated(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// The authenticated caller's token, inserted as a request extension.
/// Also the key of the caller's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(pub String);

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Sign-in URL that sends the user back to `path` afterwards.
fn sign_in_target(auth_redirect: &str, path: &str) -> String {
    let next: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{auth_redirect}?next={next}")
}

pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(&req).map(String::from) else {
        let target = sign_in_target(&state.config.auth_redirect, req.uri().path());
        debug!("No session on {}; redirecting to {target}", req.uri().path());
        return Redirect::to(&target).into_response();
    };

    if !state.sessions.is_authenticated(&token) {
        return AppError::Unauthorized.into_response();
    }

    req.extensions_mut().insert(SessionToken(token));
    next.run(req).await
}
