use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::state::AppState;

/// Claims of a staff session token issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// Look for a staff session on every request. A missing or invalid session
/// is logged and the request continues; valid claims are attached as an
/// extension for handlers that want them.
pub async fn observe_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    match token {
        None => warn!("No active session for {} {}", req.method(), req.uri().path()),
        Some(token) => match decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(state.session_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => {
                debug!("Active session found for {}", data.claims.sub);
                req.extensions_mut().insert(data.claims);
            }
            Err(e) => warn!("Ignoring invalid session token: {}", e),
        },
    }

    next.run(req).await
}
