use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crease_core::SessionToken;

use crate::app::errors;
use crate::context::SessionContext;

pub const SESSION_HEADER: &str = "x-session-token";

pub async fn session_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_session_token(req.headers())?;
    req.extensions_mut().insert(SessionContext::new(token));
    Ok(next.run(req).await)
}

pub fn extract_session_token(headers: &HeaderMap) -> Result<SessionToken, Response> {
    let header = headers.get(SESSION_HEADER).ok_or_else(|| {
        errors::json_error(
            StatusCode::UNAUTHORIZED,
            "missing_session",
            format!("{SESSION_HEADER} header is required"),
        )
    })?;

    header
        .to_str()
        .ok()
        .map(str::trim)
        .and_then(|t| t.parse::<SessionToken>().ok())
        .ok_or_else(|| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_session",
                "session token is not a valid identifier",
            )
        })
}
