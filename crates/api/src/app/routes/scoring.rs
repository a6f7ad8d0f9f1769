//! Mutating routes. All of them run under the session middleware and act
//! only for the token that owns the match.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::app::services::ScorerServices;
use crate::app::{dto, errors};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id/innings/start", post(start_innings))
        .route("/:id/innings/end", post(end_innings))
        .route("/:id/balls", post(record_ball))
        .route("/:id/undo", post(undo_last_ball))
        .route("/:id/bowler", post(select_bowler))
        .route("/:id/batsman", post(select_batsman))
}

pub async fn start_innings(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::LineupRequest>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| {
        engine.start_innings(body.into())?;
        Ok(dto::MatchView::from(&*engine))
    }) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn record_ball(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::BallRequest>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let input = match body.into_input() {
        Ok(input) => input,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| engine.apply_ball(input)) {
        Ok(outcome) => {
            tracing::debug!(%match_id, sequence_id = outcome.ball.sequence_id, "ball recorded");
            (StatusCode::CREATED, Json(outcome)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn undo_last_ball(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| {
        let undone = engine.undo_last_ball()?;
        Ok((undone, dto::MatchView::from(&*engine)))
    }) {
        Ok((undone, view)) => (
            StatusCode::OK,
            Json(json!({ "undone": undone, "match": view })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn select_bowler(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PlayerRequest>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| {
        engine.select_bowler(body.player_id)?;
        Ok(dto::MatchView::from(&*engine))
    }) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn select_batsman(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PlayerRequest>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| {
        engine.select_batsman(body.player_id)?;
        Ok(dto::MatchView::from(&*engine))
    }) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn end_innings(
    Extension(services): Extension<Arc<ScorerServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.mutate(match_id, session.token(), |engine| engine.end_innings()) {
        Ok(transition) => (StatusCode::OK, Json(transition)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
