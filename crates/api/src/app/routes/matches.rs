use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};

use crease_scoring::TeamSide;
use crease_stats::{over_summaries, rebuild};

use crate::app::services::{CreateError, ScorerServices};
use crate::app::{dto, errors};
use crate::middleware::extract_session_token;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_match))
        .route("/:id", get(get_match))
        .route("/:id/scorecard", get(get_scorecard))
        .route("/:id/persistence", get(get_persistence))
        .route("/:id/session", post(claim_session).delete(release_session))
}

pub async fn create_match(
    Extension(services): Extension<Arc<ScorerServices>>,
    Json(body): Json<dto::CreateMatchRequest>,
) -> axum::response::Response {
    let setup = match body.into_setup() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_match(setup) {
        Ok(engine) => (
            StatusCode::CREATED,
            Json(dto::MatchCreatedResponse {
                match_id: engine.match_id(),
                roster: engine.roster().clone(),
            }),
        )
            .into_response(),
        Err(CreateError::Domain(e)) => errors::domain_error_to_response(e),
        Err(CreateError::Store(e)) => errors::store_error_to_response(e),
    }
}

pub async fn get_match(
    Extension(services): Extension<Arc<ScorerServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.read(match_id, |engine| dto::MatchView::from(engine)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_scorecard(
    Extension(services): Extension<Arc<ScorerServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let card = services.read(match_id, |engine| {
        let balls = engine.ledger().as_slice();
        Ok::<_, crease_events::ProjectionError>(dto::ScorecardResponse {
            team_a: rebuild(engine.roster(), balls, TeamSide::A)?,
            team_b: rebuild(engine.roster(), balls, TeamSide::B)?,
            overs: over_summaries(balls, engine.current().number),
        })
    });

    match card {
        Ok(Ok(card)) => (StatusCode::OK, Json(card)).into_response(),
        Ok(Err(e)) => {
            tracing::error!(%match_id, error = %e, "scorecard projection failed");
            errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "projection_error", e.to_string())
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_persistence(
    Extension(services): Extension<Arc<ScorerServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.persistence(match_id) {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn claim_session(
    Extension(services): Extension<Arc<ScorerServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.registry.claim(match_id) {
        Ok(token) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "match_id": match_id,
                "session_token": token,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn release_session(
    Extension(services): Extension<Arc<ScorerServices>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> axum::response::Response {
    let match_id = match errors::parse_match_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let token = match extract_session_token(&headers) {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    match services.registry.release(match_id, token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
