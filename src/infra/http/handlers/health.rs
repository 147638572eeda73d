use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blogo_api_types::MessageResponse;

use crate::application::error::ErrorReport;
use crate::infra::http::AppState;

pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}

pub async fn db_health(State(state): State<AppState>) -> Response {
    let Some(db) = state.db.as_ref() else {
        let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
        ErrorReport::from_message(
            "infra::http::db_health",
            StatusCode::SERVICE_UNAVAILABLE,
            "no database attached",
        )
        .attach(&mut response);
        return response;
    };

    match db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
