use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::ReservationError;

/// Maps the core error taxonomy onto HTTP responses with the
/// `{success, message}` envelope the API uses everywhere.
#[derive(Debug)]
pub struct ApiError(pub ReservationError);

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReservationError::Validation(_) => StatusCode::BAD_REQUEST,
            ReservationError::ScreeningNotFound | ReservationError::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            ReservationError::Conflict { .. } | ReservationError::InvalidState => {
                StatusCode::CONFLICT
            }
            ReservationError::Expired => StatusCode::GONE,
        };

        let mut body = json!({
            "success": false,
            "message": self.0.to_string(),
        });
        if let ReservationError::Conflict { seats } = &self.0 {
            body["unavailableSeats"] = json!(seats);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        let cases = [
            (
                ReservationError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ReservationError::ScreeningNotFound, StatusCode::NOT_FOUND),
            (ReservationError::OrderNotFound, StatusCode::NOT_FOUND),
            (
                ReservationError::Conflict { seats: vec![1] },
                StatusCode::CONFLICT,
            ),
            (ReservationError::InvalidState, StatusCode::CONFLICT),
            (ReservationError::Expired, StatusCode::GONE),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }
}
