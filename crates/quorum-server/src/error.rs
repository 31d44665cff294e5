use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use quorum_forum::ForumError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Forum(#[from] ForumError),

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Registration is closed on this instance")]
    RegistrationClosed,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Forum(e) => (forum_status(e), self.to_string()),
            ServerError::MissingToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::RegistrationClosed => (StatusCode::FORBIDDEN, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn forum_status(e: &ForumError) -> StatusCode {
    use quorum_forum::AuthError;
    match e {
        // Sign-up form rejections are client errors, not auth failures.
        ForumError::Auth(AuthError::EmailTaken) => StatusCode::CONFLICT,
        ForumError::Auth(
            AuthError::WeakPassword | AuthError::InvalidEmail | AuthError::MissingDisplayName,
        ) => StatusCode::BAD_REQUEST,
        ForumError::Auth(_) => StatusCode::UNAUTHORIZED,
        ForumError::NotAuthor | ForumError::SelfVote => StatusCode::FORBIDDEN,
        ForumError::QuestionHasAnswers => StatusCode::CONFLICT,
        ForumError::NotFound(_) => StatusCode::NOT_FOUND,
        ForumError::Validation(_) => StatusCode::BAD_REQUEST,
        ForumError::Store(_) | ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_forum::AuthError;

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(
            forum_status(&ForumError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(forum_status(&ForumError::SelfVote), StatusCode::FORBIDDEN);
        assert_eq!(
            forum_status(&ForumError::NotFound("question")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            forum_status(&ForumError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            forum_status(&ForumError::QuestionHasAnswers),
            StatusCode::CONFLICT
        );
    }
}
