use crate::commands::porcelain::compare::CompareError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Compare(CompareError::RepositoryNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Compare(CompareError::UnknownRevision { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Compare(CompareError::Other(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Compare(CompareError::Other(err)) => format!("An error occurred: {err:#}"),
            ApiError::Internal(message) => format!("An error occurred: {message}"),
            ApiError::Compare(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            log::error!("{detail}");
        } else {
            log::warn!("{self:?}");
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}
