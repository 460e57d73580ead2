//! Mapping of service failures onto HTTP responses.

use super::dto::ErrorBody;
use crate::task::{domain::TaskRequestError, services::TaskServiceError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation.
    #[error(transparent)]
    Validation(#[from] TaskRequestError),

    /// The request body or query string could not be read.
    #[error("{detail}")]
    Rejected {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Extractor message.
        detail: String,
    },

    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// A service call failed.
    #[error("{public}: {source}")]
    Internal {
        /// Message returned to the client.
        public: &'static str,
        /// Underlying failure, logged only.
        source: TaskServiceError,
    },
}

impl ApiError {
    /// Wraps a service failure behind a client-facing message.
    pub(crate) const fn internal(public: &'static str, source: TaskServiceError) -> Self {
        Self::Internal { public, source }
    }

    /// HTTP status of the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected { status, .. } => *status,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::Internal { public, source } => {
                error!(error = %source, "{public}");
                public.to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
