//! エラー型定義 (sw-api)

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// sw-api のエラー型
#[derive(Error, Debug)]
pub enum ApiError {
    /// リクエストの形式が不正 (400)
    #[error("{0}")]
    BadRequest(String),

    /// トークン不一致 (403)
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Core(#[from] sw_core::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// HTTP ステータスへの対応
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Core(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            // 設定エラーも上流エラーも 500
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, ApiError>;
