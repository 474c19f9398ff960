use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::{error, warn};

use super::models::ErrorResponse;
use super::validation::IdListError;
use crate::countdown::CountdownError;
use crate::upstream::{FirestoreError, MediaKind, UpstreamError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidSlug(#[from] CountdownError),
    #[error("{kind} ids: {source}")]
    InvalidIdList {
        kind: MediaKind,
        #[source]
        source: IdListError,
    },
    #[error("no {0} items found")]
    NotFound(MediaKind),
    #[error("{0}")]
    DocumentStore(#[from] FirestoreError),
    #[error("{kind} lookup failed: {source}")]
    Youtube {
        kind: MediaKind,
        #[source]
        source: UpstreamError,
    },
    #[error("{0}")]
    Bilibili(UpstreamError),
    #[error("{0}")]
    ImageProxy(UpstreamError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidSlug(_) | ApiError::InvalidIdList { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DocumentStore(_)
            | ApiError::Youtube { .. }
            | ApiError::Bilibili(_)
            | ApiError::ImageProxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short summary placed in the `error` field
    pub fn summary(&self) -> &'static str {
        match self {
            ApiError::InvalidSlug(_) => "Invalid slug format or date parse error",
            ApiError::InvalidIdList { kind: MediaKind::Channel, .. } => "頻道 ID 數量需介於 1 到 50 之間",
            ApiError::InvalidIdList { kind: MediaKind::Video, .. } => "影片 ID 數量需介於 1 到 50 之間",
            ApiError::NotFound(MediaKind::Channel) => "找不到任何頻道資料",
            ApiError::NotFound(MediaKind::Video) => "找不到任何影片資料",
            ApiError::DocumentStore(_) => "Failed to fetch data from Firestore",
            ApiError::Youtube { kind: MediaKind::Channel, .. } => "無法取得頻道資料",
            ApiError::Youtube { kind: MediaKind::Video, .. } => "無法取得影片資料",
            ApiError::Bilibili(_) => "無法取得 Bilibili 資料",
            ApiError::ImageProxy(_) => "圖片代理失敗",
        }
    }

    fn body(&self) -> ErrorResponse {
        let error = self.summary();
        let detail = self.to_string();

        match self {
            ApiError::Bilibili(_) | ApiError::ImageProxy(_) => ErrorResponse::Message {
                error,
                message: detail,
            },
            _ => ErrorResponse::Details {
                error,
                details: detail,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else if let ApiError::InvalidSlug(err) = &self {
            warn!(status = status.as_u16(), kind = err.kind(), error = %self, "Rejected slug");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
