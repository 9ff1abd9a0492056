use serde::Serialize;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

/// `{ "status": "success", "data": ... }` wrapper shared by every report endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub status: String,
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            detail: detail.into(),
        }
    }
}
