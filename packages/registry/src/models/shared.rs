use serde::Serialize;

/// Outcome marker carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Uniform response envelope returned by every endpoint.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = "OK")]
    pub status: ResponseStatus,
    /// `Success`, or the error description when `status` is `ERROR`.
    #[schema(example = "Success")]
    pub message: String,
    /// Payload; always `null` on error.
    pub data: Option<T>,
}

/// Payload of responses that carry no data.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Empty;

impl<T> ApiResponse<T> {
    pub fn okay(data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: "Success".into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<Empty> {
    pub fn okay_empty() -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: "Success".into(),
            data: None,
        }
    }
}
