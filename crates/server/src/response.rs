//! Success response envelopes.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"data": ...}` wrapper used by every JSON success response.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Payload for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Payload for endpoints that report a yes/no outcome.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub ok: bool,
}

/// `{"data": {"message": ...}}`
#[must_use]
pub const fn message(message: &'static str) -> DataResponse<Message> {
    DataResponse::new(Message { message })
}

/// `{"data": {"ok": ...}}`
#[must_use]
pub const fn ok(ok: bool) -> DataResponse<Outcome> {
    DataResponse::new(Outcome { ok })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes_serialize_under_data() {
        assert_eq!(
            serde_json::to_value(message("Vorschlag eingereicht")).unwrap(),
            serde_json::json!({ "data": { "message": "Vorschlag eingereicht" } })
        );
        assert_eq!(
            serde_json::to_value(ok(false)).unwrap(),
            serde_json::json!({ "data": { "ok": false } })
        );
    }
}
