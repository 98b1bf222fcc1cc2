/// Response envelope
///
/// Every response body, success or failure, has the same shape:
///
/// ```json
/// {
///   "status": { "code": 200, "message": "Item retrieved successfully." },
///   "data": { "item": { "id": "..." } },
///   "errors": ["..."]
/// }
/// ```
///
/// `data` and `errors` are omitted when empty. The HTTP status always equals
/// `status.code`.
///
/// # Example
///
/// ```
/// use pantry_api::envelope::Envelope;
/// use serde_json::json;
///
/// let envelope = Envelope::created("Space created successfully.", json!({ "space": {} }));
/// assert_eq!(envelope.status.code, 201);
/// ```
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// `status` member of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(skip)]
    http_status: StatusCode,

    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> Envelope<T> {
    fn new(http_status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            http_status,
            status: Status {
                code: http_status.as_u16(),
                message: message.into(),
            },
            data: None,
            errors: None,
        }
    }

    /// 200 with data
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::new(StatusCode::OK, message)
        }
    }

    /// 201 with data
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::new(StatusCode::CREATED, message)
        }
    }

    pub fn http_status(&self) -> StatusCode {
        self.http_status
    }
}

/// Envelopes without a `data` member
pub type Message = Envelope<()>;

impl Envelope<()> {
    /// 200 with only a message, e.g. after a delete
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }

    /// Error envelope; an empty error list is omitted
    pub fn error(http_status: StatusCode, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            errors: (!errors.is_empty()).then_some(errors),
            ..Self::new(http_status, message)
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_envelope_shape() {
        let envelope = Envelope::ok("Item retrieved successfully.", json!({ "item": { "id": 1 } }));
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "status": { "code": 200, "message": "Item retrieved successfully." },
                "data": { "item": { "id": 1 } }
            })
        );
    }

    #[test]
    fn test_message_envelope_omits_data_and_errors() {
        let value = serde_json::to_value(Envelope::message("Item deleted successfully.")).unwrap();
        assert_eq!(
            value,
            json!({ "status": { "code": 200, "message": "Item deleted successfully." } })
        );
    }

    #[test]
    fn test_error_envelope() {
        let envelope = Envelope::error(
            StatusCode::NOT_FOUND,
            "Item not found.",
            vec!["Item does not exist or you do not have permission to access it.".to_string()],
        );
        assert_eq!(envelope.http_status(), StatusCode::NOT_FOUND);

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"]["code"], 404);
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_created_status() {
        let response = Envelope::created("Space created successfully.", json!({})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
