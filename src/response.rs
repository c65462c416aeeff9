use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Wrapper for API responses that automatically adds the success envelope:
/// `{ success, message?, count?, data? }`
#[derive(Debug)]
pub struct Envelope {
    data: Option<Value>,
    message: Option<String>,
    count: Option<usize>,
    status_code: StatusCode,
}

impl Envelope {
    /// 200 OK with a data payload
    pub fn data(data: impl Serialize) -> Self {
        Self {
            data: serde_json::to_value(data).ok(),
            message: None,
            count: None,
            status_code: StatusCode::OK,
        }
    }

    /// 200 OK with a list payload and its count
    pub fn list(items: Vec<Value>) -> Self {
        Self {
            count: Some(items.len()),
            data: Some(Value::Array(items)),
            message: None,
            status_code: StatusCode::OK,
        }
    }

    /// 200 OK with a message and data
    pub fn message_data(message: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            data: serde_json::to_value(data).ok(),
            message: Some(message.into()),
            count: None,
            status_code: StatusCode::OK,
        }
    }

    /// 200 OK with only a message (e.g. after a delete)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            count: None,
            status_code: StatusCode::OK,
        }
    }

    /// Override the status code (e.g. 201 for creates)
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// 201 Created with a message and the created document
    pub fn created(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::message_data(message, data).with_status(StatusCode::CREATED)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut body = Map::new();
        body.insert("success".into(), json!(true));
        if let Some(message) = self.message {
            body.insert("message".into(), json!(message));
        }
        if let Some(count) = self.count {
            body.insert("count".into(), json!(count));
        }
        if let Some(data) = self.data {
            body.insert("data".into(), data);
        }
        (self.status_code, Json(Value::Object(body))).into_response()
    }
}

/// Handler result alias used across the section handlers
pub type ApiResult = Result<Envelope, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_carries_count() {
        let env = Envelope::list(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(env.count, Some(2));
        assert_eq!(env.status_code, StatusCode::OK);
    }

    #[test]
    fn created_envelope_is_201() {
        let env = Envelope::created("Hero section created successfully", json!({}));
        assert_eq!(env.status_code, StatusCode::CREATED);
    }
}
