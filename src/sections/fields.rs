//! Field decoding and validation over a write payload.
//!
//! Every accessor records violations into a shared [`FieldErrors`] collector
//! so a failing request reports all of them at once. Array- and
//! object-valued fields accept either the native JSON structure or a
//! JSON-encoded string; the string case is resolved here, once, at the
//! input boundary. A malformed encoded string fails the field (and with it
//! the request) before anything is persisted.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ApiError, FieldError};

/// Aggregates every violated constraint for one request.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fail the request with every collected violation, or pass.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_failed(self.errors))
        }
    }
}

/// Read-side view over the raw payload fields.
pub struct FieldMap {
    fields: Map<String, Value>,
}

impl FieldMap {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Plain non-empty string read, used outside validation (media url/alt
    /// parameters resolved after the request has already passed).
    pub fn str_value(&self, key: &str) -> Option<String> {
        match self.raw(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    // ---- strings ----

    pub fn required_str(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<String> {
        match self.raw(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) | None => {
                errors.push(key, format!("{} is required", label));
                None
            }
            Some(_) => {
                errors.push(key, format!("{} must be a string", label));
                None
            }
        }
    }

    pub fn required_str_max(
        &self,
        key: &str,
        label: &str,
        max: usize,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let value = self.required_str(key, label, errors)?;
        if value.chars().count() > max {
            errors.push(key, format!("{} must be under {} characters", label, max));
            return None;
        }
        Some(value)
    }

    /// Present-or-absent string; present values only need to be strings.
    pub fn optional_str(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<String> {
        match self.raw(key) {
            None => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                errors.push(key, format!("{} must be a string", label));
                None
            }
        }
    }

    /// Present values must be non-empty (update-side "cannot be empty").
    pub fn optional_nonempty_str(
        &self,
        key: &str,
        label: &str,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let value = self.optional_str(key, label, errors)?;
        if value.is_empty() {
            errors.push(key, format!("{} cannot be empty", label));
            return None;
        }
        Some(value)
    }

    pub fn optional_str_max(
        &self,
        key: &str,
        label: &str,
        max: usize,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let value = self.optional_str(key, label, errors)?;
        if value.chars().count() > max {
            errors.push(key, format!("{} must be under {} characters", label, max));
            return None;
        }
        Some(value)
    }

    // ---- enums ----

    pub fn required_enum(
        &self,
        key: &str,
        label: &str,
        allowed: &[&str],
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let value = self.required_str(key, label, errors)?;
        if !allowed.contains(&value.as_str()) {
            errors.push(key, format!("Invalid {}", label.to_lowercase()));
            return None;
        }
        Some(value)
    }

    pub fn optional_enum(
        &self,
        key: &str,
        label: &str,
        allowed: &[&str],
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let value = self.optional_nonempty_str(key, label, errors)?;
        if !allowed.contains(&value.as_str()) {
            errors.push(key, format!("Invalid {}", label.to_lowercase()));
            return None;
        }
        Some(value)
    }

    // ---- booleans ----

    /// Accepts a JSON boolean or the form-encoded strings "true"/"false".
    pub fn optional_bool(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<bool> {
        match self.raw(key) {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => {
                    errors.push(key, format!("{} must be a boolean", label));
                    None
                }
            },
            Some(_) => {
                errors.push(key, format!("{} must be a boolean", label));
                None
            }
        }
    }

    pub fn required_bool(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<bool> {
        if !self.has(key) {
            errors.push(key, format!("{} must be a boolean", label));
            return None;
        }
        self.optional_bool(key, label, errors)
    }

    // ---- numbers ----

    /// Accepts a JSON number or a form-encoded numeric string.
    pub fn optional_f64(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<f64> {
        match self.raw(key) {
            None => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(key, format!("{} must be a number", label));
                    None
                }
            },
            Some(_) => {
                errors.push(key, format!("{} must be a number", label));
                None
            }
        }
    }

    pub fn required_f64_min(
        &self,
        key: &str,
        label: &str,
        min: f64,
        errors: &mut FieldErrors,
    ) -> Option<f64> {
        if !self.has(key) {
            errors.push(key, format!("{} is required", label));
            return None;
        }
        self.optional_f64_min(key, label, min, errors)
    }

    pub fn optional_f64_min(
        &self,
        key: &str,
        label: &str,
        min: f64,
        errors: &mut FieldErrors,
    ) -> Option<f64> {
        let value = self.optional_f64(key, label, errors)?;
        if value < min {
            errors.push(key, format!("{} must be a positive number", label));
            return None;
        }
        Some(value)
    }

    pub fn optional_f64_range(
        &self,
        key: &str,
        label: &str,
        min: f64,
        max: f64,
        errors: &mut FieldErrors,
    ) -> Option<f64> {
        let value = self.optional_f64(key, label, errors)?;
        if value < min || value > max {
            errors.push(
                key,
                format!("{} must be between {} and {}", label, min, max),
            );
            return None;
        }
        Some(value)
    }

    pub fn optional_i64(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<i64> {
        let value = self.optional_f64(key, label, errors)?;
        if value.fract() != 0.0 {
            errors.push(key, format!("{} must be an integer", label));
            return None;
        }
        Some(value as i64)
    }

    pub fn optional_i64_min(
        &self,
        key: &str,
        label: &str,
        min: i64,
        errors: &mut FieldErrors,
    ) -> Option<i64> {
        let value = self.optional_i64(key, label, errors)?;
        if value < min {
            errors.push(key, format!("{} must be a positive integer", label));
            return None;
        }
        Some(value)
    }

    pub fn required_i64_range(
        &self,
        key: &str,
        label: &str,
        min: i64,
        max: i64,
        errors: &mut FieldErrors,
    ) -> Option<i64> {
        if !self.has(key) {
            errors.push(key, format!("{} must be between {} and {}", label, min, max));
            return None;
        }
        let value = self.optional_i64(key, label, errors)?;
        if value < min || value > max {
            errors.push(key, format!("{} must be between {} and {}", label, min, max));
            return None;
        }
        Some(value)
    }

    // ---- email ----

    pub fn optional_email(&self, key: &str, errors: &mut FieldErrors) -> Option<String> {
        let value = self.optional_nonempty_str(key, "Email", errors)?;
        let value = value.to_lowercase();
        if !is_valid_email(&value) {
            errors.push(key, "Valid email is required");
            return None;
        }
        Some(value)
    }

    pub fn required_email(&self, key: &str, errors: &mut FieldErrors) -> Option<String> {
        if !self.has(key) {
            errors.push(key, "Valid email is required");
            return None;
        }
        self.optional_email(key, errors)
    }

    // ---- structured fields (native JSON or JSON-encoded string) ----

    /// Resolve the dual encoding: a string payload is parsed as JSON, any
    /// other value passes through untouched.
    fn resolve_encoded(&self, key: &str, label: &str, errors: &mut FieldErrors) -> Option<Value> {
        match self.raw(key)? {
            Value::String(s) => match serde_json::from_str(s) {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(key, format!("{} must be valid JSON", label));
                    None
                }
            },
            other => Some(other.clone()),
        }
    }

    /// Structured field deserialized into a concrete shape.
    pub fn structured<T: DeserializeOwned>(
        &self,
        key: &str,
        label: &str,
        errors: &mut FieldErrors,
    ) -> Option<T> {
        let value = self.resolve_encoded(key, label, errors)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.push(key, format!("{} is invalid", label));
                None
            }
        }
    }

    /// Structured object kept as a raw JSON value (free-form sub-trees).
    pub fn structured_object(
        &self,
        key: &str,
        label: &str,
        errors: &mut FieldErrors,
    ) -> Option<Map<String, Value>> {
        match self.resolve_encoded(key, label, errors)? {
            Value::Object(map) => Some(map),
            _ => {
                errors.push(key, format!("{} must be an object", label));
                None
            }
        }
    }

    /// Required array of non-empty strings with a minimum length
    /// (features, certifications, description paragraphs).
    pub fn string_array(
        &self,
        key: &str,
        label: &str,
        min: usize,
        errors: &mut FieldErrors,
    ) -> Option<Vec<String>> {
        if !self.has(key) {
            errors.push(key, format!("At least one {} is required", label.to_lowercase()));
            return None;
        }
        let items: Vec<String> = self.structured(key, label, errors)?;
        let items: Vec<String> = items.iter().map(|s| s.trim().to_string()).collect();
        if items.len() < min || items.iter().any(String::is_empty) {
            errors.push(key, format!("At least one {} is required", label.to_lowercase()));
            return None;
        }
        Some(items)
    }

    /// Optional variant of [`FieldMap::string_array`]: absent is fine,
    /// present must still be a well-formed array.
    pub fn optional_string_array(
        &self,
        key: &str,
        label: &str,
        errors: &mut FieldErrors,
    ) -> Option<Vec<String>> {
        if !self.has(key) {
            return None;
        }
        let items: Vec<String> = self.structured(key, label, errors)?;
        Some(items.iter().map(|s| s.trim().to_string()).collect())
    }
}

pub(crate) fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: Vec<(&str, Value)>) -> FieldMap {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        FieldMap::new(m)
    }

    #[test]
    fn required_str_trims_and_rejects_blank() {
        let map = fields(vec![("title", json!("  Push harder  ")), ("subtitle", json!("   "))]);
        let mut errors = FieldErrors::new();
        assert_eq!(
            map.required_str("title", "Title", &mut errors),
            Some("Push harder".to_string())
        );
        assert!(map.required_str("subtitle", "Subtitle", &mut errors).is_none());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn every_violation_is_reported() {
        let map = fields(vec![("category", json!("not-a-category"))]);
        let mut errors = FieldErrors::new();
        map.required_str("title", "Title", &mut errors);
        map.required_enum("category", "Category", &["yoga"], &mut errors);
        let err = errors.into_result().unwrap_err();
        match err {
            ApiError::ValidationFailed { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn structured_accepts_native_and_encoded_forms() {
        let native = fields(vec![("features", json!(["a", "b"]))]);
        let encoded = fields(vec![("features", json!("[\"a\", \"b\"]"))]);
        let mut errors = FieldErrors::new();

        let from_native = native.string_array("features", "Feature", 1, &mut errors);
        let from_encoded = encoded.string_array("features", "Feature", 1, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(from_native, from_encoded);
    }

    #[test]
    fn malformed_encoded_string_fails_the_field() {
        let map = fields(vec![("features", json!("[not json"))]);
        let mut errors = FieldErrors::new();
        assert!(map.string_array("features", "Feature", 1, &mut errors).is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn booleans_accept_form_encoded_strings() {
        let map = fields(vec![("isActive", json!("false")), ("isFeatured", json!(true))]);
        let mut errors = FieldErrors::new();
        assert_eq!(map.optional_bool("isActive", "isActive", &mut errors), Some(false));
        assert_eq!(map.optional_bool("isFeatured", "isFeatured", &mut errors), Some(true));
        assert!(errors.is_empty());
    }

    #[test]
    fn numbers_accept_form_encoded_strings() {
        let map = fields(vec![("price", json!("49.99")), ("order", json!("3"))]);
        let mut errors = FieldErrors::new();
        assert_eq!(map.optional_f64_min("price", "Price", 0.0, &mut errors), Some(49.99));
        assert_eq!(map.optional_i64("order", "Order", &mut errors), Some(3));
        assert!(errors.is_empty());
    }

    #[test]
    fn rating_range_is_inclusive() {
        let map = fields(vec![("rating", json!(5))]);
        let mut errors = FieldErrors::new();
        assert_eq!(map.required_i64_range("rating", "Rating", 1, 5, &mut errors), Some(5));
        assert!(errors.is_empty());

        let map = fields(vec![("rating", json!(6))]);
        let mut errors = FieldErrors::new();
        assert!(map.required_i64_range("rating", "Rating", 1, 5, &mut errors).is_none());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("coach@studio.fit"));
        assert!(!is_valid_email("coach@studio"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@studio.fit"));
    }
}
