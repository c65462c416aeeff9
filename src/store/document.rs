use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys assigned by the store on write; input carrying them is ignored.
pub const STORE_FIELDS: &[&str] = &["id", "createdAt", "updatedAt"];

/// A stored section document: a camelCase JSON body plus store-assigned
/// identity and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: Map<String, Value>,
}

impl Document {
    pub fn new(body: Map<String, Value>) -> Self {
        let now = Utc::now();
        let mut doc = Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body,
        };
        doc.strip_store_fields();
        doc
    }

    fn strip_store_fields(&mut self) {
        for key in STORE_FIELDS {
            self.body.remove(*key);
        }
    }

    /// Merge a partial update into the body: supplied keys replace,
    /// everything else is untouched.
    pub fn merge(&mut self, updates: Map<String, Value>) {
        for (key, value) in updates {
            if STORE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.body.insert(key, value);
        }
        self.updated_at = Utc::now();
    }

    /// Look up a body value by dotted path, e.g. `gym.logo.url`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.body.get(first)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.body.get(key).and_then(Value::as_bool)
    }

    pub fn num_field(&self, key: &str) -> Option<f64> {
        self.body.get(key).and_then(Value::as_f64)
    }

    /// Wire representation: body fields plus id/createdAt/updatedAt.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(self.id.to_string()));
        for (k, v) in &self.body {
            map.insert(k.clone(), v.clone());
        }
        map.insert("createdAt".into(), Value::String(self.created_at.to_rfc3339()));
        map.insert("updatedAt".into(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        m
    }

    #[test]
    fn store_fields_are_stripped_from_input() {
        let doc = Document::new(body(vec![
            ("id", json!("injected")),
            ("title", json!("Push harder")),
        ]));
        assert!(doc.body.get("id").is_none());
        assert_eq!(doc.str_field("title"), Some("Push harder"));
    }

    #[test]
    fn merge_replaces_only_supplied_keys() {
        let mut doc = Document::new(body(vec![
            ("title", json!("Push harder")),
            ("order", json!(0)),
        ]));
        doc.merge(body(vec![("order", json!(5))]));
        assert_eq!(doc.num_field("order"), Some(5.0));
        assert_eq!(doc.str_field("title"), Some("Push harder"));
    }

    #[test]
    fn dotted_path_lookup() {
        let doc = Document::new(body(vec![(
            "gym",
            json!({"logo": {"url": "/uploads/logo.png"}}),
        )]));
        assert_eq!(
            doc.get_path("gym.logo.url").and_then(Value::as_str),
            Some("/uploads/logo.png")
        );
        assert!(doc.get_path("gym.missing.url").is_none());
    }

    #[test]
    fn wire_value_carries_identity_and_timestamps() {
        let doc = Document::new(body(vec![("title", json!("t"))]));
        let v = doc.to_value();
        assert!(v.get("id").is_some());
        assert!(v.get("createdAt").is_some());
        assert_eq!(v["title"], "t");
    }
}
