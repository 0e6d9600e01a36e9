use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{UserError, UserResult};

/// Raw create/update input: field name to JSON string or number.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

#[cfg(test)]
impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

impl Fields {
    /// The value for `key`, treating `null` and blank strings as absent.
    pub fn present(&self, key: &str) -> Option<&Value> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            v => Some(v),
        }
    }

    /// `true` when the key was sent as an empty or whitespace-only string.
    pub fn is_blank(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::String(s)) if s.trim().is_empty())
    }

    /// String value as sent. Numbers are accepted in their textual form.
    pub fn text(&self, key: &str) -> UserResult<Option<String>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(UserError::coercion(key, "expected a string")),
        }
    }

    /// Integer value, from a JSON integer or a base-10 string.
    pub fn integer<T: TryFrom<i64>>(&self, key: &str) -> UserResult<Option<T>> {
        let wide = match self.present(key) {
            None => return Ok(None),
            Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => i,
                // 36.0 counts as 36
                (None, Some(f))
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
                {
                    f as i64
                }
                _ => return Err(UserError::coercion(key, format!("'{}' is not an integer", n))),
            },
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| UserError::coercion(key, format!("'{}' is not an integer", s)))?,
            Some(_) => return Err(UserError::coercion(key, "expected an integer")),
        };
        T::try_from(wide)
            .map(Some)
            .map_err(|_| UserError::coercion(key, format!("{} is out of range", wide)))
    }
}

impl From<HashMap<String, String>> for Fields {
    fn from(form: HashMap<String, String>) -> Self {
        Self(
            form.into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_and_null_values_count_as_absent() {
        let fields: Fields =
            serde_json::from_value(json!({"first_name": "  ", "last_name": null})).unwrap();
        assert!(fields.present("first_name").is_none());
        assert!(fields.present("last_name").is_none());
        assert!(fields.is_blank("first_name"));
        assert!(!fields.is_blank("last_name"));
        assert!(!fields.is_blank("location"));
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let fields = Fields::new().with("age", 36).with("phone_number", " 5551234 ");
        assert_eq!(fields.integer::<i32>("age").unwrap(), Some(36));
        assert_eq!(fields.integer::<i64>("phone_number").unwrap(), Some(5551234));
        assert_eq!(fields.integer::<i32>("missing").unwrap(), None);

        let whole_float = Fields::new().with("age", 36.0);
        assert_eq!(whole_float.integer::<i32>("age").unwrap(), Some(36));
    }

    #[test]
    fn integers_reject_garbage_fractions_and_overflow() {
        let fields = Fields::new()
            .with("age", "not-a-number")
            .with("phone_number", 12.5)
            .with("big", 10_000_000_000_i64)
            .with("flag", true);
        assert!(matches!(
            fields.integer::<i32>("age"),
            Err(UserError::Coercion { field, .. }) if field == "age"
        ));
        assert!(fields.integer::<i64>("phone_number").is_err());
        assert!(fields.integer::<i32>("big").is_err());
        assert!(fields.integer::<i64>("big").is_ok());
        assert!(fields.integer::<i32>("flag").is_err());
    }

    #[test]
    fn text_accepts_numbers_but_not_structures() {
        let fields = Fields::new().with("location", 42).with("last_name", json!(["x"]));
        assert_eq!(fields.text("location").unwrap().as_deref(), Some("42"));
        assert!(fields.text("last_name").is_err());
    }

    #[test]
    fn form_maps_become_string_fields() {
        let form = HashMap::from([("age".to_string(), "41".to_string())]);
        let fields = Fields::from(form);
        assert_eq!(fields.integer::<i32>("age").unwrap(), Some(41));
    }
}
