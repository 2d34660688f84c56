use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Outer `None` means the key was absent; `Some(None)` is an explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// Any JSON value; coerced to a boolean when present, `null` included.
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Value>,
}

fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

/// JavaScript truthiness of a JSON value.
pub(crate) fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completed_distinguishes_absent_from_null() {
        let absent: UpdateTodoRequest = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert!(absent.completed.is_none());

        let null: UpdateTodoRequest = serde_json::from_value(json!({"completed": null})).unwrap();
        assert_eq!(null.completed, Some(Value::Null));
    }

    #[test]
    fn text_fields_distinguish_absent_from_null() {
        let absent: UpdateTodoRequest = serde_json::from_value(json!({})).unwrap();
        assert!(absent.title.is_none());
        assert!(absent.description.is_none());

        let null: UpdateTodoRequest =
            serde_json::from_value(json!({"title": null, "description": null})).unwrap();
        assert_eq!(null.title, Some(None));
        assert_eq!(null.description, Some(None));

        let set: UpdateTodoRequest = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(set.title, Some(Some("x".to_string())));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(serde_json::from_value::<UpdateTodoRequest>(json!({"title": 5})).is_err());
        assert!(serde_json::from_value::<CreateTodoRequest>(json!({"description": []})).is_err());
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("false")));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!({})));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&Value::Null));
    }
}
