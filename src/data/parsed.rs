use serde_json::{Map, Value};

/// A nested provider column after parsing. Overture columns such as `names`
/// or `cartography` arrive either as JSON objects or as JSON text, depending
/// on the download format.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedField {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Failure,
}

impl ParsedField {
    pub fn parse(value: &Value) -> ParsedField {
        match value {
            Value::Object(map) => ParsedField::Object(map.clone()),
            Value::Array(items) => ParsedField::Array(items.clone()),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => ParsedField::Object(map),
                Ok(Value::Array(items)) => ParsedField::Array(items),
                _ => ParsedField::Failure,
            },
            _ => ParsedField::Failure,
        }
    }

    /// Look up `key` in the object, or in the first element of the array.
    ///
    /// `None` means the key is absent (or the field did not parse);
    /// `Some(Value::Null)` means the key is present with a null value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            ParsedField::Object(map) => map.get(key),
            ParsedField::Array(items) => items.first()?.as_object()?.get(key),
            ParsedField::Failure => None,
        }
    }
}

/// Read `key` out of a nested column, collapsing absence into null.
pub fn extract(value: Option<&Value>, key: &str) -> Value {
    value
        .map(ParsedField::parse)
        .and_then(|field| field.get(key).cloned())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_is_used_directly() {
        let field = ParsedField::parse(&json!({"primary": "Clock Tower", "common": null}));
        assert_eq!(field.get("primary"), Some(&json!("Clock Tower")));
        assert_eq!(field.get("common"), Some(&Value::Null));
        assert_eq!(field.get("rules"), None);
    }

    #[test]
    fn json_text_is_parsed() {
        let field = ParsedField::parse(&json!(r#"{"min_zoom": 7, "max_zoom": 12}"#));
        assert!(matches!(field, ParsedField::Object(_)));
        assert_eq!(field.get("max_zoom"), Some(&json!(12)));
    }

    #[test]
    fn array_uses_first_element() {
        let field = ParsedField::parse(&json!(r#"[{"dataset": "meta"}, {"dataset": "msft"}]"#));
        assert!(matches!(field, ParsedField::Array(_)));
        assert_eq!(field.get("dataset"), Some(&json!("meta")));

        let empty = ParsedField::parse(&json!([]));
        assert_eq!(empty.get("dataset"), None);
    }

    #[test]
    fn other_values_fail() {
        assert_eq!(ParsedField::parse(&json!("not json")), ParsedField::Failure);
        assert_eq!(ParsedField::parse(&json!(42)), ParsedField::Failure);
        assert_eq!(ParsedField::parse(&json!("3")), ParsedField::Failure);
        assert_eq!(ParsedField::parse(&Value::Null), ParsedField::Failure);
    }

    #[test]
    fn extract_collapses_to_null() {
        let names = json!({"primary": "Paltan Bazaar"});
        assert_eq!(extract(Some(&names), "primary"), json!("Paltan Bazaar"));
        assert_eq!(extract(Some(&names), "secondary"), Value::Null);
        assert_eq!(extract(None, "primary"), Value::Null);
    }
}
