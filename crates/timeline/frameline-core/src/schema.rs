//! Input-prop schema and validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FramelineError, Result};

pub type InputProps = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// Runtime-checked as a string.
    Color,
}

impl PropType {
    fn matches(self, value: &Value) -> bool {
        match self {
            PropType::String | PropType::Color => value.is_string(),
            PropType::Number => value.is_number(),
            PropType::Boolean => value.is_boolean(),
            PropType::Object => value.is_object(),
            PropType::Array => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            PropType::String => "string",
            PropType::Number => "number",
            PropType::Boolean => "boolean",
            PropType::Object => "object",
            PropType::Array => "array",
            PropType::Color => "color (string)",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropDefinition {
    #[serde(rename = "type")]
    pub ty: PropType,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropDefinition {
    pub fn new(ty: PropType) -> Self {
        Self {
            ty,
            optional: false,
            default: None,
            minimum: None,
            maximum: None,
            allowed: None,
            label: None,
            description: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn with_enum(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn check(&self, key: &str, value: &Value) -> std::result::Result<(), String> {
        if !self.ty.matches(value) {
            return Err(format!(
                "invalid type for prop '{key}', expected {}",
                self.ty.describe()
            ));
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                let list: Vec<String> = allowed.iter().map(Value::to_string).collect();
                return Err(format!("prop '{key}' must be one of: {}", list.join(", ")));
            }
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.minimum {
                if n < min {
                    return Err(format!("prop '{key}' must be >= {min}"));
                }
            }
            if let Some(max) = self.maximum {
                if n > max {
                    return Err(format!("prop '{key}' must be <= {max}"));
                }
            }
        }
        Ok(())
    }
}

/// Prop name to definition, ordered for stable error reporting.
pub type InputSchema = BTreeMap<String, PropDefinition>;

/// Every default must satisfy its own definition.
pub fn validate_schema(schema: &InputSchema) -> Result<()> {
    for (key, def) in schema {
        if let (Some(min), Some(max)) = (def.minimum, def.maximum) {
            if min > max {
                return Err(FramelineError::InvalidSchema {
                    reason: format!("prop '{key}' has minimum {min} greater than maximum {max}"),
                });
            }
        }
        if let Some(default) = &def.default {
            def.check(key, default)
                .map_err(|reason| FramelineError::InvalidSchema { reason })?;
        }
    }
    Ok(())
}

/// Returns `props` with schema defaults filled in. Keys not in the schema pass through.
pub fn validate_props(props: &InputProps, schema: Option<&InputSchema>) -> Result<InputProps> {
    let Some(schema) = schema else {
        return Ok(props.clone());
    };
    let mut out = props.clone();
    for (key, def) in schema {
        match (props.get(key), &def.default) {
            (None, Some(default)) => {
                out.insert(key.clone(), default.clone());
            }
            (None, None) => {
                if !def.optional {
                    return Err(FramelineError::InvalidInputProps {
                        reason: format!("missing required prop: {key}"),
                    });
                }
            }
            (Some(value), _) => {
                def.check(key, value)
                    .map_err(|reason| FramelineError::InvalidInputProps { reason })?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> InputSchema {
        let mut s = InputSchema::new();
        s.insert("title".into(), PropDefinition::new(PropType::String));
        s.insert(
            "speed".into(),
            PropDefinition::new(PropType::Number)
                .with_range(Some(0.0), Some(10.0))
                .with_default(json!(1)),
        );
        s.insert(
            "mode".into(),
            PropDefinition::new(PropType::String)
                .optional()
                .with_enum(vec![json!("fast"), json!("slow")]),
        );
        s
    }

    fn props(v: Value) -> InputProps {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn fills_defaults_and_passes_unknown_keys() {
        let out = validate_props(&props(json!({"title": "x", "extra": 3})), Some(&schema())).unwrap();
        assert_eq!(out["speed"], json!(1));
        assert_eq!(out["extra"], json!(3));
    }

    #[test]
    fn rejects_missing_wrong_type_enum_and_range() {
        let s = schema();
        let cases = [
            json!({}),
            json!({"title": 5}),
            json!({"title": "x", "mode": "medium"}),
            json!({"title": "x", "speed": 11}),
        ];
        for case in cases {
            let err = validate_props(&props(case), Some(&s)).unwrap_err();
            assert_eq!(err.code(), "INVALID_INPUT_PROPS");
        }
    }

    #[test]
    fn schema_defaults_must_validate() {
        let mut s = InputSchema::new();
        s.insert(
            "n".into(),
            PropDefinition::new(PropType::Number)
                .with_range(Some(0.0), None)
                .with_default(json!(-1)),
        );
        assert_eq!(validate_schema(&s).unwrap_err().code(), "INVALID_SCHEMA");
        assert!(validate_schema(&schema()).is_ok());
    }

    #[test]
    fn deserializes_from_json() {
        let s: InputSchema = serde_json::from_value(json!({
            "color": {"type": "color", "default": "#fff"},
            "items": {"type": "array", "optional": true}
        }))
        .unwrap();
        assert_eq!(s["color"].ty, PropType::Color);
        assert!(s["items"].optional);
    }
}
