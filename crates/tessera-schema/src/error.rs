use thiserror::Error;

/// Validation failures raised while turning raw JSON into a [`Document`].
///
/// In strict mode every variant is reachable. In partial mode only the
/// version check fails hard; all other problems degrade to omitted nodes
/// or defaulted fields.
///
/// [`Document`]: crate::Document
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unsupported document version {0}, expected 1")]
    UnsupportedVersion(u64),

    #[error("document `version` must be an integer")]
    InvalidVersion,

    #[error("document root must be a JSON object")]
    RootNotObject,

    #[error("expected a component object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("unknown component type `{0}`")]
    UnknownType(String),

    #[error("`{component}` is missing required field `{field}`")]
    MissingField {
        component: &'static str,
        field: &'static str,
    },

    #[error("`{component}.{field}` is invalid: {reason}")]
    InvalidField {
        component: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("`{component}` has unknown field `{field}`")]
    UnknownField {
        component: &'static str,
        field: String,
    },

    #[error("`{component}.{field}` has {len} entries, maximum is {max}")]
    CapExceeded {
        component: &'static str,
        field: &'static str,
        max: usize,
        len: usize,
    },
}

/// JSON type name used in error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
