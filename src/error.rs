use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConftreeError {
    #[error("Syntax error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Invalid value for '{setting}' ({datatype}): {reason}")]
    Coerce {
        setting: String,
        datatype: String,
        reason: String,
    },

    #[error("Malformed schema: {0}")]
    SchemaShape(String),

    #[error("Translation for '{key}' failed: {reason}")]
    Translation { key: String, reason: String },

    #[error("Custom type '{module}' failed: {reason}")]
    CustomType { module: String, reason: String },
}
