use std::fmt;

/// Error types for plan loading, graph building and rendering
#[derive(Debug)]
pub enum GraphError {
    /// Input bytes are not a valid plan document
    MalformedInput(String),

    /// Plan format major version is not supported
    SchemaVersion { found: String, supported: u64 },

    /// A mandatory top-level field is absent
    MissingField(&'static str),

    /// Unrecognized output format option
    UnsupportedFormat(String),

    /// Unrecognized group-by option
    UnsupportedGrouping(String),

    /// Input exceeded a safety bound (e.g. reference-chain depth)
    ResourceLimit(String),

    /// Internal invariant violated; should be unreachable on valid input
    Consistency(String),

    /// General I/O error
    Io(std::io::Error),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::MalformedInput(msg) => {
                write!(f, "Failed to parse plan document: {}", msg)
            }
            GraphError::SchemaVersion { found, supported } => {
                write!(
                    f,
                    "Unsupported plan format version '{}' (supported major version: {})",
                    found, supported
                )
            }
            GraphError::MissingField(field) => {
                write!(f, "Plan document is missing required field '{}'", field)
            }
            GraphError::UnsupportedFormat(format) => {
                write!(
                    f,
                    "Unsupported format '{}' (expected one of: graphviz, mermaid, plantuml)",
                    format
                )
            }
            GraphError::UnsupportedGrouping(group_by) => {
                write!(
                    f,
                    "Unsupported group-by '{}' (expected one of: module, action, resource_type)",
                    group_by
                )
            }
            GraphError::ResourceLimit(msg) => {
                write!(f, "Input exceeds safety limits: {}", msg)
            }
            GraphError::Consistency(msg) => {
                write!(f, "Internal consistency error: {}", msg)
            }
            GraphError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::Io(err)
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::MalformedInput(err.to_string())
    }
}
