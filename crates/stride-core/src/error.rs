use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrideError {
    #[error("parse error at line {position}: {reason}")]
    Parse { reason: String, position: usize },

    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("validation error: missing {0}")]
    Validation(String),

    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    #[error("unknown agent '{name}'. Available agents: {available}")]
    UnknownAgent { name: String, available: String },

    #[error("invalid sprint state: {0}")]
    InvalidSprintState(String),

    #[error("invalid document kind: {0}")]
    InvalidDocumentKind(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl StrideError {
    pub fn parse(reason: impl Into<String>, position: usize) -> Self {
        StrideError::Parse {
            reason: reason.into(),
            position,
        }
    }

    /// The bare reason for a parse error, without position decoration.
    pub fn reason(&self) -> Option<&str> {
        match self {
            StrideError::Parse { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StrideError>;
