use std::fmt;

use crate::ast::BackrefTarget;

/// Malformed pattern. `offset` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render cancelled")]
    Cancelled,
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("malformed geometry: {0}")]
    Geometry(String),
}

impl RenderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Non-fatal diagnostics collected while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnresolvedReference(BackrefTarget),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference(BackrefTarget::Index(index)) => {
                write!(f, "unresolved backreference to group {index}")
            }
            Self::UnresolvedReference(BackrefTarget::Name(name)) => {
                write!(f, "unresolved backreference to group \"{name}\"")
            }
        }
    }
}
