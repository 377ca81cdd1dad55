// src/error.rs
//! Error handling for the instancing crate.
//!
//! Every error here is local and non-fatal. Callers usually treat
//! [`InstanceError::NotFound`] as "no override" and carry on.

use thiserror::Error;

use crate::property::PropertyKind;
use crate::registry::MemberHandle;

/// Main error type. Send + Sync + 'static so it can cross a shared registry.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InstanceError {
    /// Empty or otherwise unusable argument (e.g. an empty property name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No value stored under this property name.
    #[error("property not found: {0}")]
    NotFound(String),

    /// A value exists under `name`, but with a different kind than requested.
    #[error("type mismatch for '{name}': stored {expected:?}, requested {got:?}")]
    TypeMismatch {
        name: String,
        expected: PropertyKind,
        got: PropertyKind,
    },

    /// An external collaborator (render target, source material) is absent.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Handle does not refer to a live slot of this registry.
    #[error("unknown or stale member handle {0:?}")]
    UnknownMember(MemberHandle),

    /// Authored configuration could not be parsed or written.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Context chaining, like `.context()` in anyhow.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<InstanceError>,
    },
}

impl InstanceError {
    #[inline]
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Add context to any error (chainable).
    #[inline]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::WithContext {
            message: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through any context layers.
    pub fn root(&self) -> &InstanceError {
        match self {
            InstanceError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), InstanceError::NotFound(_))
    }

    #[inline]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.root(), InstanceError::TypeMismatch { .. })
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.root(), InstanceError::InvalidArgument(_))
    }
}

/// Convenient `Result` alias, use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, InstanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_root_kind() {
        let err = InstanceError::NotFound("_Color".into()).context("reading group 'fx'");
        assert!(err.is_not_found());
        assert!(!err.is_type_mismatch());
        assert_eq!(err.to_string(), "reading group 'fx': property not found: _Color");
    }

    #[test]
    fn type_mismatch_message_names_both_kinds() {
        let err = InstanceError::TypeMismatch {
            name: "_FillAmount".into(),
            expected: PropertyKind::Float,
            got: PropertyKind::Color,
        };
        assert!(err.is_type_mismatch());
        assert!(err.to_string().contains("Float"));
        assert!(err.to_string().contains("Color"));
    }
}
