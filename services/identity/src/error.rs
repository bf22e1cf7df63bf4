use std::collections::BTreeSet;
use std::fmt;

use tessera_domain::id::IdentityId;

/// One failing field with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Per-field validation failures, reported together so a caller can fix
/// every field in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message reported for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// `Ok(())` when nothing was reported, otherwise `IdentityError::Validation`.
    pub fn into_result(self) -> Result<(), IdentityError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

/// Step of role reconciliation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSyncStage {
    /// Reading the roles currently assigned.
    Inspect,
    /// Looking up the desired role definition.
    Resolve,
    Revoke,
    Assign,
}

impl fmt::Display for RoleSyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inspect => "inspect",
            Self::Resolve => "resolve",
            Self::Revoke => "revoke",
            Self::Assign => "assign",
        };
        f.write_str(s)
    }
}

/// Identity store error variants.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("persistence failed")]
    Persistence(#[source] anyhow::Error),
    #[error("identity {identity_id} saved but role sync to {desired_role:?} failed at {stage}")]
    RoleSync {
        identity_id: IdentityId,
        desired_role: String,
        stage: RoleSyncStage,
        /// Roles assigned before reconciliation started.
        prior_roles: BTreeSet<String>,
        /// Whether the authority holds the same assignments as before the
        /// save, either untouched or re-assigned after a failed replace.
        /// `prior_roles` is empty when the failure happened while reading it.
        restored: bool,
        #[source]
        source: anyhow::Error,
    },
    #[error("role authority unavailable")]
    Authority(#[source] anyhow::Error),
    #[error("credential error")]
    Credential(#[source] anyhow::Error),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl IdentityError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "IDENTITY_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Persistence(_) => "PERSISTENCE_FAILED",
            Self::RoleSync { .. } => "ROLE_SYNC_FAILED",
            Self::Authority(_) => "ROLE_AUTHORITY_UNAVAILABLE",
            Self::Credential(_) => "CREDENTIAL_ERROR",
            Self::Unsupported(_) => "UNSUPPORTED_OPERATION",
        }
    }

    /// Whether the identity row was written before the failure occurred.
    pub fn row_saved(&self) -> bool {
        matches!(self, Self::RoleSync { .. })
    }

    /// Validation details, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
