//! Newtype wrappers for domain identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies an identity (user account). Assigned by the identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Allocate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Uuid> for IdentityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Identifies a department (organisational unit an identity belongs to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub i32);

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reason a department reference string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepartmentRefError {
    #[error("department reference must be a number")]
    NotNumeric,
    #[error("department reference must be positive")]
    NotPositive,
}

impl FromStr for DepartmentId {
    type Err = DepartmentRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: i32 = s.parse().map_err(|_| DepartmentRefError::NotNumeric)?;
        if id <= 0 {
            return Err(DepartmentRefError::NotPositive);
        }
        Ok(Self(id))
    }
}

impl From<i32> for DepartmentId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
