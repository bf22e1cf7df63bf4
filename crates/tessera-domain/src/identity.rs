//! Identity domain types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an identity.
///
/// Wire format: `i16` (10 = Active, 0 = Deleted). Only `Active` identities
/// are visible to lookups; deletion is a status flip, never a row delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    Deleted = 0,
    #[default]
    Active = 10,
}

impl IdentityStatus {
    /// Convert from the stored code. Returns `None` for unknown values.
    pub fn from_code(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Deleted),
            10 => Some(Self::Active),
            _ => None,
        }
    }

    /// Convert to the stored code.
    pub fn code(self) -> i16 {
        self as i16
    }
}
