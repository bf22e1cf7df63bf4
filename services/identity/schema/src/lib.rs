//! sea-orm entities for the identity service tables.

pub mod auth_assignments;
pub mod auth_roles;
pub mod departments;
pub mod identities;
