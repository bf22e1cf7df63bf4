pub mod identity;
pub mod role_sync;
