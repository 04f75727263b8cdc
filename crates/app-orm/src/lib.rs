//! SeaORM entities for the identity store.

pub mod permissions;
pub mod prelude;
pub mod role_permissions;
pub mod roles;
pub mod schema;
pub mod user_roles;
pub mod users;
