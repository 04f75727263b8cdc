pub mod context;
pub mod issuer;
pub mod login;
pub mod reconciler;
pub mod resolver;
