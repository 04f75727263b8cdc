pub mod login;
pub mod session;

pub mod prelude {
    pub use super::login::*;
    pub use super::session::*;
}
