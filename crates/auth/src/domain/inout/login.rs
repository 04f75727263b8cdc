use validator::{Validate, ValidationError};

use crate::domain::entity::permission::PermissionSet;
use crate::domain::entity::user::User;

// ╔════════════════════════════╗
// ║         Login              ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct LoginInput {
    #[validate(custom(function = "not_blank"))]
    pub code: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub permissions: PermissionSet,
    pub token: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("authorization code is required".into()));
    }
    Ok(())
}
