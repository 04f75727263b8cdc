use std::sync::Arc;

use app_core::jwt::{SessionSubject, TokenManager};

use crate::domain::entity::permission::PermissionSet;
use crate::domain::entity::user::User;
use crate::domain::error::LoginErrorKind;

/// Signs the session token handed back to the frontend.
pub struct TokenIssuer {
    token: Arc<dyn TokenManager>,
}

impl TokenIssuer {
    pub fn new(token: Arc<dyn TokenManager>) -> Self {
        Self { token }
    }

    pub fn issue(&self, user: &User, permissions: &PermissionSet) -> Result<String, LoginErrorKind> {
        let subject = SessionSubject {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
            profile_url: user.profile_url.clone(),
            permissions: permissions.to_vec(),
        };

        Ok(self.token.create_session_token(&subject)?)
    }
}
