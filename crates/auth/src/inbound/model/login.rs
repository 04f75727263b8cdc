use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::permission::PermissionSet;
use crate::domain::entity::user::User;
use crate::domain::inout::login::LoginOutput;

// ╔════════════════════════════╗
// ║    Login                   ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct LoginRequest {
    // Absent and empty codes are both rejected by input validation.
    #[serde(default)]
    pub code: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub external_id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            email: user.email,
            username: user.username,
            avatar_url: user.avatar_url,
            profile_url: user.profile_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub permissions: PermissionSet,
    pub token: String,
}

impl From<LoginOutput> for LoginResponse {
    fn from(output: LoginOutput) -> Self {
        Self { user: output.user.into(), permissions: output.permissions, token: output.token }
    }
}

// ╔════════════════════════════╗
// ║    OAuth Callback          ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct CallbackRequest {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
