use app_core::jwt::Claims;
use serde::Serialize;

// ╔════════════════════════════╗
// ║    Session                 ║
// ╚════════════════════════════╝

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub permissions: Vec<String>,
    pub issued_at: usize,
    pub expires_at: usize,
}

impl From<Claims> for SessionResponse {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            username: claims.username,
            avatar_url: claims.avatar_url,
            profile_url: claims.profile_url,
            permissions: claims.permissions,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}
