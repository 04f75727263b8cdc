use chrono::{DateTime, Utc};

/// A locally stored account, created on first login through the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub external_id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: i64,
    pub external_id: i64,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub profile_url: String,
}

/// Provider-owned fields that are refreshed on every returning login.
///
/// `username` and `avatar_url` are only written on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRefresh {
    pub external_id: i64,
    pub email: String,
    pub profile_url: String,
}
