use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Registration fields after validation. The password is still plain text;
/// the store hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Full profile. Carries no password hash.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub join_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}
