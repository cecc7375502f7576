use serde::Serialize;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

/// User joined with its role name. The password hash never leaves the server.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub token: Option<String>,
    pub role: String,
    pub status: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Serialize)]
pub struct AuthToken {
    pub email: String,
    pub token: String,
}
