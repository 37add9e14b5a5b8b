use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, users::dto::NewUser};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned after login or registration.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let username = self.username.trim().to_string();
        if !is_valid_username(&username) {
            return Err(AppError::InvalidInput("invalid username".into()));
        }
        if self.password.len() < 8 {
            return Err(AppError::InvalidInput("password too short".into()));
        }
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let phone = self.phone.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() || phone.is_empty() {
            return Err(AppError::InvalidInput(
                "first_name, last_name and phone are required".into(),
            ));
        }
        Ok(NewUser {
            username,
            password: self.password,
            first_name,
            last_name,
            phone,
        })
    }
}
