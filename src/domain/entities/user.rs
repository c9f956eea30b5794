use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use validator::{Validate, ValidationError};
use uuid::Uuid;

/// Width of the `VARCHAR` columns holding user-supplied text.
pub const MAX_TEXT_CHARS: usize = 255;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserInsert {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Username is required"),
        custom(function = "fits_column")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format"),
        custom(function = "fits_column")
    )]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl NewUser {
    /// Trims the username and normalizes the email; run before `validate`.
    pub fn normalized(self) -> Self {
        NewUser {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }

    pub fn prepare_for_insert(&self, password_hash: String) -> UserInsert {
        let now = Utc::now();
        UserInsert {
            username: self.username.clone(),
            email: self.email.clone(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginUser {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUserResponse {
    pub id: Uuid,
    pub message: String,
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn fits_column(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::new("length")
            .with_message(Cow::from(format!("Must be at most {MAX_TEXT_CHARS} characters"))));
    }
    Ok(())
}
