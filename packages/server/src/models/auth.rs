use common::package_manifest::FieldErrors;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Request body for account registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Account name, also used as the default team name.
    #[schema(example = "ModAuthor99")]
    pub username: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

/// Field-keyed validation, same shape the submission pipeline reports.
pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        push(
            &mut errors,
            "username",
            format!("Must be 1-{MAX_USERNAME_LEN} characters"),
        );
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        push(
            &mut errors,
            "username",
            "Only letters, digits, and underscores are allowed".into(),
        );
    }

    let len = payload.password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        push(
            &mut errors,
            "password",
            format!("Must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::FormErrors(errors))
    }
}

/// Request body for logging in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ModAuthor99")]
    pub username: String,
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Both username and password are required".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
}

impl From<common::entity::user::Model> for RegisterResponse {
    fn from(user: common::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub username: String,
}

/// The authenticated account, as seen by the token presented.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub username: String,
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn register_collects_all_field_errors() {
        let err = validate_register_request(&register("bad name!", "short")).unwrap_err();
        match err {
            AppError::FormErrors(errors) => {
                assert!(errors.contains_key("username"));
                assert!(errors.contains_key("password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn register_rejects_overlong_username() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert!(validate_register_request(&register(&long, "long enough")).is_err());
    }

    #[test]
    fn register_accepts_valid_input() {
        assert!(validate_register_request(&register("Mod_Author99", "long enough")).is_ok());
    }

    #[test]
    fn login_requires_both_fields() {
        let payload = LoginRequest {
            username: "  ".to_string(),
            password: "pw".to_string(),
        };
        assert!(validate_login_request(&payload).is_err());
    }
}
