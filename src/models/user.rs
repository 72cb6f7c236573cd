use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::form::FormErrors;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// An account that can sign in and own notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2id PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration form: a username and the password typed twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Validated registration data; the password is still in plain text.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(self) -> Result<NewAccount, FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim().to_string();
        if let Err(message) = ensure_valid_username(&username) {
            errors.add("username", message);
        }

        if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
            errors.add(
                "password1",
                format!("password must contain at least {PASSWORD_MIN_LENGTH} characters"),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "the two password fields didn't match");
        }

        errors.into_result(NewAccount {
            username,
            password: self.password1,
        })
    }
}

/// Sign-in form. `next` carries the page the visitor was sent away from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

pub fn ensure_valid_username(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len == 0 {
        return Err("this field is required".to_string());
    }
    if len > USERNAME_MAX_LENGTH {
        return Err(format!(
            "ensure this value has at most {USERNAME_MAX_LENGTH} characters"
        ));
    }
    let allowed = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !allowed {
        return Err(
            "enter a valid username: letters, digits and @/./+/-/_ only".to_string(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_signup() {
        let account = SignupForm {
            username: "  user1 ".to_string(),
            password1: "testpassword1".to_string(),
            password2: "testpassword1".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(account.username, "user1");
    }

    #[test]
    fn rejects_mismatched_and_short_passwords() {
        let errors = SignupForm {
            username: "user1".to_string(),
            password1: "short".to_string(),
            password2: "other".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("password1").is_some());
        assert!(errors.get("password2").is_some());
        assert!(errors.get("username").is_none());
    }

    #[test]
    fn username_rules() {
        assert!(ensure_valid_username("пользователь_1").is_ok());
        assert!(ensure_valid_username("john.doe+notes@example").is_ok());
        assert!(ensure_valid_username("").is_err());
        assert!(ensure_valid_username("has space").is_err());
        assert!(ensure_valid_username(&"u".repeat(USERNAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn username_check_does_not_log() {
        let logs = crate::test_support::captured_logs(|| {
            assert!(ensure_valid_username("has space").is_err());
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "user1".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
