//! Account records and auth payloads

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Access token issued by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Payload for creating an account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegister {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegister")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Partial update of the signed-in account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Password change for the signed-in account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

/// Start of the emailed password reset flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Completion of a password reset with the emailed token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

impl fmt::Debug for PasswordResetConfirm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordResetConfirm { .. }")
    }
}

/// Plain acknowledgement returned by account endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_passwords() {
        let register = UserRegister {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter2".to_string(),
            full_name: None,
        };
        let change = PasswordChange {
            current_password: "hunter2".to_string(),
            new_password: "correct horse".to_string(),
        };
        let confirm = PasswordResetConfirm {
            token: "reset".to_string(),
            new_password: "correct horse".to_string(),
        };

        for debug in [format!("{:?}", register), format!("{:?}", change), format!("{:?}", confirm)] {
            assert!(!debug.contains("hunter2"));
            assert!(!debug.contains("correct horse"));
        }
        assert!(format!("{:?}", register).contains("alice"));
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            full_name: Some("Alice A.".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"full_name":"Alice A."}"#);
    }
}
