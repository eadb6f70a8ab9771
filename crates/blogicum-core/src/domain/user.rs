use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{REQUIRED, Validate, ValidationErrors, is_valid_email, is_valid_username};

pub const USERNAME_MAX: usize = 150;
pub const NAME_MAX: usize = 150;
pub const PASSWORD_MIN: usize = 8;

/// User entity - an account that writes posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Roles carried in access tokens.
    pub fn roles(&self) -> Vec<String> {
        let mut roles = vec!["user".to_string()];
        if self.is_staff {
            roles.push("admin".to_string());
        }
        roles
    }
}

/// Fields of the profile edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
}

impl Validate for ProfileChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_username(&mut errors, &self.username);
        errors.max_chars("first_name", &self.first_name, Some(NAME_MAX));
        errors.max_chars("last_name", &self.last_name, Some(NAME_MAX));
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()
    }
}

/// A user about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub profile: ProfileChanges,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Registration input, before the password is hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub profile: ProfileChanges,
    pub password: String,
}

impl Validate for Registration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.profile.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.profile.email.is_empty() {
            errors.add("email", REQUIRED);
        }
        if self.password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN} characters."),
            );
        }
        errors.into_result()
    }
}

fn validate_username(errors: &mut ValidationErrors, username: &str) {
    errors.require_text("username", username, Some(USERNAME_MAX));
    if !username.is_empty() && !is_valid_username(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, email: &str) -> ProfileChanges {
        ProfileChanges {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_profile_validation() {
        assert!(profile("ada", "ada@example.com").validate().is_ok());
        assert!(profile("ada", "").validate().is_ok());

        let errors = profile("ada lovelace", "not-an-email").validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "email"]);
    }

    #[test]
    fn test_registration_requires_email_and_long_password() {
        let registration = Registration {
            profile: profile("ada", ""),
            password: "short".to_string(),
        };
        let errors = registration.validate().unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn test_staff_gets_admin_role() {
        let mut user = User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            is_staff: false,
            date_joined: Utc::now(),
        };
        assert_eq!(user.roles(), vec!["user".to_string()]);

        user.is_staff = true;
        assert!(user.roles().contains(&"admin".to_string()));
    }
}
