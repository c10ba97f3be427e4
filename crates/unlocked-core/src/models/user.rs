// ABOUTME: User account model and role enum
// ABOUTME: Password hashes are kept on the record but never serialized
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModelParseError;

/// Role assigned to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum UserRole {
    /// Facility administrator, may manage every resource
    Admin,
    /// Learner, may only see their own data
    #[default]
    Student,
}

impl UserRole {
    /// Database/string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    /// Whether this role grants admin access
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "student" => Ok(Self::Student),
            _ => Err(ModelParseError::new("user role", s)),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = ModelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Given name
    pub name_first: String,
    /// Family name
    pub name_last: String,
    /// Contact email
    pub email: String,
    /// Bcrypt password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account role
    pub role: UserRole,
    /// Set when the user must choose a new password at next login
    pub password_reset: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds the admin role
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("STUDENT".parse::<UserRole>(), Ok(UserRole::Student));
        assert!("instructor".parse::<UserRole>().is_err());
    }

    #[test]
    fn role_deserializes_case_insensitively() {
        let role: UserRole = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
        assert!(serde_json::from_str::<UserRole>("\"warden\"").is_err());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: 7,
            username: "jdoe".to_owned(),
            name_first: "Jane".to_owned(),
            name_last: "Doe".to_owned(),
            email: "jdoe@example.com".to_owned(),
            password_hash: "$2b$04$secret".to_owned(),
            role: UserRole::Student,
            password_reset: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "student");
    }
}
