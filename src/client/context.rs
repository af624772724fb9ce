//! Current user, as supplied by the authentication layer.
//!
//! Only the user id is used by the progress core (to namespace the local cache);
//! the role gates authoring operations such as pushing content.

use serde::{Deserialize, Serialize};

use crate::client::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: u64,
    user_role: UserRole,
}

impl UserContext {
    pub fn new(user_id: u64, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    pub fn student(user_id: u64) -> Self {
        Self::new(user_id, UserRole::Student)
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role
    }

    pub fn can_edit_content(&self) -> bool {
        matches!(self.user_role, UserRole::Instructor | UserRole::Admin)
    }

    pub fn require_editor(&self) -> ClientResult<()> {
        if self.can_edit_content() {
            Ok(())
        } else {
            Err(ClientError::Forbidden(format!(
                "role `{}` cannot edit course content",
                self.user_role
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "instructor" | "teacher" => Self::Instructor,
            _ => Self::Student,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Instructor => write!(f, "instructor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn role_parse_test() {
        assert_eq!(UserRole::from("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::from("teacher"), UserRole::Instructor);
        assert_eq!(UserRole::from("whatever"), UserRole::Student);
    }

    #[test]
    fn editor_gate_test() {
        assert!(UserContext::new(1, UserRole::Instructor).require_editor().is_ok());
        assert!(UserContext::new(1, UserRole::Admin).can_edit_content());
        assert!(matches!(
            UserContext::student(1).require_editor(),
            Err(ClientError::Forbidden(_))
        ));
    }
}
