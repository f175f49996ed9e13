use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account kinds. Each role has its own table and its own signup/login path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
    Teacher,
    Coordinator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Coordinator => "coordinator",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "coordinator" => Some(Role::Coordinator),
            _ => None,
        }
    }

    /// Table backing this account kind.
    pub fn table(&self) -> &'static str {
        match self {
            Role::Admin => "admins",
            Role::Student => "students",
            Role::Teacher => "teachers",
            Role::Coordinator => "coordinators",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// "student" until promoted to "volunteer"
    pub role: String,
    pub institution_id: Uuid,
    pub grace_marks: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn is_volunteer(&self) -> bool {
        self.role == "volunteer"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub institution_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coordinator {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub institution_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Admin, Role::Student, Role::Teacher, Role::Coordinator] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("volunteer"), None);
    }

    #[test]
    fn volunteer_flag_follows_the_role_column() {
        let mut student = Student {
            id: Uuid::new_v4(),
            name: "Divya Menon".to_string(),
            email: "divya@example.com".to_string(),
            password_hash: String::new(),
            role: "student".to_string(),
            institution_id: Uuid::new_v4(),
            grace_marks: 0,
            is_verified: true,
            created_at: Utc::now(),
        };
        assert!(!student.is_volunteer());
        student.role = "volunteer".to_string();
        assert!(student.is_volunteer());
    }
}
