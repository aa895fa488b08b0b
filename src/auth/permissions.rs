use anyhow::Error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    CreateSessions,
    EditSessions,
    DeleteSessions,
    ViewAttendance,

    MarkAttendance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainer,
    Student,
}

static TRAINER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::CreateSessions);
    permissions.insert(Permission::EditSessions);
    permissions.insert(Permission::DeleteSessions);
    permissions.insert(Permission::ViewAttendance);

    permissions
});

static STUDENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::MarkAttendance);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Trainer => &TRAINER_PERMISSIONS,
            Role::Student => &STUDENT_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Trainer => "trainer",
            Role::Student => "student",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "trainer" => Ok(Role::Trainer),
            "student" => Ok(Role::Student),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Trainer => write!(f, "trainer"),
            Role::Student => write!(f, "student"),
        }
    }
}
