//! Authorization roles.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The role that unlocks the admin panel.
pub const ADMIN_ROLE: &str = "admin";

/// One row of the role lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    pub role: String,
}

impl RoleRecord {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

/// The set of roles a user holds at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(ADMIN_ROLE)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<RoleRecord> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleRecord>>(iter: I) -> Self {
        Self(iter.into_iter().map(|record| record.role).collect())
    }
}

impl<'a> FromIterator<&'a str> for RoleSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// Lookup of the roles granted to a user.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists the role rows for `user_id`. Order is not significant.
    async fn list_roles(&self, user_id: &str) -> Result<Vec<RoleRecord>>;
}
