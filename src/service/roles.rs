//! Role sourcing for user profiles

use crate::config::{RoleConfig, RoleSourceKind};
use crate::identity::UserRecord;
use serde_json::Value;
use std::sync::Arc;

/// Decides which roles a profile reports
pub trait RoleSource: Send + Sync {
    fn roles_for(&self, user: &UserRecord) -> Vec<String>;
}

/// Every user gets the same fixed roles
#[derive(Debug, Clone)]
pub struct StaticRoleSource {
    roles: Vec<String>,
}

impl StaticRoleSource {
    pub fn new(roles: Vec<String>) -> Self {
        Self { roles }
    }
}

impl Default for StaticRoleSource {
    fn default() -> Self {
        Self::new(vec!["user".to_string()])
    }
}

impl RoleSource for StaticRoleSource {
    fn roles_for(&self, _user: &UserRecord) -> Vec<String> {
        self.roles.clone()
    }
}

/// Roles from the `roles` custom claim (array of strings)
#[derive(Debug, Clone)]
pub struct CustomClaimRoleSource {
    defaults: Vec<String>,
}

impl CustomClaimRoleSource {
    pub fn new(defaults: Vec<String>) -> Self {
        Self { defaults }
    }
}

impl RoleSource for CustomClaimRoleSource {
    fn roles_for(&self, user: &UserRecord) -> Vec<String> {
        let roles: Vec<String> = match user.custom_claims.get("roles") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        if roles.is_empty() {
            self.defaults.clone()
        } else {
            roles
        }
    }
}

pub fn role_source_from_config(config: &RoleConfig) -> Arc<dyn RoleSource> {
    match config.source {
        RoleSourceKind::Static => Arc::new(StaticRoleSource::new(config.default_roles.clone())),
        RoleSourceKind::CustomClaims => {
            Arc::new(CustomClaimRoleSource::new(config.default_roles.clone()))
        }
    }
}
