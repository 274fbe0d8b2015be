use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Privilege level of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May start transcodes and inspect the worker pool.
    Admin,
    /// Authenticated, but without elevated privilege.
    Viewer,
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
    pub role: Role,
    pub claims: HashMap<String, serde_json::Value>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, method: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            method: method.into(),
            role,
            claims: HashMap::new(),
        }
    }

    /// Identity used when authentication is disabled.
    pub fn local_admin() -> Self {
        Self::new("local_admin", "none", Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
