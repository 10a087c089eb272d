//! Operator session: logged-in user, permission codes, selected invoice.
//!
//! One `AppContext` is shared between the API client (which clears it on a
//! 401) and the command layer. It is loaded from disk at start-up and
//! written back when the command finishes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::role::{PERMISSION_ADMIN, PERMISSION_READ, PERMISSION_WRITE};
use crate::models::UserInfo;

pub type SharedSession = Arc<RwLock<AppContext>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppContext {
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub permissions: BTreeSet<u32>,
    #[serde(default)]
    pub selected_invoice_id: Option<i64>,
    /// `Cookie` header of the authenticated backend session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_cookies: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionFlags {
    pub is_admin: bool,
    pub is_read_only: bool,
    pub can_write: bool,
}

impl PermissionFlags {
    pub fn from_codes(codes: &BTreeSet<u32>) -> Self {
        let is_admin = codes.contains(&PERMISSION_ADMIN);
        let has_read = codes.contains(&PERMISSION_READ);
        let has_write = codes.contains(&PERMISSION_WRITE);

        Self {
            is_admin,
            is_read_only: !is_admin
                && has_read
                && !has_write
                && codes.iter().all(|code| *code == PERMISSION_READ),
            can_write: is_admin || (has_read && has_write),
        }
    }
}

impl AppContext {
    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn flags(&self) -> PermissionFlags {
        PermissionFlags::from_codes(&self.permissions)
    }

    pub fn set_session(&mut self, user: UserInfo, permissions: BTreeSet<u32>) {
        self.user = Some(user);
        self.permissions = permissions;
    }

    /// Forget the user and permissions; the selected invoice and the
    /// stored cookies go too.
    pub fn clear(&mut self) {
        self.user = None;
        self.permissions.clear();
        self.selected_invoice_id = None;
        self.auth_cookies = None;
    }

    pub fn select_invoice(&mut self, id: i64) {
        self.selected_invoice_id = Some(id);
    }

    pub fn clear_selected_invoice(&mut self) {
        self.selected_invoice_id = None;
    }

    /// Read a persisted context; a missing file yields an empty one.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No persisted session");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        tracing::debug!(path = %path.display(), "Session persisted");
        Ok(())
    }
}

/// Collapse a raw `permissions` array into numeric codes.
///
/// Bare numbers are kept as-is; `{id}` or `{code}` objects contribute their
/// numeric value. Everything else is dropped.
pub fn normalize_permissions(raw: &[Value]) -> BTreeSet<u32> {
    raw.iter()
        .filter_map(|entry| match entry {
            Value::Number(n) => n.as_u64(),
            Value::Object(obj) => obj
                .get("id")
                .or_else(|| obj.get("code"))
                .and_then(Value::as_u64),
            _ => None,
        })
        .filter_map(|code| u32::try_from(code).ok())
        .collect()
}
