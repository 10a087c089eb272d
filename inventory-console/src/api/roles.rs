use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::client::{Ack, ApiClient, ApiResponse};
use super::ListQuery;
use crate::error::{ConsoleError, Result};
use crate::models::{Page, PermissionInfo, Role, RoleRequest};

const ROLES_PATH: &str = "/roles";
const PERMISSIONS_PATH: &str = "/permisos";

#[derive(Debug, Deserialize)]
struct RoleListing {
    roles: Option<Vec<Value>>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: u32,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

pub struct RoleApi {
    client: Arc<ApiClient>,
}

impl RoleApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Roles with malformed entries dropped.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Role>> {
        let response: ApiResponse<RoleListing> =
            self.client.get(ROLES_PATH, &query.to_pairs()).await?;
        let listing = response.into_data("roles")?;
        let raw = listing
            .roles
            .ok_or_else(|| ConsoleError::Shape("data.roles".to_string()))?;

        let items: Vec<Role> = raw.iter().filter_map(Role::from_raw).collect();
        if items.len() != raw.len() {
            tracing::warn!(
                dropped = raw.len() - items.len(),
                "Discarded malformed role entries"
            );
        }

        Ok(Page {
            items,
            total: listing.total,
            page: listing.page,
            total_pages: listing.total_pages,
        })
    }

    pub async fn permissions(&self) -> Result<Vec<PermissionInfo>> {
        let response: ApiResponse<Vec<Value>> = self.client.get(PERMISSIONS_PATH, &[]).await?;
        let raw = response.into_data("permisos")?;
        Ok(raw.iter().filter_map(PermissionInfo::from_raw).collect())
    }

    pub async fn create(&self, request: &RoleRequest) -> Result<String> {
        let ack: Ack = self.client.post(ROLES_PATH, request).await?;
        ack_message(ack, "Rol creado")
    }

    pub async fn update(&self, role_id: i64, request: &RoleRequest) -> Result<String> {
        let path = format!("{}/{}", ROLES_PATH, role_id);
        let ack: Ack = self.client.put(&path, request).await?;
        ack_message(ack, "Rol actualizado")
    }
}

pub(crate) fn ack_message(ack: Ack, fallback: &str) -> Result<String> {
    let message = ack
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    if ack.success {
        Ok(message)
    } else {
        Err(ConsoleError::Rejected(message))
    }
}
