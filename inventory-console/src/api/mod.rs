//! Typed bindings for the inventory backend, one module per resource.

pub mod auth;
pub mod categories;
pub mod client;
pub mod dashboard;
pub mod invoices;
pub mod products;
pub mod roles;
pub mod users;

pub use auth::AuthApi;
pub use categories::CategoryApi;
pub use client::{Ack, ApiClient, ApiResponse};
pub use dashboard::{DashboardApi, MotivationalMessage};
pub use invoices::{InvoiceApi, InvoiceQuery};
pub use products::ProductApi;
pub use roles::RoleApi;
pub use users::{ProfileEdit, UserApi};

/// `page`/`limit`/`active` query shared by categories, roles and users.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub active: Option<bool>,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            active: None,
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(active) = self.active {
            pairs.push(("active", active.to_string()));
        }
        pairs
    }
}
