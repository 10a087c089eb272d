pub mod category;
pub mod invoice;
mod lenient;
pub mod product;
pub mod role;
pub mod user;

pub use category::{Category, CategoryForm};
pub use invoice::{
    Invoice, InvoiceDetail, InvoiceHeaderUpdate, InvoicePayload, InvoicePayloadLine,
    InvoiceStatus, OcrInvoice, OcrLine,
};
pub use product::{Product, ProductForm, ProductQuery, StockLevel, UnitMeasure, UnitRef};
pub use role::{PermissionInfo, Role, RoleRequest};
pub use user::{
    LoginRequest, LoginResponse, PasswordUpdate, ProfileUpdate, RegisterPayload,
    RegisterRequest, UserInfo, UserMutationResponse,
};

/// Uniform page handed to callers; every listing endpoint maps into it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
        }
    }
}
