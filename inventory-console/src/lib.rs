pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod reports;
pub mod roles;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

use std::sync::Arc;

use api::{
    ApiClient, AuthApi, CategoryApi, DashboardApi, InvoiceApi, ProductApi, RoleApi, UserApi,
};
use config::Settings;
use error::Result;
use reports::{ApiReportSource, ReportService};
use services::{ProductSearch, UnitMeasureCache};
use session::SharedSession;
use workflow::{ApiBackend, ReconciliationFlow};

/// Every client and service of the console, wired against one backend and
/// one session.
#[derive(Clone)]
pub struct Console {
    pub session: SharedSession,
    pub auth: Arc<AuthApi>,
    pub categories: Arc<CategoryApi>,
    pub products: Arc<ProductApi>,
    pub invoices: Arc<InvoiceApi>,
    pub roles: Arc<RoleApi>,
    pub users: Arc<UserApi>,
    pub dashboard: Arc<DashboardApi>,
    pub units: UnitMeasureCache,
    pub reports: Arc<ReportService>,
    client: Arc<ApiClient>,
    settings: Arc<Settings>,
}

impl Console {
    pub fn new(settings: Settings, session: SharedSession) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&settings.api, session.clone())?);
        let secret = settings.crypto.secret.clone();

        let products = Arc::new(ProductApi::new(client.clone()));
        let invoices = Arc::new(InvoiceApi::new(client.clone()));
        let units = UnitMeasureCache::new(products.clone());
        let reports = Arc::new(ReportService::new(
            Arc::new(ApiReportSource::new(products.clone(), invoices.clone())),
            &settings.reports,
        ));

        tracing::debug!(base_url = %settings.api.base_url, "Console clients ready");
        Ok(Self {
            session,
            auth: Arc::new(AuthApi::new(client.clone(), secret.clone())),
            categories: Arc::new(CategoryApi::new(client.clone())),
            roles: Arc::new(RoleApi::new(client.clone())),
            users: Arc::new(UserApi::new(client.clone(), secret)),
            dashboard: Arc::new(DashboardApi::new(client.clone())),
            client,
            products,
            invoices,
            units,
            reports,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Seed the HTTP cookie jar from the cookies stored in the session.
    pub async fn restore_cookies(&self) -> Result<()> {
        let saved = self.session.read().await.auth_cookies.clone();
        if let Some(header) = saved {
            self.client.restore_cookies(&header)?;
        }
        Ok(())
    }

    /// Copy the jar into the session while a user is logged in, so a later
    /// process can resume the backend session.
    pub async fn persist_cookies(&self) -> Result<()> {
        let header = self.client.cookie_header()?;
        let mut session = self.session.write().await;
        session.auth_cookies = if session.is_authenticated() {
            header
        } else {
            None
        };
        Ok(())
    }

    /// Product auto-complete bound to the product listing.
    pub fn product_search(&self) -> ProductSearch {
        ProductSearch::new(self.products.clone(), &self.settings.search)
    }

    /// A new invoice reconciliation, starting idle.
    pub fn reconciliation(&self) -> ReconciliationFlow {
        ReconciliationFlow::new(self.backend(), self.units.clone(), &self.settings.workflow)
    }

    /// Reconcile an existing invoice. Fails unless it is still a draft.
    pub async fn edit_invoice(&self, invoice: &models::Invoice) -> Result<ReconciliationFlow> {
        if !invoice.estado.is_editable() {
            return Err(error::ConsoleError::Workflow(
                workflow::reconciliation::MSG_ONLY_DRAFTS_EDITABLE.to_string(),
            ));
        }
        let details = self.invoices.details(invoice.id).await?;
        let flow = ReconciliationFlow::for_invoice(
            self.backend(),
            self.units.clone(),
            &self.settings.workflow,
            invoice,
            &details,
        )?;
        self.session.write().await.select_invoice(invoice.id);
        Ok(flow)
    }

    fn backend(&self) -> Arc<ApiBackend> {
        Arc::new(ApiBackend::new(self.products.clone(), self.invoices.clone()))
    }
}
