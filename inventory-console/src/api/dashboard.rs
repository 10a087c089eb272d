use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client::{ApiClient, ApiResponse};
use crate::error::Result;

const MOTIVATIONAL_MESSAGE_PATH: &str = "/motivational-message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationalMessage {
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

pub struct DashboardApi {
    client: Arc<ApiClient>,
}

impl DashboardApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn motivational_message(&self) -> Result<MotivationalMessage> {
        let response: ApiResponse<MotivationalMessage> =
            self.client.get(MOTIVATIONAL_MESSAGE_PATH, &[]).await?;
        response.into_data("mensaje motivacional")
    }
}
