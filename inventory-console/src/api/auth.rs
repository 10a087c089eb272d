use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

use super::client::{Ack, ApiClient};
use crate::error::{ConsoleError, Result};
use crate::models::{LoginRequest, LoginResponse, UserInfo};
use crate::session::normalize_permissions;
use crate::utils::crypto::encrypt_password_hmac;

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";

pub struct AuthApi {
    client: Arc<ApiClient>,
    secret: Secret<String>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>, secret: Secret<String>) -> Self {
        Self { client, secret }
    }

    /// Sign in and populate the shared session.
    ///
    /// The password is HMAC-digested before it is sent. The returned user
    /// is normalized; only numeric permission codes are kept.
    pub async fn login(&self, correo: &str, password: &Secret<String>) -> Result<UserInfo> {
        let request = LoginRequest {
            correo: correo.trim().to_string(),
            password: encrypt_password_hmac(password.expose_secret(), &self.secret)?,
        };

        let response: LoginResponse = self.client.post(LOGIN_PATH, &request).await?;
        if !response.success {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Error en inicio de sesión".to_string());
            tracing::warn!(correo = %request.correo, "Login rejected");
            return Err(ConsoleError::Rejected(message));
        }

        let user = UserInfo::from_login(&response.user).map_err(ConsoleError::Shape)?;
        let permissions = normalize_permissions(response.permissions.as_deref().unwrap_or(&[]));

        tracing::info!(
            user_id = user.id,
            permissions = ?permissions,
            "Login succeeded"
        );
        self.client
            .session()
            .write()
            .await
            .set_session(user.clone(), permissions);

        Ok(user)
    }

    /// Sign out; the local session is cleared even when the call fails.
    pub async fn logout(&self) -> Result<String> {
        let result = self.client.post_empty::<Ack>(LOGOUT_PATH).await;
        self.client.session().write().await.clear();

        let ack = result?;
        Ok(ack
            .message
            .unwrap_or_else(|| "Sesión cerrada".to_string()))
    }
}
