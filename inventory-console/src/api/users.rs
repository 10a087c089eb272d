use secrecy::Secret;
use serde::Deserialize;
use std::sync::Arc;

use super::client::{Ack, ApiClient, ApiResponse};
use super::roles::ack_message;
use super::ListQuery;
use crate::error::{ConsoleError, Result};
use crate::models::{
    Page, PasswordUpdate, ProfileUpdate, RegisterPayload, RegisterRequest, UserInfo,
    UserMutationResponse,
};
use crate::utils::crypto::{decrypt_cedula_aes, encrypt_cedula_aes, encrypt_password_hmac};
use crate::utils::validation::{
    validate_ecuadorian_id, validate_email, validate_password_strength,
};

const USERS_PATH: &str = "/users";
const PROFILE_PATH: &str = "/profile";
const REGISTER_PATH: &str = "/register";
const UPDATE_PASSWORD_PATH: &str = "/update-password";

pub const MSG_PASSWORD_UPDATE_FAILED: &str = "Ha ocurrido un error al actualizar la contraseña";
pub const MSG_DELETE_USER_FAILED: &str = "Ha ocurrido un error al eliminar el usuario";

#[derive(Debug, Deserialize)]
struct UserListing {
    users: Option<Vec<UserInfo>>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    page: u32,
    #[serde(default, rename = "totalPages")]
    total_pages: u32,
}

/// Plain-text profile edit, encrypted before it leaves the process.
#[derive(Debug, Clone)]
pub struct ProfileEdit {
    pub user_id: Option<i64>,
    pub cedula: String,
    pub nombre_usuario: String,
    pub correo: String,
    pub estado: bool,
}

pub struct UserApi {
    client: Arc<ApiClient>,
    secret: Secret<String>,
}

impl UserApi {
    pub fn new(client: Arc<ApiClient>, secret: Secret<String>) -> Self {
        Self { client, secret }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<UserInfo>> {
        let response: ApiResponse<UserListing> =
            self.client.get(USERS_PATH, &query.to_pairs()).await?;
        let listing = response.into_data("usuarios")?;
        let items = listing
            .users
            .ok_or_else(|| ConsoleError::Shape("data.users".to_string()))?;

        Ok(Page {
            items,
            total: listing.total,
            page: listing.page,
            total_pages: listing.total_pages,
        })
    }

    /// Listing with each stored cédula decrypted when it yields ten digits.
    pub async fn list_readable(&self, query: &ListQuery) -> Result<Page<UserInfo>> {
        let mut page = self.list(query).await?;
        for user in &mut page.items {
            user.cedula = decrypt_cedula_aes(&user.cedula, &self.secret).value;
        }
        Ok(page)
    }

    /// Validate cédula and email, encrypt the cédula, then `PUT /profile`.
    pub async fn update_profile(&self, edit: &ProfileEdit) -> Result<UserMutationResponse> {
        let cedula = validate_ecuadorian_id(&edit.cedula);
        if !cedula.valid {
            return Err(ConsoleError::Validation(cedula.message));
        }
        let email = validate_email(&edit.correo);
        if !email.valid {
            return Err(ConsoleError::Validation(email.message));
        }

        let body = ProfileUpdate {
            user_id: edit.user_id,
            cedula: encrypt_cedula_aes(&edit.cedula, &self.secret)?,
            nombre_usuario: edit.nombre_usuario.trim().to_string(),
            correo: edit.correo.trim().to_string(),
            estado: edit.estado,
        };
        let response: UserMutationResponse = self.client.put(PROFILE_PATH, &body).await?;
        if !response.success {
            return Err(ConsoleError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "No se pudo actualizar el perfil".to_string()),
            ));
        }
        Ok(response)
    }

    /// Validate the form, encrypt the cédula and digest the password.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserMutationResponse> {
        validator::Validate::validate(request)?;

        let body = RegisterPayload {
            cedula: encrypt_cedula_aes(&request.cedula, &self.secret)?,
            nombre_usuario: request.nombre_usuario.trim().to_string(),
            correo: request.correo.trim().to_string(),
            password: encrypt_password_hmac(&request.password, &self.secret)?,
            rol_id: request.rol_id,
        };
        let response: UserMutationResponse = self.client.post(REGISTER_PATH, &body).await?;
        if !response.success {
            return Err(ConsoleError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "No se pudo registrar el usuario".to_string()),
            ));
        }
        tracing::info!(correo = %body.correo, "User registered");
        Ok(response)
    }

    /// A weak new password is refused before any request. A 401 surfaces
    /// the backend's own message; every other failure is generic.
    pub async fn update_password(&self, old_password: &str, new_password: &str) -> Result<String> {
        let strength = validate_password_strength(new_password);
        if !strength.valid {
            return Err(ConsoleError::Validation(strength.message));
        }

        let body = PasswordUpdate {
            old_password: encrypt_password_hmac(old_password, &self.secret)?,
            new_password: encrypt_password_hmac(new_password, &self.secret)?,
        };

        match self.client.put::<_, Ack>(UPDATE_PASSWORD_PATH, &body).await {
            Ok(ack) => ack_message(ack, "Contraseña actualizada"),
            Err(ConsoleError::Unauthorized(message)) => Err(ConsoleError::Rejected(message)),
            Err(e) => {
                tracing::warn!(error = %e, "Password update failed");
                Err(ConsoleError::Rejected(MSG_PASSWORD_UPDATE_FAILED.to_string()))
            }
        }
    }

    pub async fn delete(&self, user_id: i64) -> Result<String> {
        let path = format!("{}/{}", USERS_PATH, user_id);
        match self.client.delete::<Ack>(&path).await {
            Ok(ack) => ack_message(ack, "Usuario eliminado")
                .map_err(|_| ConsoleError::Rejected(MSG_DELETE_USER_FAILED.to_string())),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "User deletion failed");
                Err(ConsoleError::Rejected(MSG_DELETE_USER_FAILED.to_string()))
            }
        }
    }
}
