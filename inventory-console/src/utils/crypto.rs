use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use sha2::Sha256;

use crate::error::{ConsoleError, Result};

type HmacSha256 = Hmac<Sha256>;
type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;
type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;

/// Result of decrypting a stored cédula.
///
/// When the plaintext is not exactly ten digits the original cipher text is
/// handed back untouched with `is_decrypted = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptionResult {
    pub value: String,
    pub is_decrypted: bool,
    pub valid_format: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecryptionResult {
    fn passthrough(cipher: &str, error: Option<String>) -> Self {
        Self {
            value: cipher.to_string(),
            is_decrypted: false,
            valid_format: false,
            error,
        }
    }
}

fn require_secret(secret: &Secret<String>) -> Result<&str> {
    let value = secret.expose_secret();
    if value.trim().is_empty() {
        return Err(ConsoleError::Crypto(
            "El secreto de cifrado no está configurado".to_string(),
        ));
    }
    Ok(value)
}

fn derive_key(secret: &str) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Hex HMAC-SHA256 of a password, keyed with the shared secret.
pub fn encrypt_password_hmac(text: &str, secret: &Secret<String>) -> Result<String> {
    let key = require_secret(secret)?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|e| ConsoleError::Crypto(e.to_string()))?;
    mac.update(text.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// AES-128-ECB with PKCS#7 padding, key = MD5(secret), Base64 output.
pub fn encrypt_cedula_aes(cedula: &str, secret: &Secret<String>) -> Result<String> {
    let value = cedula.trim();
    if value.is_empty() {
        return Err(ConsoleError::Crypto(
            "La cédula no puede estar vacía".to_string(),
        ));
    }

    let key = derive_key(require_secret(secret)?);
    let cipher = Aes128EcbEnc::new(&key.into()).encrypt_padded_vec_mut::<Pkcs7>(value.as_bytes());
    Ok(STANDARD.encode(cipher))
}

/// Inverse of [`encrypt_cedula_aes`]. Never fails; see [`DecryptionResult`].
pub fn decrypt_cedula_aes(cipher: &str, secret: &Secret<String>) -> DecryptionResult {
    let key = match require_secret(secret) {
        Ok(secret) => derive_key(secret),
        Err(e) => return DecryptionResult::passthrough(cipher, Some(e.to_string())),
    };

    let bytes = match STANDARD.decode(cipher.trim()) {
        Ok(bytes) => bytes,
        Err(e) => return DecryptionResult::passthrough(cipher, Some(e.to_string())),
    };

    let plain = match Aes128EcbDec::new(&key.into()).decrypt_padded_vec_mut::<Pkcs7>(&bytes) {
        Ok(plain) => plain,
        Err(_) => {
            return DecryptionResult::passthrough(cipher, Some("Error de descifrado".to_string()))
        }
    };

    match String::from_utf8(plain) {
        Ok(raw) if is_ten_digit_cedula(&raw) => DecryptionResult {
            value: raw,
            is_decrypted: true,
            valid_format: true,
            error: None,
        },
        _ => DecryptionResult::passthrough(cipher, None),
    }
}

pub fn is_ten_digit_cedula(value: &str) -> bool {
    value.len() == 10 && value.chars().all(|c| c.is_ascii_digit())
}
