use std::path::Path;

use crate::error::{ConsoleError, Result};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

pub const MSG_INVALID_IMAGE_TYPE: &str = "El archivo debe ser una imagen JPG o PNG";
pub const MSG_IMAGE_TOO_LARGE: &str = "El tamaño de la imagen no debe exceder 10MB";

/// Invoice photo queued for OCR.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl InvoiceImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read an image from disk, deriving the MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => "application/octet-stream",
        };
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("invoice.jpg")
            .to_string();

        Ok(Self::new(file_name, content_type, bytes))
    }

    /// Type is checked before size.
    pub fn validate(&self) -> Result<()> {
        let content_type = self.content_type.trim().to_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(ConsoleError::Validation(MSG_INVALID_IMAGE_TYPE.to_string()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ConsoleError::Validation(MSG_IMAGE_TOO_LARGE.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accepts_jpeg_and_png() {
        for content_type in ["image/jpeg", "image/jpg", "image/png", "IMAGE/PNG"] {
            let image = InvoiceImage::new("factura", content_type, vec![0; 16]);
            assert!(image.validate().is_ok(), "{}", content_type);
        }
    }

    #[test]
    fn test_rejects_other_types() {
        let image = InvoiceImage::new("factura.pdf", "application/pdf", vec![0; 16]);
        let err = image.validate().unwrap_err();
        assert_eq!(err.user_message(), MSG_INVALID_IMAGE_TYPE);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let at_limit = InvoiceImage::new("a.png", "image/png", vec![0; MAX_IMAGE_BYTES]);
        assert!(at_limit.validate().is_ok());

        let over = InvoiceImage::new("a.png", "image/png", vec![0; MAX_IMAGE_BYTES + 1]);
        assert_eq!(over.validate().unwrap_err().user_message(), MSG_IMAGE_TOO_LARGE);
    }

    #[test]
    fn test_from_path_derives_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factura.JPG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"\xff\xd8\xff").unwrap();

        let image = InvoiceImage::from_path(&path).unwrap();
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.file_name, "factura.JPG");
        assert_eq!(image.bytes.len(), 3);
    }
}
