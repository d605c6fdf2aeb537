use serde::Serialize;
use thiserror::Error;

// --- Error Handling ---

#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Settings error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Path error: {0}")]
    Path(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("No PDF is open.")]
    NoDocument,
}

// Serialize error as a simple string for the frontend
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_display_string() {
        let err = AppError::Validation("Start page must be at least 1.".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Validation error: Start page must be at least 1.\"");
    }

    #[test]
    fn no_document_message() {
        assert_eq!(AppError::NoDocument.to_string(), "No PDF is open.");
    }
}
