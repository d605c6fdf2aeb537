use std::convert::TryFrom;
use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use lopdf::{Document, Object, StringFormat};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::loader::load_pdf;
use super::pages::write_pdf;
use crate::error::{AppError, AppResult};

/// RC4 128-bit, readable by practically every viewer.
const KEY_LENGTH: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectOutcome {
    pub pages: u32,
    pub output: PathBuf,
}

impl fmt::Display for ProtectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PDF Password Protected!")
    }
}

/// Encrypt a copy of `path` with `password` as the user password.
/// `owner_password` defaults to the same value.
pub fn protect_pdf<P: AsRef<Path>, Q: AsRef<Path>>(
    path: P,
    output: Q,
    password: &str,
    owner_password: Option<&str>,
) -> AppResult<ProtectOutcome> {
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty.".to_string()));
    }
    let mut doc = load_pdf(&path)?;
    if doc.is_encrypted() {
        return Err(AppError::Validation("PDF is already password protected.".to_string()));
    }
    ensure_file_id(&mut doc);

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: owner_password.unwrap_or(password),
        user_password: password,
        key_length: KEY_LENGTH,
        permissions: Permissions::default(),
    };
    let state = EncryptionState::try_from(version).map_err(|e| {
        AppError::Validation(format!("Failed to create encryption state: {}", e))
    })?;

    let mut encrypted = doc.clone();
    encrypted
        .encrypt(&state)
        .map_err(|e| AppError::Validation(format!("Failed to encrypt PDF: {}", e)))?;

    let output = output.as_ref();
    write_pdf(&mut encrypted, output)?;
    info!("protected {} -> {}", path.as_ref().display(), output.display());

    Ok(ProtectOutcome {
        pages: doc.get_pages().len() as u32,
        output: output.to_path_buf(),
    })
}

/// The encryption key is derived from the first `/ID` entry, so documents
/// without one get a random identifier.
fn ensure_file_id(doc: &mut Document) {
    if doc.trailer.has(b"ID") {
        return;
    }
    let id: [u8; 16] = rand::thread_rng().gen();
    let id = id.to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}
