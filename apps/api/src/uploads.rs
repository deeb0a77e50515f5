//! Upload handling: multipart form reading and each teacher's latest survey file.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const FILE_FIELD: &str = "file";

/// Keeps one survey CSV per teacher, replaced on every upload.
#[derive(Debug, Clone)]
pub struct LatestUploadStore {
    dir: PathBuf,
}

impl LatestUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user_id: Uuid) -> PathBuf {
        self.dir.join(format!("user_{user_id}_latest.csv"))
    }

    pub async fn save(&self, user_id: Uuid, data: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating upload dir {}", self.dir.display()))?;
        let path = self.path_for(user_id);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Saved latest upload for user {user_id} ({} bytes)", data.len());
        Ok(())
    }

    /// `None` when the user has not uploaded a survey yet.
    pub async fn load(&self, user_id: Uuid) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.path_for(user_id);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}

/// A parsed multipart form: the uploaded file plus any text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub file: Option<Bytes>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// The uploaded file and its name, or 400 when none was sent.
    pub fn require_file(&self) -> Result<(String, &Bytes), AppError> {
        let file = self
            .file
            .as_ref()
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
        let name = self
            .file_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok((name, file))
    }

    /// A trimmed, non-empty text field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILE_FIELD {
            form.file_name = field.file_name().map(str::to_string);
            form.file = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?,
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_upload_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = LatestUploadStore::new(dir.path().join("nested"));
        let user = Uuid::new_v4();

        assert!(store.load(user).await.unwrap().is_none());

        store.save(user, b"first").await.unwrap();
        store.save(user, b"second").await.unwrap();
        assert_eq!(store.load(user).await.unwrap().unwrap(), b"second");

        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn test_require_file() {
        let empty = UploadForm::default();
        assert!(matches!(empty.require_file(), Err(AppError::Validation(_))));

        let form = UploadForm {
            file_name: None,
            file: Some(Bytes::from_static(b"a,b\n")),
            fields: HashMap::from([("academic_year".to_string(), " 2024-2025 ".to_string())]),
        };
        let (name, bytes) = form.require_file().unwrap();
        assert_eq!(name, "upload.csv");
        assert_eq!(bytes.as_ref(), b"a,b\n");
        assert_eq!(form.field("academic_year"), Some("2024-2025"));
        assert_eq!(form.field("missing"), None);
    }
}
