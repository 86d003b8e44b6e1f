//! Receipt image hosting. The submission path treats this collaborator as
//! fail-soft: an upload error means the record is stored without an image,
//! never that the submission is aborted.

use std::env;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Datelike;
use opendal::services::S3;
use opendal::Operator;
use uuid::Uuid;

/// A single uploaded file as received from the submission form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// External image host: accepts one file, returns a publicly addressable URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> anyhow::Result<String>;
}

/// S3-compatible object storage via OpenDAL.
pub struct ObjectStorageImages {
    op: Operator,
    public_base: String,
}

impl ObjectStorageImages {
    pub fn new(op: Operator, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into().trim_end_matches('/').to_string();
        Self { op, public_base }
    }

    /// Builds the operator from OBJECT_STORAGE_* environment variables.
    /// Returns `None` when no endpoint is configured, in which case
    /// submissions proceed without images.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Ok(endpoint) = env::var("OBJECT_STORAGE_ENDPOINT") else {
            return Ok(None);
        };
        let bucket = env::var("OBJECT_STORAGE_BUCKET")
            .context("OBJECT_STORAGE_BUCKET must be set when OBJECT_STORAGE_ENDPOINT is")?;
        let region = env::var("OBJECT_STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let access_key = env::var("OBJECT_STORAGE_ACCESS_KEY_ID")
            .context("OBJECT_STORAGE_ACCESS_KEY_ID must be set when OBJECT_STORAGE_ENDPOINT is")?;
        let secret_key = env::var("OBJECT_STORAGE_SECRET_ACCESS_KEY")
            .context("OBJECT_STORAGE_SECRET_ACCESS_KEY must be set when OBJECT_STORAGE_ENDPOINT is")?;
        let public_base = env::var("OBJECT_STORAGE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));

        let op = Operator::new(
            S3::default()
                .endpoint(&endpoint)
                .bucket(&bucket)
                .region(&region)
                .access_key_id(&access_key)
                .secret_access_key(&secret_key),
        )?
        .finish();

        Ok(Some(Self::new(op, public_base)))
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[async_trait]
impl ImageStore for ObjectStorageImages {
    async fn upload(&self, image: &ImageUpload) -> anyhow::Result<String> {
        let content_type = image.content_type.as_deref().unwrap_or("");
        let ext = extension_for(content_type)
            .ok_or_else(|| anyhow::anyhow!("unsupported image type: {content_type:?}"))?;

        let year = chrono::Utc::now().year();
        let key = format!("images/{}/{}.{}", year, Uuid::new_v4(), ext);
        self.op
            .write(&key, image.bytes.clone())
            .await
            .with_context(|| format!("uploading {key}"))?;

        Ok(format!("{}/{}", self.public_base, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_image_types_get_an_extension() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for(""), None);
    }
}
