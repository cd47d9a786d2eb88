//! # hm-storage-local
//! haymarket/crates/hm-plugins/hm-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and public URL resolution.

use async_trait::async_trait;
use hm_core::models::image_extension;
use hm_core::traits::{ImageResolver, MediaStore, PublicBase};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public base the stored references are served from
    public: PublicBase,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, public_base_url: &str) -> Self {
        Self {
            root_path: root,
            public: PublicBase::new(public_base_url),
        }
    }

    /// Generates a sharded reference: "ab/cd/abcdef...hash.jpg"
    fn sharded_reference(hash: &str, extension: &str) -> String {
        format!("{}/{}/{}.{}", &hash[0..2], &hash[2..4], hash, extension)
    }
}

impl ImageResolver for LocalMediaStore {
    fn public_url(&self, reference: &str) -> String {
        self.public.public_url(reference)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        let Some(extension) = image_extension(content_type) else {
            anyhow::bail!("unsupported upload type: {content_type}");
        };

        // 1. Calculate Hash
        let hash = hex::encode(Sha256::digest(&data));
        let reference = Self::sharded_reference(&hash, extension);
        let target_path = self.root_path.join(&reference);

        // 2. Ensure directory exists
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // 3. Save Original (if not exists)
        if !fs::try_exists(&target_path).await? {
            fs::write(&target_path, &data).await?;
            info!(reference = %reference, bytes = data.len(), "stored upload");
        }

        Ok(reference)
    }
}
