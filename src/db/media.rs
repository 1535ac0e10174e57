use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::AppResult, models::MediaRef};

/// Accepted shelf photo types and the file extension each is stored under
pub const ACCEPTED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
];

/// File extension for an accepted content type
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ACCEPTED_IMAGE_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == essence)
        .map(|(_, ext)| *ext)
}

/// `data:` URL carrying the image inline, so remote models need no access to this host
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    let mime = match image_extension(content_type) {
        Some("png") => "image/png",
        Some(_) => "image/jpeg",
        None => "application/octet-stream",
    };
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Binary storage for uploaded photos
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the bytes and returns a reference with a publicly reachable URL
    async fn put(&self, bytes: &[u8], content_type: &str) -> AppResult<MediaRef>;

    /// Bytes previously stored under `media`, if still present
    async fn get(&self, media: &MediaRef) -> AppResult<Option<Vec<u8>>>;
}

fn media_name(content_type: &str) -> (String, String) {
    let id = Uuid::new_v4().to_string();
    let name = format!("{}.{}", id, image_extension(content_type).unwrap_or("bin"));
    (id, name)
}

/// Files in a local directory, served back under `{public_base_url}/media/`
pub struct LocalMediaStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> AppResult<MediaRef> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let (id, name) = media_name(content_type);
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::debug!(name = %name, size = bytes.len(), "Stored shelf photo");

        Ok(MediaRef {
            url: format!("{}/media/{}", self.public_base_url, name),
            id,
            name,
            content_type: content_type.to_string(),
        })
    }

    async fn get(&self, media: &MediaRef) -> AppResult<Option<Vec<u8>>> {
        // only names generated by put are read back
        if media.name.contains(['/', '\\']) || media.name.starts_with('.') {
            return Ok(None);
        }
        match tokio::fs::read(self.dir.join(&media.name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps media in memory
#[derive(Default)]
pub struct InMemoryMediaStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn put(&self, bytes: &[u8], content_type: &str) -> AppResult<MediaRef> {
        let (id, name) = media_name(content_type);
        self.objects
            .write()
            .await
            .insert(name.clone(), bytes.to_vec());

        Ok(MediaRef {
            url: format!("memory://media/{}", name),
            id,
            name,
            content_type: content_type.to_string(),
        })
    }

    async fn get(&self, media: &MediaRef) -> AppResult<Option<Vec<u8>>> {
        Ok(self.objects.read().await.get(&media.name).cloned())
    }
}
