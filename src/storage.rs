use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use axum::body::Bytes;

/// Imagem já gravada: nome do arquivo e URL relativa servida em `/uploads`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub file_name: String,
    pub url: String,
}

/// Upload recebido num formulário multipart, ainda não gravado.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// Extensão normalizada se for jpeg/jpg/png/webp tanto no nome quanto no tipo MIME.
    pub fn allowed_extension(&self) -> Option<&'static str> {
        const ALLOWED: [(&str, &str); 4] = [("jpeg", "jpg"), ("jpg", "jpg"), ("png", "png"), ("webp", "webp")];

        let ext = self
            .original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())?;
        let mime_ok = self
            .content_type
            .to_ascii_lowercase()
            .strip_prefix("image/")
            .map(|sub| ALLOWED.iter().any(|(name, _)| *name == sub))
            .unwrap_or(false);

        if !mime_ok {
            return None;
        }
        ALLOWED.iter().find(|(name, _)| *name == ext).map(|(_, normalized)| *normalized)
    }
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn save(&self, file_name: &str, data: Bytes) -> anyhow::Result<StoredImage>;
    async fn remove(&self, image: &StoredImage) -> anyhow::Result<()>;
}

/// Nome único: `<prefixo>_<millis>_<8 hex>.<ext>`
pub fn unique_file_name(prefix: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, millis, &suffix[..8], extension)
}

#[derive(Clone)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub async fn new(root: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("não foi possível criar {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, file_name: &str, data: Bytes) -> anyhow::Result<StoredImage> {
        let path = self.root.join(file_name);
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("falha ao gravar {}", path.display()))?;
        tracing::info!("🖼️ Imagem gravada em {}", path.display());
        Ok(StoredImage {
            file_name: file_name.to_string(),
            url: format!("/uploads/{}", file_name),
        })
    }

    async fn remove(&self, image: &StoredImage) -> anyhow::Result<()> {
        let path = self.root.join(&image.file_name);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("falha ao remover {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryImageStorage {
    pub files: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn save(&self, file_name: &str, _data: Bytes) -> anyhow::Result<StoredImage> {
        self.files.lock().unwrap().push(file_name.to_string());
        Ok(StoredImage {
            file_name: file_name.to_string(),
            url: format!("/uploads/{}", file_name),
        })
    }

    async fn remove(&self, image: &StoredImage) -> anyhow::Result<()> {
        self.files.lock().unwrap().retain(|f| f != &image.file_name);
        Ok(())
    }
}
