//! 本地存档：单个 JSON 数组文件

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, Result, StorageError};
use crate::models::SavedSeoResult;
use crate::storage::ArticleStore;

pub struct LocalStore {
    path: PathBuf,
    // 串行化读-改-写
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<SavedSeoResult>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::io(self.path.display().to_string(), e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content).map_err(StorageError::from)?)
    }

    async fn write_all(&self, articles: &[SavedSeoResult]) -> Result<()> {
        let json = serde_json::to_string_pretty(articles).map_err(StorageError::from)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::io(parent.display().to_string(), e))?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|e| AppError::io(self.path.display().to_string(), e))
    }
}

#[async_trait]
impl ArticleStore for LocalStore {
    async fn save(&self, article: &SavedSeoResult) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut articles = self.read_all().await?;
        match articles.iter_mut().find(|a| a.id == article.id) {
            Some(existing) => *existing = article.clone(),
            None => articles.push(article.clone()),
        }
        self.write_all(&articles).await?;
        debug!("本地存档已保存: {} (共 {} 篇)", article.id, articles.len());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SavedSeoResult>> {
        self.read_all().await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut articles = self.read_all().await?;
        articles.retain(|a| a.id != id);
        self.write_all(&articles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeoResult;

    fn article(id: &str, title: &str) -> SavedSeoResult {
        SavedSeoResult {
            id: id.to_string(),
            original_article_text: format!("testo {id}"),
            result: SeoResult {
                title: title.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("none.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_upserts_and_delete_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("saved.json"));

        store.save(&article("1", "primo")).await.unwrap();
        store.save(&article("2", "secondo")).await.unwrap();
        store.save(&article("1", "primo v2")).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].result.title, "primo v2");
        assert_eq!(all[1].id, "2");

        store.delete("1").await.unwrap();
        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "2");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        std::fs::write(&path, "[{not json").unwrap();
        let store = LocalStore::new(&path);
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Json(_))));
    }
}
