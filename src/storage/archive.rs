//! 存档：本地为主，远程可选
//!
//! 本地存档始终可用；远程失败只记录日志，不影响本地结果

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::SavedSeoResult;
use crate::storage::{ArticleStore, LocalStore, RemoteStore};

pub struct Archive {
    local: Box<dyn ArticleStore>,
    remote: Option<Box<dyn ArticleStore>>,
}

impl Archive {
    pub fn new(local: Box<dyn ArticleStore>, remote: Option<Box<dyn ArticleStore>>) -> Self {
        Self { local, remote }
    }

    /// 根据配置创建存档，配置了远程地址和密钥时才启用远程
    pub fn from_config(config: &crate::config::Config) -> Self {
        let local = Box::new(LocalStore::new(&config.archive_file)) as Box<dyn ArticleStore>;
        let remote = match (&config.remote_url, &config.remote_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                info!("☁️ 已启用远程存档: {}", url);
                Some(Box::new(RemoteStore::new(
                    url.clone(),
                    key.clone(),
                    config.remote_user_id.clone(),
                )) as Box<dyn ArticleStore>)
            }
            _ => None,
        };
        Self::new(local, remote)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// 先写本地，再写远程；远程失败时返回错误，本地结果保留
    pub async fn save(&self, article: &SavedSeoResult) -> Result<()> {
        self.local.save(article).await?;
        if let Some(remote) = &self.remote {
            remote.save(article).await?;
        }
        Ok(())
    }

    /// 合并本地和远程，按 id 去重
    ///
    /// 同一 id 以远程为准，位置保持首次出现的位置
    pub async fn load_all(&self) -> Result<Vec<SavedSeoResult>> {
        let mut merged = self.local.load_all().await?;

        if let Some(remote) = &self.remote {
            match remote.load_all().await {
                Ok(remote_articles) => {
                    let mut positions: HashMap<String, usize> = merged
                        .iter()
                        .enumerate()
                        .map(|(i, a)| (a.id.clone(), i))
                        .collect();
                    for article in remote_articles {
                        match positions.get(&article.id) {
                            Some(&pos) => merged[pos] = article,
                            None => {
                                positions.insert(article.id.clone(), merged.len());
                                merged.push(article);
                            }
                        }
                    }
                }
                Err(e) => warn!("⚠️ 远程存档加载失败，仅使用本地存档: {}", e),
            }
        }

        Ok(merged)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.local.delete(id).await?;
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.delete(id).await {
                warn!("⚠️ 远程存档删除失败 ({}): {}", id, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, StorageError};
    use crate::models::SeoResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 内存存档，可以设置为始终失败
    #[derive(Default)]
    struct MemoryStore {
        articles: Mutex<Vec<SavedSeoResult>>,
        broken: bool,
    }

    impl MemoryStore {
        fn with(articles: Vec<SavedSeoResult>) -> Self {
            Self {
                articles: Mutex::new(articles),
                broken: false,
            }
        }

        fn broken() -> Self {
            Self {
                broken: true,
                ..Default::default()
            }
        }

        fn fail(&self) -> Result<()> {
            if self.broken {
                Err(AppError::Storage(StorageError::RemoteStatus {
                    status: 500,
                    body: "down".to_string(),
                }))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ArticleStore for MemoryStore {
        async fn save(&self, article: &SavedSeoResult) -> Result<()> {
            self.fail()?;
            self.articles.lock().unwrap().push(article.clone());
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<SavedSeoResult>> {
            self.fail()?;
            Ok(self.articles.lock().unwrap().clone())
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.fail()?;
            self.articles.lock().unwrap().retain(|a| a.id != id);
            Ok(())
        }
    }

    fn article(id: &str, title: &str) -> SavedSeoResult {
        SavedSeoResult {
            id: id.to_string(),
            original_article_text: String::new(),
            result: SeoResult {
                title: title.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_merge_prefers_remote_and_keeps_position() {
        let local = MemoryStore::with(vec![article("1", "locale"), article("2", "solo locale")]);
        let remote = MemoryStore::with(vec![article("3", "solo remoto"), article("1", "remoto")]);
        let archive = Archive::new(Box::new(local), Some(Box::new(remote)));

        let all = archive.load_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(all[0].result.title, "remoto");
    }

    #[tokio::test]
    async fn test_remote_load_failure_degrades_to_local() {
        let local = MemoryStore::with(vec![article("1", "locale")]);
        let archive = Archive::new(Box::new(local), Some(Box::new(MemoryStore::broken())));

        let all = archive.load_all().await.unwrap();
        assert_eq!(all.len(), 1);

        // 远程删除失败只记录日志
        archive.delete("1").await.unwrap();
        assert!(archive.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_keeps_local_copy_when_remote_fails() {
        let archive = Archive::new(
            Box::new(MemoryStore::default()),
            Some(Box::new(MemoryStore::broken())),
        );
        assert!(archive.save(&article("1", "t")).await.is_err());
        assert_eq!(archive.load_all().await.unwrap().len(), 1);
    }
}
