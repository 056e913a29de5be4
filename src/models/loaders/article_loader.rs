use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的文章文件扩展名
const ARTICLE_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// 从磁盘读取的一篇文章
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFile {
    pub path: PathBuf,
    pub text: String,
}

fn is_article(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ARTICLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 读取单篇文章
pub async fn load_article_file(path: &Path) -> Result<ArticleFile> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取文章文件: {}", path.display()))?;

    Ok(ArticleFile {
        path: path.to_path_buf(),
        text,
    })
}

/// 从文件夹中加载所有 .txt / .md 文章，按文件名排序；空文件跳过
pub async fn load_all_articles(folder_path: &str) -> Result<Vec<ArticleFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_article(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut articles = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_article_file(&path).await {
            Ok(article) if article.text.trim().is_empty() => {
                tracing::warn!("跳过空文件: {}", path.display());
            }
            Ok(article) => articles.push(article),
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loads_only_articles_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "# Secondo").unwrap();
        std::fs::write(dir.path().join("a.txt"), "Primo articolo").unwrap();
        std::fs::write(dir.path().join("vuoto.txt"), "   ").unwrap();
        std::fs::write(dir.path().join("note.toml"), "x = 1").unwrap();

        let folder = dir.path().to_string_lossy().to_string();
        let articles = load_all_articles(&folder).await.unwrap();

        let texts: Vec<_> = articles.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["Primo articolo", "# Secondo"]);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").to_string_lossy().to_string();
        assert!(load_all_articles(&missing).await.is_err());
    }
}
