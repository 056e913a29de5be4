//! 远程存档：托管的 PostgREST 接口（`articles` 表）
//!
//! 表结构：`id, title, original_text, full_json, created_at, user_id`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::models::SavedSeoResult;
use crate::storage::ArticleStore;

const TABLE_PATH: &str = "/rest/v1/articles";

pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: String,
    user_id: Option<String>,
}

#[derive(Serialize)]
struct ArticleRow<'a> {
    id: &'a str,
    title: &'a str,
    original_text: &'a str,
    full_json: &'a SavedSeoResult,
    created_at: String,
    user_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct FullJsonRow {
    full_json: SavedSeoResult,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_id,
        }
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, TABLE_PATH)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::RemoteStatus {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl ArticleStore for RemoteStore {
    async fn save(&self, article: &SavedSeoResult) -> Result<()> {
        let row = ArticleRow {
            id: &article.id,
            title: &article.result.title,
            original_text: &article.original_article_text,
            full_json: article,
            created_at: chrono::Utc::now().to_rfc3339(),
            user_id: self.user_id.as_deref(),
        };

        let request = self
            .client
            .post(self.url())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(StorageError::from)?;
        Self::check(response).await?;

        debug!("远程存档已保存: {}", article.id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SavedSeoResult>> {
        let mut query = vec![
            ("select", "full_json".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(user_id) = &self.user_id {
            query.push(("user_id", format!("eq.{user_id}")));
        }

        let request = self.client.get(self.url()).query(&query);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(StorageError::from)?;
        let rows: Vec<FullJsonRow> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|row| row.full_json).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.url())
            .query(&[("id", format!("eq.{id}"))]);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(StorageError::from)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::SeoResult;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article(id: &str) -> SavedSeoResult {
        SavedSeoResult {
            id: id.to_string(),
            original_article_text: "testo originale".to_string(),
            result: SeoResult {
                title: "Titolo".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_save_upserts_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/articles"))
            .and(header("apikey", "anon"))
            .and(header("Prefer", "resolution=merge-duplicates,return=minimal"))
            .and(body_partial_json(json!([{
                "id": "a1",
                "title": "Titolo",
                "original_text": "testo originale",
                "user_id": "u1"
            }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = RemoteStore::new(server.uri(), "anon", Some("u1".to_string()));
        store.save(&article("a1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_all_filters_by_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/articles"))
            .and(query_param("select", "full_json"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "full_json": { "id": "a2", "originalArticleText": "t2", "title": "Due" } },
                { "full_json": { "id": "a1", "originalArticleText": "t1", "title": "Uno" } }
            ])))
            .mount(&server)
            .await;

        let store = RemoteStore::new(format!("{}/", server.uri()), "anon", Some("u1".to_string()));
        let articles = store.load_all().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].id, "a2");
        assert_eq!(articles[1].result.title, "Uno");
    }

    #[tokio::test]
    async fn test_delete_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/articles"))
            .and(query_param("id", "eq.a1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let store = RemoteStore::new(server.uri(), "anon", None);
        let err = store.delete("a1").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(StorageError::RemoteStatus { status: 403, .. })
        ));
    }
}
