// ==========================================
// 菌菇加工运营系统 - 云端同步传输层
// ==========================================
// SyncTransport: 一次请求/一次响应，无重试、无鉴权
// 实现者: HttpSyncTransport（表格后端的单一 HTTP 端点）
// ==========================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::wire::{PullResponse, PushRequest, PushResponse};

#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// 推送全量批次与库存
    async fn push(&self, request: &PushRequest) -> SyncResult<PushResponse>;

    /// 拉取外部到货记录
    async fn pull(&self) -> SyncResult<PullResponse>;
}

// ==========================================
// HttpSyncTransport
// ==========================================
#[derive(Debug, Clone)]
pub struct HttpSyncTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSyncTransport {
    /// 创建 HTTP 传输
    ///
    /// # 参数
    /// - endpoint: 同步端点 URL
    /// - timeout: 客户端级超时（服务层另有整体超时）
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> SyncResult<T> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, body_len = body.len(), "云端响应");

        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| SyncError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SyncTransport for HttpSyncTransport {
    async fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn pull(&self) -> SyncResult<PullResponse> {
        let response = self.client.get(&self.endpoint).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> HttpSyncTransport {
        HttpSyncTransport::new(format!("{}/sync", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_push_posts_action_and_reads_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sync"))
            .and(body_partial_json(serde_json::json!({"action": "push"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "saved 0 rows"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resp = transport(&server)
            .push(&PushRequest::new(vec![], vec![]))
            .await
            .unwrap();
        assert_eq!(resp.message, "saved 0 rows");
    }

    #[tokio::test]
    async fn test_pull_parses_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "newHarvest": {"farmerName": "Village C", "mushroomType": "Enoki", "totalWeight": 8}
            })))
            .mount(&server)
            .await;

        let resp = transport(&server).pull().await.unwrap();
        let candidates = resp.into_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].total_weight, Some(8.0));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = transport(&server).pull().await.unwrap_err();
        match err {
            SyncError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = transport(&server).pull().await.unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
        assert!(err.is_network_failure());
    }
}
