//! reqwest 기반 API client
//!
//! - `PRIVATE-TOKEN` 헤더 인증
//! - 설정된 타임아웃 적용, 재시도 없음
//! - non-2xx → `ToolError::Upstream` (본문 앞 512바이트 포함)

use super::{ApiClient, ApiRequest, Body, Method};
use crate::ToolError;
use async_trait::async_trait;
use labforge_foundation::ServerConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// 에러 응답 본문 발췌 크기
pub const BODY_EXCERPT_BYTES: usize = 512;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(config: &ServerConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("labforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        if config.token.is_none() {
            warn!("No API token configured; requests will be unauthenticated");
        }

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// base URL 기준 요청 URL
    ///
    /// dot segment(`..`, `%2E%2E` 등)가 있으면 다른 리소스로 해석되므로 거부합니다.
    fn url(&self, path: &str) -> Result<Url, ToolError> {
        if path.split('/').any(is_dot_segment) {
            return Err(ToolError::Transport(format!(
                "Refusing request path with a relative segment: '{}'",
                path
            )));
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ToolError::Transport(format!("Invalid request path '{}': {}", path, e)))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError> {
        let url = self.url(&request.path)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder = match &request.body {
            Some(Body::Json(body)) => builder.json(body),
            Some(Body::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        debug!(
            "{} {} -> {} in {}ms",
            request.method,
            request.path,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body_excerpt: excerpt(&body, BODY_EXCERPT_BYTES),
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"));
        let text = response.text().await?;
        decode_body(is_json, text)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// 본문 앞부분 발췌 (char 경계에서 자름)
fn excerpt(body: &str, max_bytes: usize) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if body.len() <= max_bytes {
        return Some(body.to_string());
    }
    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    Some(body[..end].to_string())
}

fn decode_body(is_json: Option<bool>, text: String) -> Result<Value, ToolError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match is_json {
        Some(true) => serde_json::from_str(&text)
            .map_err(|e| ToolError::Transport(format!("Invalid JSON in upstream response: {}", e))),
        Some(false) => Ok(Value::String(text)),
        None => match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(text)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 요청 하나를 받아 고정 응답을 돌려주는 로컬 서버
    async fn serve_once(response: &'static str) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if n == 0 || buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });

        let url = Url::parse(&format!("http://{}/api/v4/", addr)).unwrap();
        (url, handle)
    }

    fn client_for(url: Url) -> HttpApiClient {
        HttpApiClient::new(&ServerConfig::new(url).with_token("glpat-test")).unwrap()
    }

    #[test]
    fn test_excerpt_respects_char_boundary() {
        assert_eq!(excerpt("   ", 10), None);
        assert_eq!(excerpt("short", 10).as_deref(), Some("short"));
        assert_eq!(excerpt("가나다", 4).as_deref(), Some("가"));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(Some(true), r#"{"id":1}"#.into()).unwrap(), json!({"id": 1}));
        assert_eq!(
            decode_body(Some(false), "line 1\nline 2".into()).unwrap(),
            json!("line 1\nline 2")
        );
        assert_eq!(decode_body(None, "plain".into()).unwrap(), json!("plain"));
        assert_eq!(decode_body(Some(true), "".into()).unwrap(), Value::Null);
        assert!(decode_body(Some(true), "{broken".into()).is_err());
    }

    #[tokio::test]
    async fn test_get_sends_token_and_query() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 24\r\nConnection: close\r\n\r\n{\"id\":123,\"name\":\"demo\"}",
        )
        .await;
        let client = client_for(url);

        let value = client
            .send(ApiRequest::get("projects/group%2Fdemo").param("statistics", true))
            .await
            .unwrap();
        let raw_request = server.await.unwrap();

        assert_eq!(value, json!({"id": 123, "name": "demo"}));
        assert!(raw_request.starts_with("GET /api/v4/projects/group%2Fdemo?statistics=true "));
        assert!(raw_request.to_ascii_lowercase().contains("private-token: glpat-test"));
    }

    #[test]
    fn test_dot_segments_detected() {
        for segment in [".", "..", "%2E%2E", "%2e.", ".%2E"] {
            assert!(is_dot_segment(segment), "{}", segment);
        }
        for segment in ["", "...", "v1.2", "%2E%2E%2E", "projects"] {
            assert!(!is_dot_segment(segment), "{}", segment);
        }
    }

    #[tokio::test]
    async fn test_relative_segment_never_sent() {
        let url = Url::parse("http://127.0.0.1:9/api/v4/").unwrap();
        let client = client_for(url);

        for path in ["projects/5/pipelines/..", "projects/5/pipelines/%2E%2E", "groups/3/members/."] {
            let err = client.send(ApiRequest::delete(path)).await.unwrap_err();
            assert!(matches!(err, ToolError::Transport(_)), "{}: {:?}", path, err);
        }
    }

    #[tokio::test]
    async fn test_non_success_is_upstream_error() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: 35\r\nConnection: close\r\n\r\n{\"message\":\"404 Project Not Found\"}",
        )
        .await;
        let client = client_for(url);

        let err = client.get("projects/9".into(), Vec::new()).await.unwrap_err();
        server.await.unwrap();

        match err {
            ToolError::Upstream {
                status,
                status_text,
                body_excerpt,
            } => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
                assert!(body_excerpt.unwrap().contains("404 Project Not Found"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_content_is_null() {
        let (url, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n").await;
        let client = client_for(url);

        let value = client.delete("projects/9".into()).await.unwrap();
        server.await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/api/v4/", addr)).unwrap();
        let err = client_for(url)
            .get("projects".into(), Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
