//! 테스트용 API client
//!
//! `(method, path)`별로 고정 응답을 등록하고, 받은 요청을 모두 기록합니다.
//! 등록되지 않은 요청은 404 `Upstream` 에러를 반환합니다.

use super::{ApiClient, ApiRequest, Method};
use crate::ToolError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockApiClient {
    responses: Mutex<HashMap<(Method, String), Result<Value, ToolError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공 응답 등록
    pub fn respond(self, method: Method, path: &str, body: Value) -> Self {
        self.responses
            .lock()
            .insert((method, path.to_string()), Ok(body));
        self
    }

    /// 실패 응답 등록
    pub fn fail(self, method: Method, path: &str, error: ToolError) -> Self {
        self.responses
            .lock()
            .insert((method, path.to_string()), Err(error));
        self
    }

    /// 기록된 요청 (순서대로)
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().push(request);

        match self.responses.lock().get(&key) {
            Some(response) => response.clone(),
            None => Err(ToolError::Upstream {
                status: 404,
                status_text: "Not Found".to_string(),
                body_excerpt: Some(format!("no canned response for {} {}", key.0, key.1)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_canned_and_recorded() {
        let mock = MockApiClient::new().respond(Method::Get, "projects/1", json!({"id": 1}));

        assert_eq!(
            mock.get("projects/1".into(), Vec::new()).await.unwrap(),
            json!({"id": 1})
        );
        let err = mock.delete("projects/2".into()).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");

        assert_eq!(mock.request_count(), 2);
        assert_eq!(mock.requests()[1].method, Method::Delete);
    }
}
