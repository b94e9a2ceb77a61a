//! Upstream API client
//!
//! 도구 핸들러는 `ApiClient` trait만 알고, 실제 네트워크 호출은
//! `HttpApiClient`(reqwest)가 담당합니다. 테스트에서는 `MockApiClient`로 교체합니다.
//!
//! 이 레이어는 재시도를 하지 않습니다. non-2xx 응답은 항상
//! `ToolError::Upstream`으로, 요청 실패는 `ToolError::Transport`로 보고됩니다.

mod http;
mod mock;
mod path;

pub use http::HttpApiClient;
pub use mock::MockApiClient;
pub use path::ApiPath;

use crate::ToolError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 요청 본문
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// 업스트림 요청
///
/// 각 필드는 query 또는 body 중 한 곳에만 들어갑니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// query 파라미터 추가
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// 값이 있을 때만 query 파라미터 추가
    pub fn param_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(fields));
        self
    }

    /// query 값 조회 (첫 번째)
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 업스트림 API client
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// 요청 하나를 보내고 응답 본문을 반환
    ///
    /// - 2xx JSON 응답: 파싱된 값
    /// - 2xx non-JSON 응답: 문자열
    /// - 204 / 빈 본문: `null`
    async fn send(&self, request: ApiRequest) -> Result<Value, ToolError>;

    async fn get(&self, path: String, query: Vec<(String, String)>) -> Result<Value, ToolError> {
        let mut request = ApiRequest::get(path);
        request.query = query;
        self.send(request).await
    }

    async fn post(&self, path: String, body: Option<Body>) -> Result<Value, ToolError> {
        let mut request = ApiRequest::post(path);
        request.body = body;
        self.send(request).await
    }

    async fn put(&self, path: String, body: Option<Body>) -> Result<Value, ToolError> {
        let mut request = ApiRequest::put(path);
        request.body = body;
        self.send(request).await
    }

    async fn delete(&self, path: String) -> Result<Value, ToolError> {
        self.send(ApiRequest::delete(path)).await
    }
}
