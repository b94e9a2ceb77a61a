//! API path builder
//!
//! 고정 segment는 그대로, 호출자가 준 값은 percent-encode 합니다.
//! `.`도 `%2E`로 바꿔서 dynamic segment가 `..`로 해석되지 않게 합니다.
//!
//! ```ignore
//! let path = ApiPath::new("projects").id("group/project").push("pipelines");
//! assert_eq!(path.as_str(), "projects/group%2Fproject/pipelines");
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    path: String,
}

impl ApiPath {
    pub fn new(root: &'static str) -> Self {
        Self {
            path: root.trim_matches('/').to_string(),
        }
    }

    /// 고정 segment 추가
    pub fn push(mut self, segment: &'static str) -> Self {
        self.path.push('/');
        self.path.push_str(segment.trim_matches('/'));
        self
    }

    /// 동적 segment 추가 (percent-encoded)
    pub fn id(mut self, value: &str) -> Self {
        self.path.push('/');
        self.path
            .push_str(&urlencoding::encode(value).replace('.', "%2E"));
        self
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<ApiPath> for String {
    fn from(path: ApiPath) -> Self {
        path.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_dynamic_segments() {
        let path = ApiPath::new("projects")
            .id("group/sub project")
            .push("members")
            .id("7");
        assert_eq!(path.as_str(), "projects/group%2Fsub%20project/members/7");
    }

    #[test]
    fn test_dots_encoded() {
        let path = ApiPath::new("projects").id("acme/app.v2").push("pipelines").id("..");
        assert_eq!(path.as_str(), "projects/acme%2Fapp%2Ev2/pipelines/%2E%2E");
    }

    #[test]
    fn test_fixed_segments_trimmed() {
        let path = ApiPath::new("/groups/").id("42").push("/members/all");
        assert_eq!(path.to_string(), "groups/42/members/all");
    }
}
