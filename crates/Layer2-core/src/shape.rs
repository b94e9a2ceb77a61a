//! Response shaping - 업스트림 응답 후처리 (순수 함수)

use serde::Serialize;
use serde_json::{json, Value};

/// 잘린 로그 앞에 붙는 표시
pub const TRUNCATION_MARKER: &str = "[... log truncated ...]\n";

/// hypermedia `_links` 키를 재귀적으로 제거
pub fn strip_links(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != "_links")
                .map(|(key, v)| (key, strip_links(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_links).collect()),
        other => other,
    }
}

/// 본문 없는 성공 응답(204)을 확인 응답으로
pub fn command_ack(value: Value) -> Value {
    match value {
        Value::Null => json!({ "status": "ok" }),
        other => other,
    }
}

/// 정리된 job log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobLog {
    pub content: String,
    pub truncated: bool,
}

/// job log 정리
///
/// 1. ANSI escape 제거, `\r`로 덮어쓴 줄은 마지막 내용만 유지
/// 2. `tail_lines`가 있으면 마지막 N줄만
/// 3. `max_bytes`를 넘으면 뒤쪽을 남기고 앞에 표시를 붙임
pub fn job_log(raw: &str, tail_lines: Option<usize>, max_bytes: usize) -> JobLog {
    let normalized = raw.replace("\r\n", "\n");
    let overwritten: Vec<&str> = normalized
        .split('\n')
        .map(|line| line.rsplit('\r').next().unwrap_or(line))
        .collect();
    let cleaned = strip_ansi_escapes::strip_str(overwritten.join("\n"));
    let mut lines: Vec<&str> = cleaned.lines().collect();

    let mut truncated = false;
    if let Some(n) = tail_lines {
        if lines.len() > n {
            lines.drain(..lines.len() - n);
            truncated = true;
        }
    }

    let mut content = lines.join("\n");
    if content.len() > max_bytes {
        let mut start = content.len() - max_bytes;
        while !content.is_char_boundary(start) {
            start += 1;
        }
        content = format!("{}{}", TRUNCATION_MARKER, &content[start..]);
        truncated = true;
    }

    JobLog { content, truncated }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_links_recursive() {
        let value = json!({
            "id": 1,
            "_links": {"self": "x"},
            "namespace": {"id": 2, "_links": {"self": "y"}},
            "items": [{"_links": {}, "name": "a"}]
        });
        assert_eq!(
            strip_links(value),
            json!({"id": 1, "namespace": {"id": 2}, "items": [{"name": "a"}]})
        );
    }

    #[test]
    fn test_command_ack() {
        assert_eq!(command_ack(Value::Null), json!({"status": "ok"}));
        assert_eq!(command_ack(json!({"id": 5})), json!({"id": 5}));
    }

    #[test]
    fn test_job_log_strips_ansi_and_carriage_returns() {
        let raw = "\u{1b}[32;1mRunning\u{1b}[0;m\r\nsection_start:1:step\r\u{1b}[0Kbuild\nok\n";
        let log = job_log(raw, None, 1024);
        assert_eq!(log.content, "Running\nbuild\nok");
        assert!(!log.truncated);
    }

    #[test]
    fn test_job_log_tail_lines() {
        let log = job_log("a\nb\nc\nd", Some(2), 1024);
        assert_eq!(log.content, "c\nd");
        assert!(log.truncated);

        let log = job_log("a\nb", Some(5), 1024);
        assert_eq!(log.content, "a\nb");
        assert!(!log.truncated);
    }

    #[test]
    fn test_job_log_byte_bound_keeps_tail() {
        let raw = "0123456789\nabcdefghij";
        let log = job_log(raw, None, 5);
        assert!(log.truncated);
        assert_eq!(log.content, format!("{}fghij", TRUNCATION_MARKER));
    }

    #[test]
    fn test_job_log_byte_bound_char_boundary() {
        let log = job_log("가나다", None, 4);
        assert_eq!(log.content, format!("{}다", TRUNCATION_MARKER));
    }
}
