//! 消息信封：请求与响应共用的线上格式。
//!
//! 每一帧都是一个 JSON 对象：
//! `{"type": "success"|"error", "key": "utf-8", "message": "...", "value": {...}|null}`。

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 所有响应携带的文本编码标识。
pub const ENCODING: &str = "utf-8";

/// 错误响应中原因字段的键名。
pub const REASON_KEY: &str = "reason";

/// 序列化失败时返回的兜底帧。
const FALLBACK_ERROR_FRAME: &str =
    r#"{"type":"error","key":"utf-8","message":"encode_error","value":{"reason":"Failed to encode response"}}"#;

/// 信封附带的字符串键值表。
pub type Payload = BTreeMap<String, String>;

/// 信封解码错误。
#[derive(Debug, Error)]
#[error("malformed message: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// 信封类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    /// 成功响应。
    Success,
    /// 错误响应。
    Error,
    /// 客户端请求（客户端发送的任意其他类别，如 `"files"`）。
    #[default]
    Request,
}

impl<'de> Deserialize<'de> for EnvelopeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("success") => Self::Success,
            Some("error") => Self::Error,
            _ => Self::Request,
        })
    }
}

/// 统一的消息信封，请求与响应使用相同结构。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// 成功 / 错误判别字段。
    #[serde(rename = "type", default)]
    pub kind: EnvelopeType,
    /// 编码标识。
    #[serde(default)]
    pub key: String,
    /// 请求中为操作码，响应中为操作标签或说明文本。
    pub message: String,
    /// 附带的值，可为空。
    #[serde(default, deserialize_with = "deserialize_payload")]
    pub value: Option<Payload>,
}

impl Envelope {
    /// 构造成功响应。
    pub fn success(message: impl Into<String>, value: Option<Payload>) -> Self {
        Self {
            kind: EnvelopeType::Success,
            key: ENCODING.to_string(),
            message: message.into(),
            value,
        }
    }

    /// 构造错误响应，`value` 仅包含 `reason`。
    pub fn error(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeType::Error,
            key: ENCODING.to_string(),
            message: message.into(),
            value: Some(Payload::from([(REASON_KEY.to_string(), reason.into())])),
        }
    }

    /// 构造客户端请求。
    pub fn request(message: impl Into<String>, value: Payload) -> Self {
        Self {
            kind: EnvelopeType::Request,
            key: String::new(),
            message: message.into(),
            value: Some(value),
        }
    }

    /// 从线上文本解码。
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// 编码为线上文本。
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_ERROR_FRAME.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.kind == EnvelopeType::Success
    }

    pub fn is_error(&self) -> bool {
        self.kind == EnvelopeType::Error
    }

    /// 读取 `value` 中的某个字段。
    pub fn field(&self, name: &str) -> Option<&str> {
        self.value
            .as_ref()
            .and_then(|value| value.get(name))
            .map(String::as_str)
    }

    /// 错误响应的原因文本。
    pub fn reason(&self) -> Option<&str> {
        self.field(REASON_KEY)
    }
}

/// 直接生成错误响应文本。
pub fn encode_error(operation: &str, reason: &str) -> String {
    Envelope::error(operation, reason).encode()
}

// 数字与布尔值按 JSON 文本转为字符串，null 视为缺省。
fn deserialize_payload<'de, D>(deserializer: D) -> Result<Option<Payload>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::Null => None,
                Value::String(text) => Some(Ok((name, text))),
                Value::Bool(flag) => Some(Ok((name, flag.to_string()))),
                Value::Number(number) => Some(Ok((name, number.to_string()))),
                Value::Array(_) | Value::Object(_) => Some(Err(de::Error::custom(format!(
                    "value field `{name}` must be a scalar"
                )))),
            })
            .collect::<Result<Payload, D::Error>>()
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_frame_has_canonical_shape() {
        let value = Payload::from([("1".to_string(), "a".to_string())]);
        let json = Envelope::success("file_open", Some(value)).encode();
        let parsed: Value = serde_json::from_str(&json).expect("encoded frame is JSON");

        assert_eq!(parsed["type"], "success");
        assert_eq!(parsed["key"], ENCODING);
        assert_eq!(parsed["message"], "file_open");
        assert_eq!(parsed["value"]["1"], "a");
    }

    #[test]
    fn success_without_payload_encodes_null_value() {
        let json = Envelope::success("file_save", None).encode();
        let parsed: Value = serde_json::from_str(&json).expect("encoded frame is JSON");
        assert!(parsed["value"].is_null());
    }

    #[test]
    fn error_frame_carries_only_reason() {
        let json = encode_error("path_delete", "Delete error");
        let decoded = Envelope::decode(&json).expect("error frame decodes");

        assert!(decoded.is_error());
        assert_eq!(decoded.message, "path_delete");
        assert_eq!(decoded.reason(), Some("Delete error"));
        assert_eq!(decoded.value.as_ref().map(Payload::len), Some(1));
    }

    #[test]
    fn decode_accepts_browser_request() {
        let raw = r#"{"type":"files","key":"","message":"file_open","value":{"path":"/tmp/a.txt"}}"#;
        let decoded = Envelope::decode(raw).expect("request decodes");

        assert_eq!(decoded.kind, EnvelopeType::Request);
        assert_eq!(decoded.message, "file_open");
        assert_eq!(decoded.field("path"), Some("/tmp/a.txt"));
    }

    #[test]
    fn decode_tolerates_unknown_fields_and_missing_value() {
        let decoded = Envelope::decode(r#"{"message":"path_each","extra":42}"#)
            .expect("unknown fields are ignored");
        assert_eq!(decoded.kind, EnvelopeType::Request);
        assert!(decoded.value.is_none());

        let decoded =
            Envelope::decode(r#"{"message":"path_each","value":null}"#).expect("null value");
        assert!(decoded.value.is_none());
    }

    #[test]
    fn decode_stringifies_scalar_values() {
        let raw = r#"{"message":"file_read_line","value":{"lineNum":3,"flag":true,"gone":null}}"#;
        let decoded = Envelope::decode(raw).expect("scalars decode");

        assert_eq!(decoded.field("lineNum"), Some("3"));
        assert_eq!(decoded.field("flag"), Some("true"));
        assert_eq!(decoded.field("gone"), None);
    }

    #[test]
    fn decode_rejects_malformed_frames() {
        assert!(Envelope::decode("not json").is_err());
        assert!(Envelope::decode(r#"{"type":"files"}"#).is_err());
        assert!(Envelope::decode(r#"{"message":"x","value":{"nested":{"a":1}}}"#).is_err());
        assert!(Envelope::decode(r#"{"message":"x","value":"text"}"#).is_err());
    }
}
