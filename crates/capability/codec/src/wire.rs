//! 报文负载结构（字段名即线上 JSON 字段名）。

use crate::error::{DecodeError, EncodeError};
use domain::{FunctionParameter, Payload};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 只取 `deviceId` 的报文（事件、注册、注销）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceRef {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OnlineStatusPayload {
    pub device_id: String,
    #[serde(default)]
    pub status: Value,
}

impl OnlineStatusPayload {
    /// `"1"` 或数字 `1` 为上线，其余（含缺省）为离线。
    pub fn is_online(&self) -> bool {
        match &self.status {
            Value::String(status) => status == "1",
            Value::Number(status) => status.as_i64() == Some(1),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportPropertyPayload {
    pub device_id: String,
    pub properties: Payload,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
}

/// 读/写属性回复。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PropertyReplyPayload {
    pub message_id: String,
    pub device_id: String,
    pub properties: Payload,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FunctionInvokeReplyPayload {
    pub function_id: String,
    pub message_id: String,
    pub device_id: String,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadPropertyRequest {
    pub message_id: String,
    pub device_id: String,
    pub properties: Vec<String>,
    #[serde(default, skip_serializing, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WritePropertyRequest {
    pub message_id: String,
    pub device_id: String,
    pub properties: Payload,
    #[serde(default, skip_serializing, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FunctionInvokeRequest {
    pub message_id: String,
    pub device_id: String,
    #[serde(rename = "function")]
    pub function_id: String,
    #[serde(rename = "args", default)]
    pub inputs: Vec<FunctionParameter>,
    #[serde(default, skip_serializing, deserialize_with = "lenient_millis")]
    pub timestamp: Option<i64>,
}

/// 带 `success` 字段的是设备回复，否则是平台下发请求的回显。
pub(crate) fn is_reply(payload: &Payload) -> bool {
    payload.contains_key("success")
}

/// 读属性回复的 `properties` 是取值对象，请求里是属性名数组。
pub(crate) fn carries_property_values(payload: &Payload) -> bool {
    payload.get("properties").is_some_and(Value::is_object)
}

pub(crate) fn parse<T: DeserializeOwned>(topic: &str, payload: &Payload) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(payload.clone()))
        .map_err(|err| DecodeError::malformed(topic, err))
}

pub(crate) fn to_payload<T: Serialize>(value: &T) -> Result<Payload, EncodeError> {
    match serde_json::to_value(value).map_err(|err| EncodeError::Payload(err.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(EncodeError::Payload(format!("expected object, got {other}"))),
    }
}

/// 毫秒时间戳：接受整数或十进制字符串。
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {number}"))),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid timestamp: {text}"))),
        Some(other) => Err(D::Error::custom(format!("invalid timestamp: {other}"))),
    }
}
