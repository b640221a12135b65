//! # 设备协议编解码能力模块
//!
//! 在 MQTT 风格的 topic + JSON 对象与设备消息模型之间双向转换。
//!
//! ## 架构设计
//!
//! ```text
//! MqttMessage (topic + bytes)
//!       │
//!       ▼
//! DeviceMessageCodec ── serde_json 字节 ⇄ JSON 对象
//!       │
//!       ├── TopicDecoder：DECODE_TABLE 有序前缀匹配
//!       │       └── /children → 递归解码内层 topic，包裹为 ChildDeviceMessage
//!       │
//!       └── encode：按消息变体匹配
//!               └── ChildDeviceMessage → 编码内层，topic 前加 /children
//! ```
//!
//! ## 报文格式
//!
//! ```json
//! // /read-property（下行请求）
//! { "messageId": "1", "deviceId": "d1", "properties": ["temp"] }
//!
//! // /read-property（设备回复）
//! { "messageId": "1", "deviceId": "d1", "properties": { "temp": 21.5 }, "success": true }
//!
//! // /invoke-function（下行请求）
//! { "messageId": "2", "deviceId": "d1", "function": "reboot", "args": [{ "name": "delay", "value": 5 }] }
//! ```

mod decoder;
mod encoder;
mod error;
mod id;
mod mqtt;
pub mod topic;
mod wire;

pub use decoder::{DECODE_TABLE, DEFAULT_MAX_CHILD_DEPTH, TopicDecoder, TopicRoute, route_for};
pub use encoder::encode;
pub use error::{DecodeError, EncodeError};
pub use id::{IdGenerator, MAX_WORKER_ID, SnowflakeIdGenerator, UuidIdGenerator};
pub use mqtt::{DeviceMessageCodec, Transport};
