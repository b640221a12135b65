//! 编解码错误类型定义

use domain::MessageKind;

/// 解码错误
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// topic 不在解码表中（非致命，调用方应忽略该报文）
    #[error("no decode route for topic: {topic}")]
    NoMatch { topic: String },

    /// 负载不是 JSON 对象，或缺少/错配必需字段
    #[error("malformed payload on {topic}: {reason}")]
    MalformedPayload { topic: String, reason: String },

    /// `/children` 内层 topic 解码失败
    #[error("child message on {topic} failed to decode: {source}")]
    RecursionFailure {
        topic: String,
        #[source]
        source: Box<DecodeError>,
    },

    /// 子设备嵌套层数超出上限
    #[error("child nesting on {topic} exceeds {max_depth} levels")]
    NestingTooDeep { topic: String, max_depth: usize },

    /// `/children` 报文缺少网关设备上下文
    #[error("missing device context for {topic}")]
    MissingDeviceContext { topic: String },
}

impl DecodeError {
    pub(crate) fn malformed(topic: &str, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            topic: topic.to_string(),
            reason: reason.to_string(),
        }
    }

    /// `NoMatch` 之外的错误都使本次解码失败。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoMatch { .. })
    }
}

/// 编码错误
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// 该消息类型只能解码（设备上行），不能下发
    #[error("message kind {kind} cannot be encoded")]
    Unsupported { kind: MessageKind },

    /// 负载序列化失败
    #[error("payload error: {0}")]
    Payload(String),
}
