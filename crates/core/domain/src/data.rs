/// 有序 JSON 对象（键顺序与报文一致）。
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// topic + JSON 对象，编解码器与传输层交换的单元。
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: Payload,
}

impl TopicMessage {
    pub fn new(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// MQTT 报文（字节负载）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl MqttMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// 上行原始报文：已从 MQTT topic 中拆出设备 ID。
#[derive(Debug, Clone)]
pub struct RawUplink {
    /// 连接设备（网关）ID。
    pub device_id: String,
    /// 去掉上行前缀与设备段后的报文，topic 以 `/` 开头。
    pub message: MqttMessage,
    pub received_at_ms: i64,
}
