//! MQTT 报文编解码：字节负载 ⇄ JSON 对象 ⇄ 设备消息。

use crate::decoder::TopicDecoder;
use crate::encoder::encode;
use crate::error::{DecodeError, EncodeError};
use domain::{DeviceMessage, MqttMessage, Payload};
use tracing::debug;

/// 编解码器支持的传输协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Mqtt,
}

/// MQTT 设备消息编解码器。
#[derive(Debug, Clone)]
pub struct DeviceMessageCodec {
    decoder: TopicDecoder,
}

impl DeviceMessageCodec {
    pub fn new(decoder: TopicDecoder) -> Self {
        Self { decoder }
    }

    pub fn supported_transport(&self) -> Transport {
        Transport::Mqtt
    }

    pub fn decoder(&self) -> &TopicDecoder {
        &self.decoder
    }

    pub fn decode(
        &self,
        device_id: Option<&str>,
        message: &MqttMessage,
    ) -> Result<DeviceMessage, DecodeError> {
        let payload = parse_object(&message.topic, &message.payload)?;
        debug!(
            target: "dmp.codec",
            device_id = ?device_id,
            topic = %message.topic,
            payload_size = message.payload.len(),
            "handle_device_message"
        );
        self.decoder.decode(device_id, &message.topic, &payload)
    }

    pub fn encode(&self, message: &DeviceMessage) -> Result<MqttMessage, EncodeError> {
        let encoded = encode(message)?;
        let payload = serde_json::to_vec(&encoded.payload)
            .map_err(|err| EncodeError::Payload(err.to_string()))?;
        Ok(MqttMessage::new(encoded.topic, payload))
    }
}

fn parse_object(topic: &str, bytes: &[u8]) -> Result<Payload, DecodeError> {
    serde_json::from_slice::<Payload>(bytes).map_err(|err| DecodeError::malformed(topic, err))
}
