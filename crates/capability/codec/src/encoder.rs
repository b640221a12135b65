//! 下行编码：只支持平台发往设备的请求类消息。

use crate::error::EncodeError;
use crate::topic;
use crate::wire::{self, FunctionInvokeRequest, ReadPropertyRequest, WritePropertyRequest};
use domain::{DeviceMessage, TopicMessage};

/// 设备消息 → topic + JSON 对象。
///
/// 子设备消息先编码内层，再在 topic 前加 `/children`，负载原样复用。
pub fn encode(message: &DeviceMessage) -> Result<TopicMessage, EncodeError> {
    match message {
        DeviceMessage::ReadProperty(m) => {
            let payload = wire::to_payload(&ReadPropertyRequest {
                message_id: m.message_id.clone(),
                device_id: m.device_id.clone(),
                properties: m.properties.clone(),
                timestamp: m.timestamp,
            })?;
            Ok(TopicMessage::new(topic::READ_PROPERTY, payload))
        }
        DeviceMessage::WriteProperty(m) => {
            let payload = wire::to_payload(&WritePropertyRequest {
                message_id: m.message_id.clone(),
                device_id: m.device_id.clone(),
                properties: m.properties.clone(),
                timestamp: m.timestamp,
            })?;
            Ok(TopicMessage::new(topic::WRITE_PROPERTY, payload))
        }
        DeviceMessage::FunctionInvoke(m) => {
            let payload = wire::to_payload(&FunctionInvokeRequest {
                message_id: m.message_id.clone(),
                device_id: m.device_id.clone(),
                function_id: m.function_id.clone(),
                inputs: m.inputs.clone(),
                timestamp: m.timestamp,
            })?;
            Ok(TopicMessage::new(topic::INVOKE_FUNCTION, payload))
        }
        DeviceMessage::ChildDevice(m) => {
            let inner = encode(m.child_device_message())?;
            Ok(TopicMessage::new(
                format!("{}{}", topic::CHILDREN, inner.topic),
                inner.payload,
            ))
        }
        DeviceMessage::Event(_)
        | DeviceMessage::DeviceRegister(_)
        | DeviceMessage::DeviceUnregister(_)
        | DeviceMessage::DeviceOnline(_)
        | DeviceMessage::DeviceOffline(_)
        | DeviceMessage::ReportProperty(_)
        | DeviceMessage::ReadPropertyReply(_)
        | DeviceMessage::WritePropertyReply(_)
        | DeviceMessage::FunctionInvokeReply(_) => Err(EncodeError::Unsupported {
            kind: message.kind(),
        }),
    }
}
