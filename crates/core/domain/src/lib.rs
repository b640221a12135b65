//! 设备消息领域模型：编解码器与传输层共享的类型。

pub mod data;
pub mod message;

pub use data::{MqttMessage, Payload, RawUplink, TopicMessage};
pub use message::{
    ChildDeviceMessage, DeviceMessage, DeviceOfflineMessage, DeviceOnlineMessage,
    DeviceRegisterMessage, DeviceUnregisterMessage, EventMessage, FunctionInvokeMessage,
    FunctionInvokeMessageReply, FunctionParameter, MessageKind, ReadPropertyMessage,
    ReadPropertyMessageReply, ReportPropertyMessage, WritePropertyMessage,
    WritePropertyMessageReply,
};
