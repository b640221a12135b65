//! 设备消息模型（封闭变体集合）。

use crate::data::Payload;
use serde::{Deserialize, Serialize};

/// 设备事件（火警、故障告警、通用设备事件）。
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub event: String,
    pub data: Payload,
}

/// 设备注册。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRegisterMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
}

/// 设备注销。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceUnregisterMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
}

/// 设备上线。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOnlineMessage {
    pub device_id: String,
}

/// 设备离线。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOfflineMessage {
    pub device_id: String,
}

/// 属性定时上报。
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPropertyMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub properties: Payload,
}

/// 读属性请求（平台 → 设备）。
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub properties: Vec<String>,
}

/// 读属性回复。
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMessageReply {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub properties: Payload,
    pub success: bool,
}

/// 写属性请求（平台 → 设备）。
#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub properties: Payload,
}

/// 写属性回复。
#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyMessageReply {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub properties: Payload,
    pub success: bool,
}

/// 功能调用入参。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    pub value: serde_json::Value,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 功能调用请求（平台 → 设备）。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInvokeMessage {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub function_id: String,
    pub inputs: Vec<FunctionParameter>,
}

/// 功能调用回复。
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInvokeMessageReply {
    pub device_id: String,
    pub message_id: String,
    pub timestamp: Option<i64>,
    pub function_id: String,
    pub output: serde_json::Value,
    pub code: Option<String>,
    pub success: bool,
}

/// 子设备消息：网关 `device_id` 包裹一个子设备消息。
///
/// `child_device_id` 只能由被包裹消息的 `device_id` 推导，
/// 因此字段不公开，只能通过 [`ChildDeviceMessage::new`] 构造。
#[derive(Debug, Clone, PartialEq)]
pub struct ChildDeviceMessage {
    device_id: String,
    child_device_id: String,
    child_device_message: Box<DeviceMessage>,
}

impl ChildDeviceMessage {
    pub fn new(device_id: impl Into<String>, child: DeviceMessage) -> Self {
        Self {
            device_id: device_id.into(),
            child_device_id: child.device_id().to_string(),
            child_device_message: Box::new(child),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn child_device_id(&self) -> &str {
        &self.child_device_id
    }

    pub fn child_device_message(&self) -> &DeviceMessage {
        &self.child_device_message
    }

    pub fn into_child_device_message(self) -> DeviceMessage {
        *self.child_device_message
    }
}

/// 设备消息变体标识（用于日志与错误）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Event,
    DeviceRegister,
    DeviceUnregister,
    DeviceOnline,
    DeviceOffline,
    ReportProperty,
    ReadProperty,
    ReadPropertyReply,
    WriteProperty,
    WritePropertyReply,
    FunctionInvoke,
    FunctionInvokeReply,
    ChildDevice,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::DeviceRegister => "device_register",
            Self::DeviceUnregister => "device_unregister",
            Self::DeviceOnline => "device_online",
            Self::DeviceOffline => "device_offline",
            Self::ReportProperty => "report_property",
            Self::ReadProperty => "read_property",
            Self::ReadPropertyReply => "read_property_reply",
            Self::WriteProperty => "write_property",
            Self::WritePropertyReply => "write_property_reply",
            Self::FunctionInvoke => "function_invoke",
            Self::FunctionInvokeReply => "function_invoke_reply",
            Self::ChildDevice => "child_device",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 设备消息。
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    Event(EventMessage),
    DeviceRegister(DeviceRegisterMessage),
    DeviceUnregister(DeviceUnregisterMessage),
    DeviceOnline(DeviceOnlineMessage),
    DeviceOffline(DeviceOfflineMessage),
    ReportProperty(ReportPropertyMessage),
    ReadProperty(ReadPropertyMessage),
    ReadPropertyReply(ReadPropertyMessageReply),
    WriteProperty(WritePropertyMessage),
    WritePropertyReply(WritePropertyMessageReply),
    FunctionInvoke(FunctionInvokeMessage),
    FunctionInvokeReply(FunctionInvokeMessageReply),
    ChildDevice(ChildDeviceMessage),
}

impl DeviceMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Event(_) => MessageKind::Event,
            Self::DeviceRegister(_) => MessageKind::DeviceRegister,
            Self::DeviceUnregister(_) => MessageKind::DeviceUnregister,
            Self::DeviceOnline(_) => MessageKind::DeviceOnline,
            Self::DeviceOffline(_) => MessageKind::DeviceOffline,
            Self::ReportProperty(_) => MessageKind::ReportProperty,
            Self::ReadProperty(_) => MessageKind::ReadProperty,
            Self::ReadPropertyReply(_) => MessageKind::ReadPropertyReply,
            Self::WriteProperty(_) => MessageKind::WriteProperty,
            Self::WritePropertyReply(_) => MessageKind::WritePropertyReply,
            Self::FunctionInvoke(_) => MessageKind::FunctionInvoke,
            Self::FunctionInvokeReply(_) => MessageKind::FunctionInvokeReply,
            Self::ChildDevice(_) => MessageKind::ChildDevice,
        }
    }

    pub fn device_id(&self) -> &str {
        match self {
            Self::Event(m) => &m.device_id,
            Self::DeviceRegister(m) => &m.device_id,
            Self::DeviceUnregister(m) => &m.device_id,
            Self::DeviceOnline(m) => &m.device_id,
            Self::DeviceOffline(m) => &m.device_id,
            Self::ReportProperty(m) => &m.device_id,
            Self::ReadProperty(m) => &m.device_id,
            Self::ReadPropertyReply(m) => &m.device_id,
            Self::WriteProperty(m) => &m.device_id,
            Self::WritePropertyReply(m) => &m.device_id,
            Self::FunctionInvoke(m) => &m.device_id,
            Self::FunctionInvokeReply(m) => &m.device_id,
            Self::ChildDevice(m) => m.device_id(),
        }
    }

    /// 上下线消息不携带消息 ID；子设备消息取被包裹消息的 ID。
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Event(m) => Some(&m.message_id),
            Self::DeviceRegister(m) => Some(&m.message_id),
            Self::DeviceUnregister(m) => Some(&m.message_id),
            Self::DeviceOnline(_) | Self::DeviceOffline(_) => None,
            Self::ReportProperty(m) => Some(&m.message_id),
            Self::ReadProperty(m) => Some(&m.message_id),
            Self::ReadPropertyReply(m) => Some(&m.message_id),
            Self::WriteProperty(m) => Some(&m.message_id),
            Self::WritePropertyReply(m) => Some(&m.message_id),
            Self::FunctionInvoke(m) => Some(&m.message_id),
            Self::FunctionInvokeReply(m) => Some(&m.message_id),
            Self::ChildDevice(m) => m.child_device_message().message_id(),
        }
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Event(m) => m.timestamp,
            Self::DeviceRegister(m) => m.timestamp,
            Self::DeviceUnregister(m) => m.timestamp,
            Self::DeviceOnline(_) | Self::DeviceOffline(_) => None,
            Self::ReportProperty(m) => m.timestamp,
            Self::ReadProperty(m) => m.timestamp,
            Self::ReadPropertyReply(m) => m.timestamp,
            Self::WriteProperty(m) => m.timestamp,
            Self::WritePropertyReply(m) => m.timestamp,
            Self::FunctionInvoke(m) => m.timestamp,
            Self::FunctionInvokeReply(m) => m.timestamp,
            Self::ChildDevice(m) => m.child_device_message().timestamp(),
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for DeviceMessage {
                fn from(message: $ty) -> Self {
                    Self::$variant(message)
                }
            }
        )*
    };
}

impl_from_variant!(
    Event(EventMessage),
    DeviceRegister(DeviceRegisterMessage),
    DeviceUnregister(DeviceUnregisterMessage),
    DeviceOnline(DeviceOnlineMessage),
    DeviceOffline(DeviceOfflineMessage),
    ReportProperty(ReportPropertyMessage),
    ReadProperty(ReadPropertyMessage),
    ReadPropertyReply(ReadPropertyMessageReply),
    WriteProperty(WritePropertyMessage),
    WritePropertyReply(WritePropertyMessageReply),
    FunctionInvoke(FunctionInvokeMessage),
    FunctionInvokeReply(FunctionInvokeMessageReply),
    ChildDevice(ChildDeviceMessage),
);
