//! 上行解码：按声明顺序做 topic 前缀匹配，首个命中的路由生效。

use crate::error::DecodeError;
use crate::id::IdGenerator;
use crate::topic;
use crate::wire::{
    self, DeviceRef, FunctionInvokeReplyPayload, FunctionInvokeRequest, OnlineStatusPayload,
    PropertyReplyPayload, ReadPropertyRequest, ReportPropertyPayload, WritePropertyRequest,
};
use domain::{
    ChildDeviceMessage, DeviceMessage, DeviceOfflineMessage, DeviceOnlineMessage,
    DeviceRegisterMessage, DeviceUnregisterMessage, EventMessage, FunctionInvokeMessage,
    FunctionInvokeMessageReply, Payload, ReadPropertyMessage, ReadPropertyMessageReply,
    ReportPropertyMessage, WritePropertyMessage, WritePropertyMessageReply,
};
use std::sync::Arc;

/// 默认子设备嵌套上限。
pub const DEFAULT_MAX_CHILD_DEPTH: usize = 8;

type Handler = fn(&DecodeCall<'_>, &str, &Payload) -> Result<DeviceMessage, DecodeError>;

/// 解码路由：topic 前缀 + 处理函数。
pub struct TopicRoute {
    prefix: &'static str,
    handler: Handler,
}

impl TopicRoute {
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }
}

impl std::fmt::Debug for TopicRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRoute")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// 解码表。顺序即优先级。
pub static DECODE_TABLE: &[TopicRoute] = &[
    TopicRoute { prefix: topic::FIRE_ALARM, handler: decode_fire_alarm },
    TopicRoute { prefix: topic::FAULT_ALARM, handler: decode_fault_alarm },
    TopicRoute { prefix: topic::REGISTER, handler: decode_register },
    TopicRoute { prefix: topic::UNREGISTER, handler: decode_unregister },
    TopicRoute { prefix: topic::DEV_MSG, handler: decode_dev_msg },
    TopicRoute { prefix: topic::DEVICE_ONLINE_STATUS, handler: decode_online_status },
    TopicRoute { prefix: topic::READ_PROPERTY, handler: decode_read_property },
    TopicRoute { prefix: topic::REPORT_PROPERTY, handler: decode_report_property },
    TopicRoute { prefix: topic::WRITE_PROPERTY, handler: decode_write_property },
    TopicRoute { prefix: topic::INVOKE_FUNCTION, handler: decode_invoke_function },
    TopicRoute { prefix: topic::CHILDREN, handler: decode_children },
];

/// 查找 topic 命中的第一条路由。
pub fn route_for(topic: &str) -> Option<&'static TopicRoute> {
    DECODE_TABLE.iter().find(|route| topic.starts_with(route.prefix))
}

/// topic + JSON 对象 → 设备消息。
///
/// 无状态、可重入；唯一的外部依赖是注入的 ID 生成器，
/// 每条需要新 ID 的消息最多调用一次。
#[derive(Clone)]
pub struct TopicDecoder {
    ids: Arc<dyn IdGenerator>,
    max_child_depth: usize,
}

impl TopicDecoder {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            ids,
            max_child_depth: DEFAULT_MAX_CHILD_DEPTH,
        }
    }

    pub fn with_max_child_depth(mut self, max_child_depth: usize) -> Self {
        self.max_child_depth = max_child_depth;
        self
    }

    pub fn max_child_depth(&self) -> usize {
        self.max_child_depth
    }

    /// `device_id` 为当前连接设备（网关）ID，子设备报文必需。
    pub fn decode(
        &self,
        device_id: Option<&str>,
        topic: &str,
        payload: &Payload,
    ) -> Result<DeviceMessage, DecodeError> {
        self.decode_at(device_id, topic, payload, 0)
    }

    fn decode_at(
        &self,
        device_id: Option<&str>,
        topic: &str,
        payload: &Payload,
        depth: usize,
    ) -> Result<DeviceMessage, DecodeError> {
        let route = route_for(topic).ok_or_else(|| DecodeError::NoMatch {
            topic: topic.to_string(),
        })?;
        let call = DecodeCall {
            decoder: self,
            device_id,
            depth,
        };
        (route.handler)(&call, topic, payload)
    }
}

impl std::fmt::Debug for TopicDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicDecoder")
            .field("max_child_depth", &self.max_child_depth)
            .finish_non_exhaustive()
    }
}

/// 单次解码调用的上下文。
struct DecodeCall<'a> {
    decoder: &'a TopicDecoder,
    device_id: Option<&'a str>,
    depth: usize,
}

impl DecodeCall<'_> {
    fn generate_id(&self) -> String {
        self.decoder.ids.generate()
    }
}

fn decode_fire_alarm(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    event_message(call, topic, payload, topic::EVENT_FIRE_ALARM)
}

fn decode_fault_alarm(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    event_message(call, topic, payload, topic::EVENT_FAULT_ALARM)
}

fn decode_dev_msg(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    event_message(call, topic, payload, topic::EVENT_DEV_MSG)
}

/// 事件数据为整个负载。
fn event_message(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
    event: &str,
) -> Result<DeviceMessage, DecodeError> {
    let DeviceRef { device_id } = wire::parse(topic, payload)?;
    Ok(EventMessage {
        device_id,
        message_id: call.generate_id(),
        timestamp: None,
        event: event.to_string(),
        data: payload.clone(),
    }
    .into())
}

fn decode_register(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    let DeviceRef { device_id } = wire::parse(topic, payload)?;
    Ok(DeviceRegisterMessage {
        device_id,
        message_id: call.generate_id(),
        timestamp: Some(now_epoch_ms()),
    }
    .into())
}

fn decode_unregister(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    let DeviceRef { device_id } = wire::parse(topic, payload)?;
    Ok(DeviceUnregisterMessage {
        device_id,
        message_id: call.generate_id(),
        timestamp: Some(now_epoch_ms()),
    }
    .into())
}

fn decode_online_status(
    _call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    let status: OnlineStatusPayload = wire::parse(topic, payload)?;
    let online = status.is_online();
    let device_id = status.device_id;
    if online {
        Ok(DeviceOnlineMessage { device_id }.into())
    } else {
        Ok(DeviceOfflineMessage { device_id }.into())
    }
}

fn decode_read_property(
    _call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    if wire::is_reply(payload) {
        let reply: PropertyReplyPayload = wire::parse(topic, payload)?;
        return Ok(ReadPropertyMessageReply {
            device_id: reply.device_id,
            message_id: reply.message_id,
            timestamp: reply.timestamp,
            properties: reply.properties,
            success: reply.success,
        }
        .into());
    }
    if wire::carries_property_values(payload) {
        return Err(DecodeError::malformed(
            topic,
            "read-property reply is missing field `success`",
        ));
    }
    let request: ReadPropertyRequest = wire::parse(topic, payload)?;
    Ok(ReadPropertyMessage {
        device_id: request.device_id,
        message_id: request.message_id,
        timestamp: request.timestamp,
        properties: request.properties,
    }
    .into())
}

/// 上报消息由设备发起，消息 ID 在此生成。
fn decode_report_property(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    let report: ReportPropertyPayload = wire::parse(topic, payload)?;
    Ok(ReportPropertyMessage {
        device_id: report.device_id,
        message_id: call.generate_id(),
        timestamp: report.timestamp,
        properties: report.properties,
    }
    .into())
}

fn decode_write_property(
    _call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    if wire::is_reply(payload) {
        let reply: PropertyReplyPayload = wire::parse(topic, payload)?;
        return Ok(WritePropertyMessageReply {
            device_id: reply.device_id,
            message_id: reply.message_id,
            timestamp: reply.timestamp,
            properties: reply.properties,
            success: reply.success,
        }
        .into());
    }
    let request: WritePropertyRequest = wire::parse(topic, payload)?;
    Ok(WritePropertyMessage {
        device_id: request.device_id,
        message_id: request.message_id,
        timestamp: request.timestamp,
        properties: request.properties,
    }
    .into())
}

fn decode_invoke_function(
    _call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    if wire::is_reply(payload) {
        let reply: FunctionInvokeReplyPayload = wire::parse(topic, payload)?;
        return Ok(FunctionInvokeMessageReply {
            device_id: reply.device_id,
            message_id: reply.message_id,
            timestamp: reply.timestamp,
            function_id: reply.function_id,
            output: reply.output,
            code: reply.code,
            success: reply.success,
        }
        .into());
    }
    let request: FunctionInvokeRequest = wire::parse(topic, payload)?;
    Ok(FunctionInvokeMessage {
        device_id: request.device_id,
        message_id: request.message_id,
        timestamp: request.timestamp,
        function_id: request.function_id,
        inputs: request.inputs,
    }
    .into())
}

/// `/children{inner}`：用同一负载递归解码 `{inner}`，再以网关 ID 包裹。
fn decode_children(
    call: &DecodeCall<'_>,
    topic: &str,
    payload: &Payload,
) -> Result<DeviceMessage, DecodeError> {
    let max_depth = call.decoder.max_child_depth;
    if call.depth >= max_depth {
        return Err(DecodeError::NestingTooDeep {
            topic: topic.to_string(),
            max_depth,
        });
    }
    let inner_topic = topic.strip_prefix(topic::CHILDREN).unwrap_or_default();
    let child = match call
        .decoder
        .decode_at(call.device_id, inner_topic, payload, call.depth + 1)
    {
        Ok(child) => child,
        Err(err @ DecodeError::NestingTooDeep { .. }) => return Err(err),
        Err(err) => {
            return Err(DecodeError::RecursionFailure {
                topic: topic.to_string(),
                source: Box::new(err),
            });
        }
    };
    let Some(gateway_id) = call.device_id else {
        return Err(DecodeError::MissingDeviceContext {
            topic: topic.to_string(),
        });
    };
    Ok(ChildDeviceMessage::new(gateway_id, child).into())
}

fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
