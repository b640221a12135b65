//! 上行链路装配模块
//!
//! 将 MQTT 上行源与设备协议编解码器组装在一起：
//! 上行源拆出网关设备 ID 与协议 topic，解码器把报文转换为设备消息。

use crate::downlink::connection;
use dmp_codec::{DecodeError, DeviceMessageCodec};
use dmp_config::AppConfig;
use dmp_ingest::{IngestError, MqttSource, MqttSourceConfig, NoopSource, RawUplinkHandler, Source};
use dmp_telemetry::{
    record_decode_failure, record_decode_no_match, record_message_decoded, record_uplink_received,
};
use domain::{DeviceMessage, RawUplink};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 解码处理器
///
/// 实现 `RawUplinkHandler`，按错误分类处理解码结果：
/// 未命中解码表的报文直接忽略，其余错误交回上行源记录。
pub struct DecodeHandler {
    codec: DeviceMessageCodec,
}

impl DecodeHandler {
    pub fn new(codec: DeviceMessageCodec) -> Self {
        Self { codec }
    }
}

#[async_trait::async_trait]
impl RawUplinkHandler for DecodeHandler {
    async fn handle(&self, uplink: RawUplink) -> Result<(), IngestError> {
        record_uplink_received();
        debug!(
            target: "dmp.uplink",
            device_id = %uplink.device_id,
            topic = %uplink.message.topic,
            payload_size = uplink.message.payload.len(),
            received_at_ms = uplink.received_at_ms,
            "uplink_received"
        );

        match self.codec.decode(Some(&uplink.device_id), &uplink.message) {
            Ok(message) => {
                record_message_decoded();
                info!(
                    target: "dmp.uplink",
                    device_id = %uplink.device_id,
                    topic = %uplink.message.topic,
                    kind = %message.kind(),
                    message_device_id = %message.device_id(),
                    message_id = ?message.message_id(),
                    child_device_id = ?child_device_id(&message),
                    "device_message_decoded"
                );
                Ok(())
            }
            Err(err @ DecodeError::NoMatch { .. }) => {
                record_decode_no_match();
                info!(
                    target: "dmp.uplink",
                    device_id = %uplink.device_id,
                    error = %err,
                    "uplink_ignored"
                );
                Ok(())
            }
            Err(err) => {
                record_decode_failure();
                warn!(
                    target: "dmp.uplink",
                    device_id = %uplink.device_id,
                    topic = %uplink.message.topic,
                    error = %err,
                    "uplink_decode_failed"
                );
                Err(IngestError::Handler(err.to_string()))
            }
        }
    }
}

fn child_device_id(message: &DeviceMessage) -> Option<&str> {
    match message {
        DeviceMessage::ChildDevice(child) => Some(child.child_device_id()),
        _ => None,
    }
}

/// 启动上行任务
///
/// 根据配置选择 MQTT 上行源或空操作源，在后台运行。
pub fn spawn_uplink(config: &AppConfig, codec: DeviceMessageCodec) -> tokio::task::JoinHandle<()> {
    let handler = Arc::new(DecodeHandler::new(codec));

    let source: Arc<dyn Source> = if config.ingest_enabled {
        let mqtt_config = MqttSourceConfig {
            connection: connection(config),
            topic_prefix: config.mqtt_uplink_topic_prefix.clone(),
            qos: config.mqtt_uplink_qos,
            client_prefix: "dmp-bridge-uplink".to_string(),
        };
        info!(
            "uplink source: mqtt {}:{} prefix={}",
            mqtt_config.connection.host, mqtt_config.connection.port, mqtt_config.topic_prefix
        );
        Arc::new(MqttSource::new(mqtt_config))
    } else {
        info!("uplink source: noop (DMP_INGEST=off)");
        Arc::new(NoopSource)
    };

    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!("uplink stopped: {}", err);
        }
    })
}
