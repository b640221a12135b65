use async_trait::async_trait;
use dmp_codec::{DeviceMessageCodec, EncodeError};
use dmp_ingest::{MqttConnection, mqtt_options, mqtt_qos};
use dmp_telemetry::{
    record_dispatch_failure, record_dispatch_success, record_downlink_encoded,
    record_encode_unsupported,
};
use domain::{DeviceMessage, MqttMessage};
use rumqttc::{AsyncClient, QoS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 下行报文：目标设备 + 编码后的 MQTT 报文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    /// 最外层设备 ID（子设备消息为网关 ID）。
    pub device_id: String,
    pub message: MqttMessage,
}

/// 下行链路错误。
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

/// 下行发布器抽象。
#[async_trait]
pub trait DownlinkDispatcher: Send + Sync {
    async fn dispatch(&self, downlink: &Downlink) -> Result<(), ControlError>;
}

/// 空发布器（用于占位）。
#[derive(Debug, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl DownlinkDispatcher for NoopDispatcher {
    async fn dispatch(&self, _downlink: &Downlink) -> Result<(), ControlError> {
        Ok(())
    }
}

/// MQTT Dispatcher 配置。
#[derive(Debug, Clone)]
pub struct MqttDispatcherConfig {
    pub connection: MqttConnection,
    /// 发布到 `{downlink_topic_prefix}/{device_id}{codec topic}`
    pub downlink_topic_prefix: String,
    pub qos: u8,
}

/// MQTT Dispatcher 实现（发布下行报文）。
#[derive(Clone)]
pub struct MqttDispatcher {
    client: AsyncClient,
    downlink_topic_prefix: String,
    qos: QoS,
}

impl MqttDispatcher {
    /// 建立连接并在后台驱动 eventloop，返回发布器与 eventloop 任务句柄。
    pub fn connect(config: MqttDispatcherConfig) -> (Self, tokio::task::JoinHandle<()>) {
        let options = mqtt_options("dmp-control-dispatch", &config.connection);
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let handle = tokio::spawn(async move {
            loop {
                if let Err(err) = eventloop.poll().await {
                    warn!(target: "dmp.control", error = %err, "dispatch_eventloop_error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        });
        let dispatcher = Self {
            client,
            downlink_topic_prefix: config.downlink_topic_prefix,
            qos: mqtt_qos(config.qos),
        };
        (dispatcher, handle)
    }
}

#[async_trait]
impl DownlinkDispatcher for MqttDispatcher {
    async fn dispatch(&self, downlink: &Downlink) -> Result<(), ControlError> {
        let topic = downlink_topic(
            &self.downlink_topic_prefix,
            &downlink.device_id,
            &downlink.message.topic,
        );
        info!(
            target: "dmp.control",
            device_id = %downlink.device_id,
            topic = %topic,
            payload_size = downlink.message.payload.len(),
            "downlink_publish"
        );
        self.client
            .publish(topic, self.qos, false, downlink.message.payload.clone())
            .await
            .map_err(|err| ControlError::Dispatch(err.to_string()))?;
        Ok(())
    }
}

/// `{prefix}/{device_id}{codec topic}`，codec topic 以 `/` 开头。
pub fn downlink_topic(prefix: &str, device_id: &str, codec_topic: &str) -> String {
    format!("{}/{}{}", prefix.trim_end_matches('/'), device_id, codec_topic)
}

/// 下行重试策略，默认不重试。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownlinkServiceConfig {
    pub dispatch_max_retries: u64,
    pub dispatch_backoff_ms: u64,
}

/// 下行服务（编码 + 发布 + 重试）。
#[derive(Clone)]
pub struct DownlinkService {
    codec: DeviceMessageCodec,
    dispatcher: Arc<dyn DownlinkDispatcher>,
    config: DownlinkServiceConfig,
}

impl DownlinkService {
    pub fn new(codec: DeviceMessageCodec, dispatcher: Arc<dyn DownlinkDispatcher>) -> Self {
        Self::new_with_config(codec, dispatcher, DownlinkServiceConfig::default())
    }

    pub fn new_with_config(
        codec: DeviceMessageCodec,
        dispatcher: Arc<dyn DownlinkDispatcher>,
        config: DownlinkServiceConfig,
    ) -> Self {
        Self {
            codec,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &DownlinkServiceConfig {
        &self.config
    }

    /// 编码并下发。只有请求类消息（读/写属性、功能调用及其子设备包裹）可下发。
    pub async fn send(&self, message: &DeviceMessage) -> Result<Downlink, ControlError> {
        let encoded = match self.codec.encode(message) {
            Ok(encoded) => encoded,
            Err(err) => {
                if matches!(err, EncodeError::Unsupported { .. }) {
                    record_encode_unsupported();
                }
                warn!(
                    target: "dmp.control",
                    device_id = %message.device_id(),
                    kind = %message.kind(),
                    error = %err,
                    "downlink_encode_rejected"
                );
                return Err(err.into());
            }
        };
        record_downlink_encoded();
        let downlink = Downlink {
            device_id: message.device_id().to_string(),
            message: encoded,
        };
        match self.dispatch_with_retry(&downlink).await {
            Ok(()) => {
                record_dispatch_success();
                info!(
                    target: "dmp.control",
                    device_id = %downlink.device_id,
                    message_id = ?message.message_id(),
                    topic = %downlink.message.topic,
                    "downlink_dispatched"
                );
                Ok(downlink)
            }
            Err(err) => {
                record_dispatch_failure();
                warn!(
                    target: "dmp.control",
                    device_id = %downlink.device_id,
                    message_id = ?message.message_id(),
                    error = %err,
                    "downlink_dispatch_failed"
                );
                Err(err)
            }
        }
    }

    /// 首次发布失败后最多重试 `dispatch_max_retries` 次，每次间隔 `dispatch_backoff_ms`。
    async fn dispatch_with_retry(&self, downlink: &Downlink) -> Result<(), ControlError> {
        let max_retries = self.config.dispatch_max_retries;
        let backoff = Duration::from_millis(self.config.dispatch_backoff_ms);
        let mut retries = 0u64;
        loop {
            let err = match self.dispatcher.dispatch(downlink).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };
            if retries >= max_retries {
                return Err(err);
            }
            retries += 1;
            warn!(
                target: "dmp.control",
                device_id = %downlink.device_id,
                retry = retries,
                max_retries,
                error = %err,
                "downlink_dispatch_retry"
            );
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
