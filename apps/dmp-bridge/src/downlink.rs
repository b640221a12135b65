//! 下行链路装配模块
//!
//! 平台把请求报文发布到 `{command_prefix}/{device_id}/{codec topic}`，
//! 桥接进程先用编解码器校验还原为设备消息，再经下行服务编码发布到设备。

use dmp_codec::{DecodeError, DeviceMessageCodec};
use dmp_config::AppConfig;
use dmp_control::{
    DownlinkDispatcher, DownlinkService, DownlinkServiceConfig, MqttDispatcher,
    MqttDispatcherConfig, NoopDispatcher,
};
use dmp_ingest::{
    IngestError, MqttConnection, MqttSource, MqttSourceConfig, NoopSource, RawUplinkHandler,
    Source,
};
use domain::RawUplink;
use std::sync::Arc;
use tracing::{info, warn};

/// 指令转发处理器
pub struct CommandHandler {
    codec: DeviceMessageCodec,
    service: DownlinkService,
}

impl CommandHandler {
    pub fn new(codec: DeviceMessageCodec, service: DownlinkService) -> Self {
        Self { codec, service }
    }
}

#[async_trait::async_trait]
impl RawUplinkHandler for CommandHandler {
    async fn handle(&self, command: RawUplink) -> Result<(), IngestError> {
        let message = match self.codec.decode(Some(&command.device_id), &command.message) {
            Ok(message) => message,
            Err(err @ DecodeError::NoMatch { .. }) => {
                info!(
                    target: "dmp.downlink",
                    device_id = %command.device_id,
                    error = %err,
                    "command_ignored"
                );
                return Ok(());
            }
            Err(err) => return Err(IngestError::Handler(err.to_string())),
        };
        self.service
            .send(&message)
            .await
            .map(|_| ())
            .map_err(|err| IngestError::Handler(err.to_string()))
    }
}

/// 上行源、指令源与下行发布器共用同一 broker。
pub(crate) fn connection(config: &AppConfig) -> MqttConnection {
    MqttConnection {
        host: config.mqtt_host.clone(),
        port: config.mqtt_port,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
    }
}

fn service_config(config: &AppConfig) -> DownlinkServiceConfig {
    DownlinkServiceConfig {
        dispatch_max_retries: config.control_dispatch_max_retries,
        dispatch_backoff_ms: config.control_dispatch_backoff_ms,
    }
}

fn dispatcher_config(config: &AppConfig) -> MqttDispatcherConfig {
    MqttDispatcherConfig {
        connection: connection(config),
        downlink_topic_prefix: config.mqtt_downlink_topic_prefix.clone(),
        qos: config.mqtt_downlink_qos,
    }
}

pub fn build_service(
    config: &AppConfig,
    codec: DeviceMessageCodec,
    dispatcher: Arc<dyn DownlinkDispatcher>,
) -> DownlinkService {
    DownlinkService::new_with_config(codec, dispatcher, service_config(config))
}

/// 启动下行任务
///
/// 启用 MQTT 时连接下行发布器并订阅平台指令 topic，否则使用空操作源与发布器。
pub fn spawn_downlink(config: &AppConfig, codec: DeviceMessageCodec) -> tokio::task::JoinHandle<()> {
    let (dispatcher, source): (Arc<dyn DownlinkDispatcher>, Arc<dyn Source>) =
        if config.ingest_enabled {
            // eventloop 任务随进程退出，不单独等待
            let (dispatcher, _eventloop) = MqttDispatcher::connect(dispatcher_config(config));
            let source = MqttSource::new(MqttSourceConfig {
                connection: connection(config),
                topic_prefix: config.mqtt_command_topic_prefix.clone(),
                qos: config.mqtt_downlink_qos,
                client_prefix: "dmp-bridge-command".to_string(),
            });
            info!(
                "downlink: commands {} -> devices {}",
                config.mqtt_command_topic_prefix, config.mqtt_downlink_topic_prefix
            );
            (Arc::new(dispatcher), Arc::new(source))
        } else {
            info!("downlink: noop (DMP_INGEST=off)");
            (Arc::new(NoopDispatcher), Arc::new(NoopSource))
        };

    let service = build_service(config, codec.clone(), dispatcher);
    let handler = Arc::new(CommandHandler::new(codec, service));
    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!("downlink stopped: {}", err);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{codec, config};
    use dmp_control::{ControlError, Downlink};
    use domain::MqttMessage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDispatcher {
        sent: Mutex<Vec<Downlink>>,
    }

    #[async_trait::async_trait]
    impl DownlinkDispatcher for RecordingDispatcher {
        async fn dispatch(&self, downlink: &Downlink) -> Result<(), ControlError> {
            self.sent.lock().expect("lock").push(downlink.clone());
            Ok(())
        }
    }

    fn command(topic: &str, payload: &str) -> RawUplink {
        RawUplink {
            device_id: "gw-1".to_string(),
            message: MqttMessage::new(topic, payload.as_bytes().to_vec()),
            received_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn dispatch_settings_come_from_app_config() {
        let config = config();

        let service = build_service(&config, codec(), Arc::new(NoopDispatcher));
        assert_eq!(
            service.config(),
            &DownlinkServiceConfig {
                dispatch_max_retries: 5,
                dispatch_backoff_ms: 50,
            }
        );

        let dispatcher = dispatcher_config(&config);
        assert_eq!(dispatcher.downlink_topic_prefix, "plant/down");
        assert_eq!(dispatcher.qos, 2);
        assert_eq!(dispatcher.connection.host, "broker.local");
        assert_eq!(dispatcher.connection.username.as_deref(), Some("bridge"));
    }

    #[tokio::test]
    async fn child_command_is_relayed_to_gateway() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let handler = CommandHandler::new(
            codec(),
            build_service(&config(), codec(), dispatcher.clone()),
        );

        handler
            .handle(command(
                "/children/write-property",
                r#"{"messageId":"m-1","deviceId":"sensor-2","properties":{"mode":"eco"}}"#,
            ))
            .await
            .expect("relayed");

        let sent = dispatcher.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].device_id, "gw-1");
        assert_eq!(sent[0].message.topic, "/children/write-property");
        let payload: serde_json::Value =
            serde_json::from_slice(&sent[0].message.payload).expect("json");
        assert_eq!(payload["deviceId"], "sensor-2");
        assert_eq!(payload["properties"]["mode"], "eco");
    }

    #[tokio::test]
    async fn reply_shaped_command_is_rejected() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let handler = CommandHandler::new(
            codec(),
            build_service(&config(), codec(), dispatcher.clone()),
        );

        let err = handler
            .handle(command(
                "/read-property",
                r#"{"messageId":"m-2","deviceId":"d1","properties":{"temp":1},"success":true}"#,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Handler(_)));
        assert!(dispatcher.sent.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn unknown_command_topic_is_ignored() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let handler = CommandHandler::new(
            codec(),
            build_service(&config(), codec(), dispatcher.clone()),
        );

        handler
            .handle(command("/firmware/upgrade", r#"{"deviceId":"d1"}"#))
            .await
            .expect("ignored");

        assert!(dispatcher.sent.lock().expect("lock").is_empty());
    }
}
