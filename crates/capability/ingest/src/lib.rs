use async_trait::async_trait;
use domain::{MqttMessage, RawUplink};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// 上行接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// RawUplink 处理器。
#[async_trait]
pub trait RawUplinkHandler: Send + Sync {
    async fn handle(&self, uplink: RawUplink) -> Result<(), IngestError>;
}

/// 上行源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawUplinkHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn RawUplinkHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// MQTT broker 连接参数，上行源与下行发布器共用。
#[derive(Debug, Clone)]
pub struct MqttConnection {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// 按连接参数构造客户端选项，client id 为 `{client_prefix}-{uuid}`。
pub fn mqtt_options(client_prefix: &str, connection: &MqttConnection) -> MqttOptions {
    let client_id = format!("{}-{}", client_prefix, uuid::Uuid::new_v4());
    let mut options = MqttOptions::new(client_id, connection.host.clone(), connection.port);
    options.set_keep_alive(Duration::from_secs(30));
    if let (Some(username), Some(password)) = (&connection.username, &connection.password) {
        options.set_credentials(username, password);
    }
    options
}

/// 0/1/2 以外的等级按 AtLeastOnce 处理。
pub fn mqtt_qos(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// MQTT 上行源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub connection: MqttConnection,
    /// 订阅 `{topic_prefix}/#`，报文 topic 形如 `{topic_prefix}/{device_id}/{codec topic}`
    pub topic_prefix: String,
    pub qos: u8,
    /// client id 前缀，区分同一进程内的多个源
    pub client_prefix: String,
}

/// MQTT 上行源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    fn to_uplink(&self, topic: &str, payload: Vec<u8>) -> Option<RawUplink> {
        let (device_id, codec_topic) = extract_device_scope(&self.config.topic_prefix, topic)?;
        Some(RawUplink {
            device_id,
            message: MqttMessage::new(codec_topic, payload),
            received_at_ms: received_at_ms(),
        })
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn RawUplinkHandler>) -> Result<(), IngestError> {
        let options = mqtt_options(&self.config.client_prefix, &self.config.connection);
        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let filter = format!("{}/#", self.config.topic_prefix.trim_end_matches('/'));
        client
            .subscribe(filter.clone(), mqtt_qos(self.config.qos))
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;
        info!(target: "dmp.ingest", filter = %filter, "source_subscribed");

        loop {
            let event = eventloop
                .poll()
                .await
                .map_err(|err| IngestError::Source(err.to_string()))?;
            let Event::Incoming(Packet::Publish(publish)) = event else {
                continue;
            };
            let Some(uplink) = self.to_uplink(&publish.topic, publish.payload.to_vec()) else {
                warn!(target: "dmp.ingest", topic = %publish.topic, "topic_out_of_scope");
                continue;
            };
            let device_id = uplink.device_id.clone();
            if let Err(err) = handler.handle(uplink).await {
                warn!(target: "dmp.ingest", device_id = %device_id, error = %err, "handler_failed");
            }
        }
    }
}

/// `{prefix}/{device_id}/{rest}` → (`device_id`, `/{rest}`)。
pub fn extract_device_scope(prefix: &str, topic: &str) -> Option<(String, String)> {
    let prefix = prefix.trim_matches('/');
    let topic = topic.trim_start_matches('/');
    let rest = if prefix.is_empty() {
        topic
    } else {
        topic.strip_prefix(prefix)?.strip_prefix('/')?
    };
    let (device_id, codec_topic) = rest.split_once('/')?;
    if device_id.is_empty() || codec_topic.is_empty() {
        return None;
    }
    Some((device_id.to_string(), format!("/{}", codec_topic)))
}

fn received_at_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_qos_is_at_least_once() {
        assert_eq!(mqtt_qos(0), QoS::AtMostOnce);
        assert_eq!(mqtt_qos(2), QoS::ExactlyOnce);
        assert_eq!(mqtt_qos(7), QoS::AtLeastOnce);
    }

    #[test]
    fn publish_in_scope_becomes_raw_uplink() {
        let source = MqttSource::new(MqttSourceConfig {
            connection: MqttConnection {
                host: "127.0.0.1".to_string(),
                port: 1883,
                username: None,
                password: None,
            },
            topic_prefix: "dmp/up".to_string(),
            qos: 1,
            client_prefix: "dmp-test".to_string(),
        });

        let uplink = source
            .to_uplink("dmp/up/gw-1/report-property", b"{}".to_vec())
            .expect("uplink");
        assert_eq!(uplink.device_id, "gw-1");
        assert_eq!(uplink.message.topic, "/report-property");
        assert!(uplink.received_at_ms > 0);
        assert!(source.to_uplink("dmp/down/gw-1/report-property", Vec::new()).is_none());
    }
}
