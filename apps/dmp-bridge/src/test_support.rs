use dmp_codec::{DeviceMessageCodec, TopicDecoder, UuidIdGenerator};
use dmp_config::{AppConfig, IdStrategy};
use std::sync::Arc;

pub fn codec() -> DeviceMessageCodec {
    DeviceMessageCodec::new(TopicDecoder::new(Arc::new(UuidIdGenerator)))
}

pub fn config() -> AppConfig {
    AppConfig {
        mqtt_host: "broker.local".to_string(),
        mqtt_port: 1883,
        mqtt_username: Some("bridge".to_string()),
        mqtt_password: Some("secret".to_string()),
        mqtt_topic_prefix: "plant".to_string(),
        mqtt_uplink_topic_prefix: "plant/up".to_string(),
        mqtt_downlink_topic_prefix: "plant/down".to_string(),
        mqtt_command_topic_prefix: "plant/cmd".to_string(),
        mqtt_uplink_qos: 1,
        mqtt_downlink_qos: 2,
        ingest_enabled: false,
        codec_max_child_depth: 8,
        id_strategy: IdStrategy::Uuid,
        id_worker_id: 1,
        control_dispatch_max_retries: 5,
        control_dispatch_backoff_ms: 50,
    }
}
