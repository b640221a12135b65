//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 消息 ID 生成策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    Snowflake,
    Uuid,
}

/// snowflake worker id 上限（10 位）。
const MAX_WORKER_ID: u16 = 1023;

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: String,
    pub mqtt_uplink_topic_prefix: String,
    pub mqtt_downlink_topic_prefix: String,
    /// 平台下发指令 topic 前缀，桥接进程转发到设备下行 topic。
    pub mqtt_command_topic_prefix: String,
    pub mqtt_uplink_qos: u8,
    pub mqtt_downlink_qos: u8,
    pub ingest_enabled: bool,
    pub codec_max_child_depth: usize,
    pub id_strategy: IdStrategy,
    pub id_worker_id: u16,
    pub control_dispatch_max_retries: u64,
    pub control_dispatch_backoff_ms: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let mqtt_host = env::var("DMP_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = read_u16_with_default("DMP_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("DMP_MQTT_USERNAME");
        let mqtt_password = read_optional("DMP_MQTT_PASSWORD");
        // 用户名与密码必须成对出现
        match (&mqtt_username, &mqtt_password) {
            (Some(_), None) => return Err(ConfigError::Missing("DMP_MQTT_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::Missing("DMP_MQTT_USERNAME".to_string())),
            _ => {}
        }
        let mqtt_topic_prefix =
            env::var("DMP_MQTT_TOPIC_PREFIX").unwrap_or_else(|_| "dmp".to_string());
        let mqtt_uplink_topic_prefix = env::var("DMP_MQTT_UPLINK_TOPIC_PREFIX")
            .unwrap_or_else(|_| format!("{}/up", mqtt_topic_prefix.trim_end_matches('/')));
        let mqtt_downlink_topic_prefix = env::var("DMP_MQTT_DOWNLINK_TOPIC_PREFIX")
            .unwrap_or_else(|_| format!("{}/down", mqtt_topic_prefix.trim_end_matches('/')));
        let mqtt_command_topic_prefix = env::var("DMP_MQTT_COMMAND_TOPIC_PREFIX")
            .unwrap_or_else(|_| format!("{}/cmd", mqtt_topic_prefix.trim_end_matches('/')));
        let mqtt_uplink_qos = read_qos_with_default("DMP_MQTT_UPLINK_QOS", 1)?;
        let mqtt_downlink_qos = read_qos_with_default("DMP_MQTT_DOWNLINK_QOS", 1)?;
        let ingest_enabled = read_bool_with_default("DMP_INGEST", false);
        let codec_max_child_depth = read_u64_with_default("DMP_CODEC_MAX_CHILD_DEPTH", 8)?;
        if codec_max_child_depth == 0 {
            return Err(ConfigError::Invalid(
                "DMP_CODEC_MAX_CHILD_DEPTH".to_string(),
                "0".to_string(),
            ));
        }
        let id_strategy = read_id_strategy("DMP_ID_STRATEGY")?;
        let id_worker_id = read_u16_with_default("DMP_ID_WORKER_ID", 1)?;
        if id_worker_id > MAX_WORKER_ID {
            return Err(ConfigError::Invalid(
                "DMP_ID_WORKER_ID".to_string(),
                id_worker_id.to_string(),
            ));
        }
        let control_dispatch_max_retries =
            read_u64_with_default("DMP_CONTROL_DISPATCH_MAX_RETRIES", 2)?;
        let control_dispatch_backoff_ms =
            read_u64_with_default("DMP_CONTROL_DISPATCH_BACKOFF_MS", 200)?;

        Ok(Self {
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_topic_prefix,
            mqtt_uplink_topic_prefix,
            mqtt_downlink_topic_prefix,
            mqtt_command_topic_prefix,
            mqtt_uplink_qos,
            mqtt_downlink_qos,
            ingest_enabled,
            codec_max_child_depth: codec_max_child_depth as usize,
            id_strategy,
            id_worker_id,
            control_dispatch_max_retries,
            control_dispatch_backoff_ms,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

/// MQTT QoS 只允许 0/1/2。
fn read_qos_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.parse::<u8>() {
        Ok(qos) if qos <= 2 => Ok(qos),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_id_strategy(key: &str) -> Result<IdStrategy, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(IdStrategy::Snowflake),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "snowflake" => Ok(IdStrategy::Snowflake),
        "uuid" => Ok(IdStrategy::Uuid),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
