//! 设备协议桥接进程：订阅设备上行报文解码为设备消息，
//! 并把平台指令编码转发到设备下行 topic。

mod downlink;
#[cfg(test)]
mod test_support;
mod uplink;

use dmp_codec::{DeviceMessageCodec, IdGenerator, SnowflakeIdGenerator, TopicDecoder, UuidIdGenerator};
use dmp_config::{AppConfig, IdStrategy};
use dmp_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let codec = build_codec(&config);
    info!(
        target: "dmp.bridge",
        transport = ?codec.supported_transport(),
        id_strategy = ?config.id_strategy,
        max_child_depth = config.codec_max_child_depth,
        "codec_ready"
    );

    let downlink = downlink::spawn_downlink(&config, codec.clone());
    let uplink = uplink::spawn_uplink(&config, codec);

    tokio::select! {
        _ = uplink => {}
        _ = downlink => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "dmp.bridge", "shutdown_requested");
        }
    }

    let snapshot = metrics().snapshot();
    info!(
        target: "dmp.bridge",
        uplinks_received = snapshot.uplinks_received,
        messages_decoded = snapshot.messages_decoded,
        decode_no_match = snapshot.decode_no_match,
        decode_failures = snapshot.decode_failures,
        downlinks_encoded = snapshot.downlinks_encoded,
        dispatch_success = snapshot.dispatch_success,
        dispatch_failure = snapshot.dispatch_failure,
        "bridge_stopped"
    );
    Ok(())
}

fn build_codec(config: &AppConfig) -> DeviceMessageCodec {
    let ids: Arc<dyn IdGenerator> = match config.id_strategy {
        IdStrategy::Snowflake => Arc::new(SnowflakeIdGenerator::new(config.id_worker_id)),
        IdStrategy::Uuid => Arc::new(UuidIdGenerator),
    };
    let decoder = TopicDecoder::new(ids).with_max_child_depth(config.codec_max_child_depth);
    DeviceMessageCodec::new(decoder)
}
