//! 日志初始化与编解码计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub uplinks_received: u64,
    pub messages_decoded: u64,
    pub decode_no_match: u64,
    pub decode_failures: u64,
    pub downlinks_encoded: u64,
    pub encode_unsupported: u64,
    pub dispatch_success: u64,
    pub dispatch_failure: u64,
}

/// 基础指标（进程级计数器）。
pub struct TelemetryMetrics {
    uplinks_received: AtomicU64,
    messages_decoded: AtomicU64,
    decode_no_match: AtomicU64,
    decode_failures: AtomicU64,
    downlinks_encoded: AtomicU64,
    encode_unsupported: AtomicU64,
    dispatch_success: AtomicU64,
    dispatch_failure: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            uplinks_received: AtomicU64::new(0),
            messages_decoded: AtomicU64::new(0),
            decode_no_match: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            downlinks_encoded: AtomicU64::new(0),
            encode_unsupported: AtomicU64::new(0),
            dispatch_success: AtomicU64::new(0),
            dispatch_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uplinks_received: self.uplinks_received.load(Ordering::Relaxed),
            messages_decoded: self.messages_decoded.load(Ordering::Relaxed),
            decode_no_match: self.decode_no_match.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            downlinks_encoded: self.downlinks_encoded.load(Ordering::Relaxed),
            encode_unsupported: self.encode_unsupported.load(Ordering::Relaxed),
            dispatch_success: self.dispatch_success.load(Ordering::Relaxed),
            dispatch_failure: self.dispatch_failure.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录上行报文接收次数。
pub fn record_uplink_received() {
    metrics().uplinks_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录解码成功次数。
pub fn record_message_decoded() {
    metrics().messages_decoded.fetch_add(1, Ordering::Relaxed);
}

/// 记录未命中解码表次数（报文被忽略）。
pub fn record_decode_no_match() {
    metrics().decode_no_match.fetch_add(1, Ordering::Relaxed);
}

/// 记录解码失败次数。
pub fn record_decode_failure() {
    metrics().decode_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录下行编码成功次数。
pub fn record_downlink_encoded() {
    metrics().downlinks_encoded.fetch_add(1, Ordering::Relaxed);
}

/// 记录不支持下行的消息次数。
pub fn record_encode_unsupported() {
    metrics().encode_unsupported.fetch_add(1, Ordering::Relaxed);
}

/// 记录下发成功次数（MQTT 发布成功）。
pub fn record_dispatch_success() {
    metrics().dispatch_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录下发失败次数（重试耗尽）。
pub fn record_dispatch_failure() {
    metrics().dispatch_failure.fetch_add(1, Ordering::Relaxed);
}
