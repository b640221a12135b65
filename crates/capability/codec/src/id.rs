//! 消息 ID 生成。

use std::sync::atomic::{AtomicU64, Ordering};

/// 消息 ID 生成器（平台提供的全局唯一 ID 源）。
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 起始纪元：2020-01-01T00:00:00Z（毫秒）。
const SNOWFLAKE_EPOCH_MS: u64 = 1_577_836_800_000;
const WORKER_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// 最大 worker id（10 位）。
pub const MAX_WORKER_ID: u16 = (1 << WORKER_BITS) - 1;

/// Snowflake 风格 ID：41 位毫秒 | 10 位 worker | 12 位序号，十进制字符串。
///
/// 状态打包在一个 `AtomicU64`（毫秒 << 12 | 序号）里，CAS 推进，无锁。
/// 时钟回拨时沿用上次的毫秒继续递增序号，序号用尽则借用下一毫秒。
#[derive(Debug)]
pub struct SnowflakeIdGenerator {
    worker_id: u64,
    state: AtomicU64,
}

impl SnowflakeIdGenerator {
    /// `worker_id` 超出 10 位时按位截断。
    pub fn new(worker_id: u16) -> Self {
        Self {
            worker_id: u64::from(worker_id & MAX_WORKER_ID),
            state: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> u64 {
        loop {
            let now = elapsed_ms();
            let prev = self.state.load(Ordering::Acquire);
            let prev_ms = prev >> SEQUENCE_BITS;
            let prev_seq = prev & SEQUENCE_MASK;
            let next = if now > prev_ms {
                now << SEQUENCE_BITS
            } else if prev_seq < SEQUENCE_MASK {
                prev + 1
            } else {
                (prev_ms + 1) << SEQUENCE_BITS
            };
            if self
                .state
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let ms = next >> SEQUENCE_BITS;
                let seq = next & SEQUENCE_MASK;
                return (ms << (WORKER_BITS + SEQUENCE_BITS))
                    | (self.worker_id << SEQUENCE_BITS)
                    | seq;
            }
        }
    }
}

impl IdGenerator for SnowflakeIdGenerator {
    fn generate(&self) -> String {
        self.next_id().to_string()
    }
}

/// UUID v4 ID（无连字符）。
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

fn elapsed_ms() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    now.saturating_sub(SNOWFLAKE_EPOCH_MS)
}
