#![allow(dead_code)]

use dmp_codec::{IdGenerator, TopicDecoder};
use domain::Payload;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 可预测的 ID 生成器：id-1, id-2, ...
#[derive(Debug, Default)]
pub struct SequenceIds {
    next: AtomicU64,
}

impl SequenceIds {
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl IdGenerator for SequenceIds {
    fn generate(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn decoder() -> (TopicDecoder, Arc<SequenceIds>) {
    let ids = Arc::new(SequenceIds::default());
    (TopicDecoder::new(ids.clone()), ids)
}

pub fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}
