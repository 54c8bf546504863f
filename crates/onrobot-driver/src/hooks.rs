//! 状态回调
//!
//! 每当事件通道送来一份有效状态（缓存替换成功之后），依次调用所有已注册回调。
//!
//! # 隔离
//!
//! 单个回调 panic 只会被记录为 warn，不会影响缓存，也不会影响后续回调。
//! 回调执行时不持有回调列表的锁，回调内部可以再注册或清空回调。

use crate::cache::JsonMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

/// 状态回调 Trait
///
/// 在事件通道的线程上调用，实现应尽快返回（耗时工作请转交给 channel）。
///
/// 闭包 `Fn(&JsonMap) + Send + Sync` 自动实现本 trait。
pub trait StatusCallback: Send + Sync {
    /// 收到新状态时调用，参数为完整载荷
    fn on_status(&self, payload: &JsonMap);
}

impl<F> StatusCallback for F
where
    F: Fn(&JsonMap) + Send + Sync,
{
    fn on_status(&self, payload: &JsonMap) {
        self(payload)
    }
}

/// 回调列表
///
/// 本身不做同步，由持有者加锁（[`StatusStream`](crate::StatusStream) 使用 `RwLock`）。
#[derive(Default)]
pub struct StatusHooks {
    callbacks: Vec<Arc<dyn StatusCallback>>,
}

impl StatusHooks {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// 添加回调（按添加顺序触发）
    pub fn add_callback(&mut self, callback: Arc<dyn StatusCallback>) {
        self.callbacks.push(callback);
    }

    /// 当前回调列表的副本（在锁外触发时使用）
    pub fn callbacks(&self) -> Vec<Arc<dyn StatusCallback>> {
        self.callbacks.clone()
    }

    /// 触发所有回调
    ///
    /// 返回 panic 的回调数量。
    pub fn trigger_all(&self, payload: &JsonMap) -> usize {
        trigger_callbacks(&self.callbacks, payload)
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// 依次调用 `callbacks`，返回 panic 的回调数量
pub fn trigger_callbacks(callbacks: &[Arc<dyn StatusCallback>], payload: &JsonMap) -> usize {
    let mut failed = 0;
    for (index, callback) in callbacks.iter().enumerate() {
        if catch_unwind(AssertUnwindSafe(|| callback.on_status(payload))).is_err() {
            warn!(index, "Status callback panicked, continuing with remaining callbacks");
            failed += 1;
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload() -> JsonMap {
        json!({ "devices": [] }).as_object().unwrap().clone()
    }

    struct Counter(AtomicUsize);

    struct Panicking;

    impl StatusCallback for Panicking {
        fn on_status(&self, _payload: &JsonMap) {
            panic!("boom");
        }
    }

    impl StatusCallback for Counter {
        fn on_status(&self, _payload: &JsonMap) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_hooks_new_is_empty() {
        let hooks = StatusHooks::new();
        assert!(hooks.is_empty());
        assert_eq!(hooks.len(), 0);
        assert_eq!(hooks.trigger_all(&payload()), 0);
    }

    #[test]
    fn test_trigger_all_calls_every_callback() {
        let mut hooks = StatusHooks::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        hooks.add_callback(counter.clone());
        hooks.add_callback(counter.clone());
        assert_eq!(hooks.len(), 2);

        hooks.trigger_all(&payload());
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_closure_callback_receives_payload() {
        let mut hooks = StatusHooks::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        hooks.add_callback(Arc::new(move |payload: &JsonMap| {
            if payload.contains_key("devices") {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        }));

        hooks.trigger_all(&payload());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let mut hooks = StatusHooks::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        hooks.add_callback(Arc::new(Panicking));
        hooks.add_callback(counter.clone());

        assert_eq!(hooks.trigger_all(&payload()), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callbacks_copy_is_detached() {
        let mut hooks = StatusHooks::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        hooks.add_callback(counter.clone());

        let copy = hooks.callbacks();
        hooks.clear();
        assert_eq!(trigger_callbacks(&copy, &payload()), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.trigger_all(&payload()), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear() {
        let mut hooks = StatusHooks::new();
        hooks.add_callback(Arc::new(|_: &JsonMap| {}));
        hooks.clear();
        assert!(hooks.is_empty());
    }
}
