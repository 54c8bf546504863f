//! 状态流控制器
//!
//! 管理一条事件通道连接（每个 Compute Box 地址一条），把推送来的状态写入
//! [`StatusCache`]，再依次调用用户回调。
//!
//! # 线程模型
//!
//! - 入站消息在事件通道自己的线程上处理
//! - 缓存更新使用缓存自身的原子替换，不经过 RPC 调度器的锁
//! - 重连由事件通道实现负责，控制器不做额外重试

use crate::cache::{JsonMap, StatusCache, StatusSnapshot};
use crate::error::DriverError;
use crate::hooks::{StatusCallback, StatusHooks, trigger_callbacks};
use onrobot_protocol::DeviceSlot;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace, warn};

/// 状态推送的事件名
pub const MESSAGE_EVENT: &str = "message";

/// 默认连接超时
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// 入站事件处理函数
pub type MessageHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// 传输方式（按偏好顺序传给事件通道）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTransport {
    WebSocket,
    Polling,
}

/// 优先 websocket，失败再退回长轮询
pub const PREFERRED_TRANSPORTS: &[StreamTransport] =
    &[StreamTransport::WebSocket, StreamTransport::Polling];

/// 连接参数
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    pub url: String,
    pub transports: &'static [StreamTransport],
    pub timeout: Duration,
}

/// 推送事件通道
///
/// 连接、握手与断线重连都由实现方负责。
pub trait EventChannel: Send {
    /// 订阅事件；同一事件重复订阅时以最后一次为准
    fn on(&mut self, event: &str, handler: MessageHandler);

    /// 建立连接，在 `options.timeout` 内未完成视为失败
    fn connect(&mut self, options: &ConnectOptions) -> Result<(), DriverError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;
}

/// 事件通道 URL
pub fn stream_url(address: &str) -> String {
    format!("http://{}", address)
}

/// 状态流控制器
pub struct StatusStream {
    url: String,
    channel: Mutex<Box<dyn EventChannel>>,
    cache: Arc<StatusCache>,
    hooks: Arc<RwLock<StatusHooks>>,
}

impl StatusStream {
    /// 创建控制器并订阅 `message` 事件（不会立即连接）
    pub fn new(address: &str, channel: impl EventChannel + 'static) -> Self {
        Self::from_boxed(address, Box::new(channel))
    }

    pub fn from_boxed(address: &str, mut channel: Box<dyn EventChannel>) -> Self {
        let cache = Arc::new(StatusCache::new());
        let hooks = Arc::new(RwLock::new(StatusHooks::new()));

        let handler: MessageHandler = {
            let cache = Arc::clone(&cache);
            let hooks = Arc::clone(&hooks);
            Arc::new(move |payload| deliver(&cache, &hooks, payload))
        };
        channel.on(MESSAGE_EVENT, handler);

        Self {
            url: stream_url(address),
            channel: Mutex::new(channel),
            cache,
            hooks,
        }
    }

    /// 附带一个回调（构造时使用）
    pub fn with_callback(self, callback: Arc<dyn StatusCallback>) -> Self {
        self.add_callback(callback);
        self
    }

    pub fn add_callback(&self, callback: Arc<dyn StatusCallback>) {
        self.hooks.write().add_callback(callback);
    }

    pub fn clear_callbacks(&self) {
        self.hooks.write().clear();
    }

    /// 连接事件通道
    ///
    /// 已连接时直接返回 `true`。连接失败只返回 `false`（并记录 warn），不向上传播错误。
    pub fn connect(&self, timeout: Duration) -> bool {
        let mut channel = self.channel.lock();
        if channel.is_connected() {
            trace!(url = %self.url, "Status stream already connected");
            return true;
        }

        let options = ConnectOptions {
            url: self.url.clone(),
            transports: PREFERRED_TRANSPORTS,
            timeout,
        };
        match channel.connect(&options) {
            Ok(()) => {
                info!(url = %self.url, "Status stream connected");
                true
            },
            Err(e) => {
                warn!(url = %self.url, error = %e, "Status stream connect failed");
                false
            },
        }
    }

    pub fn disconnect(&self) {
        let mut channel = self.channel.lock();
        if channel.is_connected() {
            channel.disconnect();
            info!(url = %self.url, "Status stream disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.lock().is_connected()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 共享的状态缓存
    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    pub fn latest_payload(&self) -> JsonMap {
        self.cache.latest_payload()
    }

    pub fn latest_timestamp(&self) -> Option<SystemTime> {
        self.cache.latest_timestamp()
    }

    pub fn get_device_variable(
        &self,
        slot: DeviceSlot,
        product_code: Option<u32>,
    ) -> Option<JsonMap> {
        self.cache.get_device_variable(slot, product_code)
    }
}

impl Drop for StatusStream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// 处理一条入站消息：先替换缓存，再触发回调
///
/// 回调在释放回调列表的锁之后执行。
fn deliver(cache: &StatusCache, hooks: &RwLock<StatusHooks>, payload: Value) {
    let Some(snapshot) = StatusSnapshot::from_payload(payload) else {
        trace!("Dropping non-status payload");
        return;
    };
    let snapshot = cache.store(snapshot);

    let callbacks = hooks.read().callbacks();
    let failed = trigger_callbacks(&callbacks, &snapshot.payload);
    if failed > 0 {
        debug!(failed, "Status callbacks failed during delivery");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::LoopbackEventChannel;
    use crossbeam_channel::unbounded;
    use serde_json::json;
    use std::thread;

    fn status(width: i64) -> Value {
        json!({
            "devices": [
                { "deviceId": 0, "productCode": 192, "variable": { "w": width } }
            ]
        })
    }

    #[test]
    fn test_connect_is_idempotent() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let stream = StatusStream::new("10.0.0.7", channel);

        assert!(!stream.is_connected());
        assert!(stream.connect(Duration::from_millis(100)));
        assert!(stream.connect(Duration::from_millis(100)));
        assert_eq!(handle.connect_attempts(), 1);

        let options = handle.last_options().unwrap();
        assert_eq!(options.url, "http://10.0.0.7");
        assert_eq!(options.transports, PREFERRED_TRANSPORTS);
        assert_eq!(options.timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_connect_failure_returns_false() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        handle.fail_connect(true);
        let stream = StatusStream::new("cb", channel);

        assert!(!stream.connect(DEFAULT_CONNECT_TIMEOUT));
        assert!(!stream.is_connected());

        handle.fail_connect(false);
        assert!(stream.connect(DEFAULT_CONNECT_TIMEOUT));
    }

    #[test]
    fn test_disconnect() {
        let channel = LoopbackEventChannel::new();
        let stream = StatusStream::new("cb", channel);
        stream.connect(DEFAULT_CONNECT_TIMEOUT);
        stream.disconnect();
        assert!(!stream.is_connected());
        // 重复断开无副作用
        stream.disconnect();
    }

    #[test]
    fn test_messages_update_cache_and_reach_callback() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let (tx, rx) = unbounded();
        let stream = StatusStream::new("cb", channel).with_callback(Arc::new(
            move |payload: &JsonMap| {
                let _ = tx.send(payload.clone());
            },
        ));
        stream.connect(DEFAULT_CONNECT_TIMEOUT);

        handle.emit(status(5));
        handle.emit(json!({ "ping": true }));

        let delivered = rx.try_recv().unwrap();
        assert!(delivered.contains_key("devices"));
        assert!(rx.try_recv().is_err(), "non-status payload must not reach callbacks");

        let variable = stream.get_device_variable(DeviceSlot::Single, Some(192)).unwrap();
        assert_eq!(variable["w"], json!(5));
        assert!(stream.latest_timestamp().is_some());
        assert!(stream.latest_payload().contains_key("devices"));
    }

    #[test]
    fn test_failing_callback_does_not_break_stream() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let stream = StatusStream::new("cb", channel)
            .with_callback(Arc::new(|payload: &JsonMap| {
                if payload.contains_key("devices") {
                    panic!("callback failure");
                }
            }));
        stream.connect(DEFAULT_CONNECT_TIMEOUT);

        handle.emit(status(1));
        handle.emit(status(2));

        let variable = stream.get_device_variable(DeviceSlot::Single, None).unwrap();
        assert_eq!(variable["w"], json!(2));
    }

    #[test]
    fn test_delivery_from_transport_thread() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let (tx, rx) = unbounded();
        let stream = StatusStream::new("cb", channel);
        stream.add_callback(Arc::new(move |_: &JsonMap| {
            let _ = tx.send(thread::current().id());
        }));
        stream.connect(DEFAULT_CONNECT_TIMEOUT);

        let emitter = thread::spawn(move || {
            for width in 0..10 {
                handle.emit(status(width));
            }
            thread::current().id()
        });
        let emitter_id = emitter.join().unwrap();

        let ids: Vec<_> = rx.try_iter().collect();
        assert_eq!(ids.len(), 10);
        assert!(ids.iter().all(|id| *id == emitter_id));
        assert_eq!(
            stream.get_device_variable(DeviceSlot::Single, None).unwrap()["w"],
            json!(9)
        );
    }

    #[test]
    fn test_callback_can_register_callbacks_during_delivery() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let stream = Arc::new(StatusStream::new("cb", channel));
        let (tx, rx) = unbounded();

        let weak = Arc::downgrade(&stream);
        stream.add_callback(Arc::new(move |_: &JsonMap| {
            if let Some(stream) = weak.upgrade() {
                let tx = tx.clone();
                stream.add_callback(Arc::new(move |_: &JsonMap| {
                    let _ = tx.send(());
                }));
            }
        }));
        stream.connect(DEFAULT_CONNECT_TIMEOUT);

        let emitter = thread::spawn(move || {
            handle.emit(status(1));
            handle.emit(status(2));
        });
        rx.recv_timeout(Duration::from_secs(2))
            .expect("delivery stalled while a callback registered another");
        emitter.join().unwrap();

        assert_eq!(
            stream.get_device_variable(DeviceSlot::Single, None).unwrap()["w"],
            json!(2)
        );
    }

    #[test]
    fn test_callback_can_clear_callbacks_during_delivery() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let stream = Arc::new(StatusStream::new("cb", channel));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let weak = Arc::downgrade(&stream);
        let counter = Arc::clone(&calls);
        stream.add_callback(Arc::new(move |_: &JsonMap| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if let Some(stream) = weak.upgrade() {
                stream.clear_callbacks();
            }
        }));
        stream.connect(DEFAULT_CONNECT_TIMEOUT);

        handle.emit(status(1));
        handle.emit(status(2));

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(
            stream.get_device_variable(DeviceSlot::Single, None).unwrap()["w"],
            json!(2)
        );
    }

    #[test]
    fn test_drop_disconnects() {
        let channel = LoopbackEventChannel::new();
        let handle = channel.handle();
        let stream = StatusStream::new("cb", channel);
        stream.connect(DEFAULT_CONNECT_TIMEOUT);
        assert!(handle.is_connected());
        drop(stream);
        assert!(!handle.is_connected());
    }
}
