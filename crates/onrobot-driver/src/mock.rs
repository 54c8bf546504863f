//! 内存中的 Compute Box 模拟器
//!
//! 无硬件依赖，用于单元测试与集成测试（feature `mock`）：
//!
//! - [`MockComputeBox`]：脚本化的 [`RpcChannel`]，记录每次调用
//! - [`MockRestTransport`]：记录请求 URL 的 [`RestTransport`]
//! - [`LoopbackEventChannel`]：测试代码主动 `emit` 的 [`EventChannel`]
//!
//! 每个模拟器都通过 `handle()` 暴露一个可克隆的控制句柄，
//! 模拟器本身移入被测对象后，测试仍可用句柄修改脚本、检查记录。

use crate::error::{DriverError, RestError, RpcError};
use crate::rest::RestTransport;
use crate::rpc::RpcChannel;
use crate::stream::{ConnectOptions, EventChannel, MessageHandler};
use onrobot_protocol::{DeviceSlot, OrientationValue, RpcMethod, TWOFG_PRODUCT_CODE};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// 一次记录下来的 RPC 调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: RpcMethod,
    pub slot: DeviceSlot,
}

/// 记录下来的 `twofg_grip_external` 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripCommand {
    pub slot: DeviceSlot,
    pub width: f64,
    pub force: i32,
    pub speed: i32,
}

/// 模拟器状态
#[derive(Debug)]
struct MockState {
    connected: HashSet<DeviceSlot>,
    /// 已连接槽位上安装的设备产品码
    product_code: u32,
    /// 依次弹出的 busy 值，耗尽后返回 `busy_default`
    busy: VecDeque<bool>,
    busy_default: bool,
    gripped: VecDeque<bool>,
    gripped_default: bool,
    status: i32,
    external_width: f64,
    min_width: f64,
    max_width: f64,
    force: f64,
    orientation: OrientationValue,
    failing: HashSet<RpcMethod>,
    latency: Duration,

    calls: Vec<RecordedCall>,
    connectivity_queries: Vec<(DeviceSlot, u32)>,
    grip_commands: Vec<GripCommand>,
    orientation_commands: Vec<(DeviceSlot, f64)>,
    in_call: bool,
    overlaps: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connected: HashSet::new(),
            product_code: TWOFG_PRODUCT_CODE,
            busy: VecDeque::new(),
            busy_default: false,
            gripped: VecDeque::new(),
            gripped_default: true,
            status: 0,
            external_width: 20.0,
            min_width: 1.0,
            max_width: 38.0,
            force: 0.0,
            orientation: OrientationValue::Bool(true),
            failing: HashSet::new(),
            latency: Duration::ZERO,
            calls: Vec::new(),
            connectivity_queries: Vec::new(),
            grip_commands: Vec::new(),
            orientation_commands: Vec::new(),
            in_call: false,
            overlaps: 0,
        }
    }
}

/// 脚本化的 Compute Box RPC 端
#[derive(Default)]
pub struct MockComputeBox {
    state: Arc<Mutex<MockState>>,
}

/// [`MockComputeBox`] 的控制句柄
#[derive(Clone)]
pub struct MockComputeBoxHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockComputeBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// 单槽位已连接的模拟器
    pub fn connected(slot: DeviceSlot) -> Self {
        let mock = Self::new();
        mock.handle().set_connected(slot, true);
        mock
    }

    pub fn handle(&self) -> MockComputeBoxHandle {
        MockComputeBoxHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// 记录调用并执行 `f`
    ///
    /// 调用期间释放状态锁并睡眠 `latency`，用来暴露调用重叠。
    fn invoke<T>(
        &self,
        method: RpcMethod,
        slot: DeviceSlot,
        f: impl FnOnce(&mut MockState) -> T,
    ) -> Result<T, RpcError> {
        let latency = {
            let mut state = self.state.lock();
            if state.in_call {
                state.overlaps += 1;
            }
            state.in_call = true;
            state.calls.push(RecordedCall { method, slot });
            state.latency
        };

        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut state = self.state.lock();
        state.in_call = false;
        if state.failing.contains(&method) {
            return Err(RpcError::Transport(format!("{} unavailable", method)));
        }
        Ok(f(&mut state))
    }
}

impl RpcChannel for MockComputeBox {
    /// 槽位已连接且产品码匹配时才返回 `true`
    fn is_device_connected(
        &mut self,
        slot: DeviceSlot,
        product_code: u32,
    ) -> Result<bool, RpcError> {
        self.invoke(RpcMethod::IsDeviceConnected, slot, |s| {
            s.connectivity_queries.push((slot, product_code));
            s.connected.contains(&slot) && s.product_code == product_code
        })
    }

    fn get_busy(&mut self, slot: DeviceSlot) -> Result<bool, RpcError> {
        self.invoke(RpcMethod::GetBusy, slot, |s| {
            s.busy.pop_front().unwrap_or(s.busy_default)
        })
    }

    fn get_grip_detected(&mut self, slot: DeviceSlot) -> Result<bool, RpcError> {
        self.invoke(RpcMethod::GetGripDetected, slot, |s| {
            s.gripped.pop_front().unwrap_or(s.gripped_default)
        })
    }

    fn get_status(&mut self, slot: DeviceSlot) -> Result<i32, RpcError> {
        self.invoke(RpcMethod::GetStatus, slot, |s| s.status)
    }

    fn get_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError> {
        self.invoke(RpcMethod::GetExternalWidth, slot, |s| s.external_width)
    }

    fn get_min_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError> {
        self.invoke(RpcMethod::GetMinExternalWidth, slot, |s| s.min_width)
    }

    fn get_max_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError> {
        self.invoke(RpcMethod::GetMaxExternalWidth, slot, |s| s.max_width)
    }

    fn get_force(&mut self, slot: DeviceSlot) -> Result<f64, RpcError> {
        self.invoke(RpcMethod::GetForce, slot, |s| s.force)
    }

    fn stop(&mut self, slot: DeviceSlot) -> Result<(), RpcError> {
        self.invoke(RpcMethod::Stop, slot, |_| ())
    }

    fn grip_external(
        &mut self,
        slot: DeviceSlot,
        width: f64,
        force: i32,
        speed: i32,
    ) -> Result<(), RpcError> {
        self.invoke(RpcMethod::GripExternal, slot, |s| {
            s.grip_commands.push(GripCommand {
                slot,
                width,
                force,
                speed,
            });
            s.external_width = width;
        })
    }

    fn finger_orientation_outward(
        &mut self,
        slot: DeviceSlot,
    ) -> Result<OrientationValue, RpcError> {
        self.invoke(RpcMethod::FingerOrientationOutward, slot, |s| {
            s.orientation.clone()
        })
    }

    fn set_finger_orientation(&mut self, slot: DeviceSlot, value: f64) -> Result<(), RpcError> {
        self.invoke(RpcMethod::SetFingerOrientation, slot, |s| {
            s.orientation_commands.push((slot, value));
            s.orientation = OrientationValue::Bool(value > 0.0);
        })
    }
}

impl MockComputeBoxHandle {
    pub fn set_connected(&self, slot: DeviceSlot, connected: bool) {
        let mut state = self.state.lock();
        if connected {
            state.connected.insert(slot);
        } else {
            state.connected.remove(&slot);
        }
    }

    /// 安装在已连接槽位上的设备产品码（默认 2FG）
    pub fn set_product_code(&self, product_code: u32) {
        self.state.lock().product_code = product_code;
    }

    /// 脚本化 busy 序列（耗尽后返回 `default`）
    pub fn script_busy(&self, sequence: impl IntoIterator<Item = bool>, default: bool) {
        let mut state = self.state.lock();
        state.busy = sequence.into_iter().collect();
        state.busy_default = default;
    }

    /// 脚本化夹持检测序列（耗尽后返回 `default`）
    pub fn script_gripped(&self, sequence: impl IntoIterator<Item = bool>, default: bool) {
        let mut state = self.state.lock();
        state.gripped = sequence.into_iter().collect();
        state.gripped_default = default;
    }

    pub fn set_width_limits(&self, min: f64, max: f64) {
        let mut state = self.state.lock();
        state.min_width = min;
        state.max_width = max;
    }

    pub fn set_external_width(&self, width: f64) {
        self.state.lock().external_width = width;
    }

    pub fn set_force(&self, force: f64) {
        self.state.lock().force = force;
    }

    pub fn set_status(&self, status: i32) {
        self.state.lock().status = status;
    }

    pub fn set_orientation(&self, value: impl Into<OrientationValue>) {
        self.state.lock().orientation = value.into();
    }

    /// 让某个方法之后的调用都返回传输错误
    pub fn fail_method(&self, method: RpcMethod) {
        self.state.lock().failing.insert(method);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failing.clear();
    }

    pub fn set_call_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// 检测到的调用重叠次数（串行化正确时恒为 0）
    pub fn overlapping_calls(&self) -> usize {
        self.state.lock().overlaps
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    pub fn methods(&self) -> Vec<RpcMethod> {
        self.state.lock().calls.iter().map(|c| c.method).collect()
    }

    pub fn call_count(&self, method: RpcMethod) -> usize {
        self.state.lock().calls.iter().filter(|c| c.method == method).count()
    }

    /// 有副作用的调用（stop / grip / 设置朝向）
    pub fn dispatched_commands(&self) -> Vec<RpcMethod> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|c| c.method)
            .filter(|m| m.is_command())
            .collect()
    }

    /// 成功执行的连接查询 `(slot, product_code)`
    pub fn connectivity_queries(&self) -> Vec<(DeviceSlot, u32)> {
        self.state.lock().connectivity_queries.clone()
    }

    pub fn grip_commands(&self) -> Vec<GripCommand> {
        self.state.lock().grip_commands.clone()
    }

    pub fn orientation_commands(&self) -> Vec<(DeviceSlot, f64)> {
        self.state.lock().orientation_commands.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock();
        state.calls.clear();
        state.connectivity_queries.clear();
        state.grip_commands.clear();
        state.orientation_commands.clear();
    }
}

#[derive(Debug, Default)]
struct RestState {
    requests: Vec<String>,
    failure: Option<RestError>,
    body: String,
}

/// 记录请求的 REST 端
#[derive(Default)]
pub struct MockRestTransport {
    state: Arc<Mutex<RestState>>,
}

/// [`MockRestTransport`] 的控制句柄
#[derive(Clone)]
pub struct MockRestHandle {
    state: Arc<Mutex<RestState>>,
}

impl MockRestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MockRestHandle {
        MockRestHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl RestTransport for MockRestTransport {
    fn get(&mut self, url: &str, _timeout: Duration) -> Result<String, RestError> {
        let mut state = self.state.lock();
        state.requests.push(url.to_string());
        match &state.failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.body.clone()),
        }
    }
}

impl MockRestHandle {
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn fail_with(&self, err: RestError) {
        self.state.lock().failure = Some(err);
    }

    pub fn respond_with(&self, body: impl Into<String>) {
        let mut state = self.state.lock();
        state.failure = None;
        state.body = body.into();
    }
}

#[derive(Default)]
struct LoopbackState {
    handlers: HashMap<String, MessageHandler>,
    connected: bool,
    fail_connect: bool,
    connect_attempts: usize,
    last_options: Option<ConnectOptions>,
    /// 断开前在 `disconnect` 调用线程上投递的最后一条消息
    final_message: Option<Value>,
}

/// 回环事件通道：测试代码调用 `emit` 模拟服务端推送
#[derive(Default)]
pub struct LoopbackEventChannel {
    state: Arc<Mutex<LoopbackState>>,
}

/// [`LoopbackEventChannel`] 的控制句柄
#[derive(Clone)]
pub struct LoopbackHandle {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> LoopbackHandle {
        LoopbackHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl EventChannel for LoopbackEventChannel {
    fn on(&mut self, event: &str, handler: MessageHandler) {
        self.state.lock().handlers.insert(event.to_string(), handler);
    }

    fn connect(&mut self, options: &ConnectOptions) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.connect_attempts += 1;
        state.last_options = Some(options.clone());
        if state.fail_connect {
            return Err(DriverError::EventChannel(format!(
                "connection to {} refused",
                options.url
            )));
        }
        state.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        let pending = {
            let mut state = self.state.lock();
            let handler = state.handlers.get(crate::stream::MESSAGE_EVENT).cloned();
            state.final_message.take().zip(handler)
        };
        if let Some((payload, handler)) = pending {
            handler(payload);
        }
        self.state.lock().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

impl LoopbackHandle {
    /// 推送一条 `message` 事件，在调用线程上同步投递
    ///
    /// 未连接或无订阅时丢弃，返回 `false`。
    pub fn emit(&self, payload: Value) -> bool {
        self.emit_event(crate::stream::MESSAGE_EVENT, payload)
    }

    pub fn emit_event(&self, event: &str, payload: Value) -> bool {
        let handler = {
            let state = self.state.lock();
            if !state.connected {
                return false;
            }
            state.handlers.get(event).cloned()
        };
        match handler {
            Some(handler) => {
                handler(payload);
                true
            },
            None => false,
        }
    }

    /// 下次 `disconnect` 时先投递 `payload`（模拟传输层关闭前排空队列）
    pub fn deliver_on_disconnect(&self, payload: Value) {
        self.state.lock().final_message = Some(payload);
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// 模拟服务端断开
    pub fn drop_connection(&self) {
        self.state.lock().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().connect_attempts
    }

    pub fn last_options(&self) -> Option<ConnectOptions> {
        self.state.lock().last_options.clone()
    }

    pub fn subscribed_events(&self) -> Vec<String> {
        let mut events: Vec<_> = self.state.lock().handlers.keys().cloned().collect();
        events.sort();
        events
    }
}
