//! 2FG 夹爪
//!
//! [`TwoFg`] 把连接检查、参数校验、命令发送和轮询组合成阻塞式操作。
//!
//! # 结果约定
//!
//! - 操作（`grip` / `move_to` / `stop` / `set_finger_orientation`）返回 [`OperationOutcome`]，
//!   失败细节（哪个边界、哪个阶段）只写入日志
//! - `try_*` 版本与查询接口返回 `Result`，需要细节时使用
//!
//! # 锁
//!
//! 每个操作在一个 [`RpcSession`] 内完成。阻塞式 grip/move 在整个轮询期间持锁，
//! 同一夹爪上的其它命令与查询会排队等待。

use crate::config::{GripperConfig, PollConfig};
use crate::error::{GripperError, PollPhase, Result, into_outcome};
use crate::validator::{CommandValidator, WidthLimits};
use onrobot_driver::{
    EventChannel, JsonMap, RpcChannel, RpcDispatcher, RpcError, RpcSession, StatusCallback,
    StatusStream,
};
use onrobot_protocol::{
    DeviceSlot, FingerOrientation, GripperProfile, OperationOutcome, OrientationValue, RpcMethod,
    TWOFG_PRODUCT_CODE, set_finger_orientation_path,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// `move_to` 的默认目标宽度（mm）
pub const DEFAULT_MOVE_WIDTH: f64 = 20.0;
/// `move_to` 使用的固定夹持力（N）
pub const MOVE_FORCE: i32 = 100;
/// `move_to` 使用的固定速度（%）
pub const MOVE_SPEED: i32 = 80;

/// 外夹请求
///
/// 未指定的力与速度在执行时取夹爪参数表的默认值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripRequest {
    /// 目标宽度（mm）
    pub width: f64,
    /// 夹持力（N）
    pub force: Option<f64>,
    /// 速度（%）
    pub speed: Option<f64>,
    /// 是否阻塞等待运动结束并检测到夹持物
    pub wait: bool,
}

impl GripRequest {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            force: None,
            speed: None,
            wait: true,
        }
    }

    /// 参数表的默认张开宽度、力与速度
    pub fn from_profile(profile: &GripperProfile) -> Self {
        Self {
            width: profile.open_width_default,
            force: Some(profile.force_default),
            speed: Some(f64::from(profile.speed_default)),
            wait: true,
        }
    }

    pub fn force(mut self, force: f64) -> Self {
        self.force = Some(force);
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }
}

/// OnRobot 2FG 夹爪
pub struct TwoFg {
    dispatcher: RpcDispatcher,
    validator: CommandValidator,
    poll: PollConfig,
    rest_timeout: Duration,
    stream_connect_timeout: Duration,
    /// 首次 `start_status_stream` 时移入控制器
    event_channel: Mutex<Option<Box<dyn EventChannel>>>,
    stream: Mutex<Option<Arc<StatusStream>>>,
}

impl TwoFg {
    pub fn builder() -> crate::TwoFgBuilder {
        crate::TwoFgBuilder::new()
    }

    pub(crate) fn from_parts(
        dispatcher: RpcDispatcher,
        config: &GripperConfig,
        event_channel: Option<Box<dyn EventChannel>>,
    ) -> Self {
        Self {
            dispatcher,
            validator: CommandValidator::new(config.profile()),
            poll: config.poll,
            rest_timeout: config.rest_timeout(),
            stream_connect_timeout: config.stream_connect_timeout(),
            event_channel: Mutex::new(event_channel),
            stream: Mutex::new(None),
        }
    }

    /// 夹爪参数表
    pub fn profile(&self) -> &'static GripperProfile {
        self.validator.profile()
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    pub fn address(&self) -> Option<&str> {
        self.dispatcher.address()
    }

    pub fn dispatcher(&self) -> &RpcDispatcher {
        &self.dispatcher
    }

    // ==================== 连接检查 ====================

    /// 槽位上是否挂载了 2FG
    ///
    /// RPC 失败视为未连接。
    pub fn is_connected(&self, slot: DeviceSlot) -> bool {
        Self::ensure_connected(&mut self.dispatcher.session(), slot).is_ok()
    }

    fn ensure_connected(session: &mut RpcSession<'_>, slot: DeviceSlot) -> Result<()> {
        let connected = session
            .call(RpcMethod::IsDeviceConnected, |rpc| {
                rpc.is_device_connected(slot, TWOFG_PRODUCT_CODE)
            })
            .unwrap_or_else(|e| {
                debug!(%slot, error = %e, "Connectivity query failed, treating as disconnected");
                false
            });

        if connected {
            Ok(())
        } else {
            Err(GripperError::NotConnected { slot })
        }
    }

    /// 连接检查后执行一次 RPC
    fn checked<T>(
        session: &mut RpcSession<'_>,
        slot: DeviceSlot,
        method: RpcMethod,
        f: impl FnOnce(&mut dyn RpcChannel) -> std::result::Result<T, RpcError>,
    ) -> Result<T> {
        Self::ensure_connected(session, slot)?;
        Ok(session.call(method, f)?)
    }

    fn query<T>(
        &self,
        slot: DeviceSlot,
        method: RpcMethod,
        f: impl FnOnce(&mut dyn RpcChannel) -> std::result::Result<T, RpcError>,
    ) -> Result<T> {
        Self::checked(&mut self.dispatcher.session(), slot, method, f)
    }

    // ==================== 查询 ====================

    pub fn is_busy(&self, slot: DeviceSlot) -> Result<bool> {
        self.query(slot, RpcMethod::GetBusy, |rpc| rpc.get_busy(slot))
    }

    pub fn is_gripped(&self, slot: DeviceSlot) -> Result<bool> {
        self.query(slot, RpcMethod::GetGripDetected, |rpc| rpc.get_grip_detected(slot))
    }

    /// 设备状态码
    pub fn status(&self, slot: DeviceSlot) -> Result<i32> {
        self.query(slot, RpcMethod::GetStatus, |rpc| rpc.get_status(slot))
    }

    /// 当前外宽（mm）
    pub fn external_width(&self, slot: DeviceSlot) -> Result<f64> {
        self.query(slot, RpcMethod::GetExternalWidth, |rpc| rpc.get_external_width(slot))
    }

    pub fn min_external_width(&self, slot: DeviceSlot) -> Result<f64> {
        self.query(slot, RpcMethod::GetMinExternalWidth, |rpc| {
            rpc.get_min_external_width(slot)
        })
    }

    pub fn max_external_width(&self, slot: DeviceSlot) -> Result<f64> {
        self.query(slot, RpcMethod::GetMaxExternalWidth, |rpc| {
            rpc.get_max_external_width(slot)
        })
    }

    /// 当前夹持力（N）
    pub fn force(&self, slot: DeviceSlot) -> Result<f64> {
        self.query(slot, RpcMethod::GetForce, |rpc| rpc.get_force(slot))
    }

    /// 实时宽度范围（每次查询都重新做连接检查）
    fn width_limits(session: &mut RpcSession<'_>, slot: DeviceSlot) -> Result<WidthLimits> {
        let max = Self::checked(session, slot, RpcMethod::GetMaxExternalWidth, |rpc| {
            rpc.get_max_external_width(slot)
        })?;
        let min = Self::checked(session, slot, RpcMethod::GetMinExternalWidth, |rpc| {
            rpc.get_min_external_width(slot)
        })?;
        Ok(WidthLimits::new(min, max))
    }

    // ==================== 操作 ====================

    /// 外夹
    ///
    /// # 状态机
    ///
    /// 连接检查 → 校验 → 发送 → （`wait` 时）busy 轮询 → 夹持检测轮询。
    /// busy 轮询超时直接失败，不再进入夹持检测。
    pub fn grip(&self, slot: DeviceSlot, request: GripRequest) -> OperationOutcome {
        finish("grip", slot, self.try_grip(slot, request))
    }

    pub fn try_grip(&self, slot: DeviceSlot, request: GripRequest) -> Result<()> {
        let profile = self.profile();
        let force = request.force.unwrap_or(profile.force_default);
        let speed = request.speed.unwrap_or(f64::from(profile.speed_default));

        let mut session = self.dispatcher.session();
        Self::ensure_connected(&mut session, slot)?;

        let limits = Self::width_limits(&mut session, slot)?;
        self.validator.validate_grip(request.width, force, speed, limits)?;

        debug!(%slot, width = request.width, force, speed, "Sending external grip");
        session.call(RpcMethod::GripExternal, |rpc| {
            rpc.grip_external(slot, request.width, force as i32, speed as i32)
        })?;

        if !request.wait {
            return Ok(());
        }

        self.wait_until_idle(&mut session, slot)?;
        self.wait_until_gripped(&mut session, slot)?;
        info!(%slot, width = request.width, "Grip completed");
        Ok(())
    }

    /// 移动到目标宽度（固定力与速度，不做夹持检测）
    pub fn move_to(&self, slot: DeviceSlot, width: f64, wait: bool) -> OperationOutcome {
        finish("move", slot, self.try_move_to(slot, width, wait))
    }

    pub fn try_move_to(&self, slot: DeviceSlot, width: f64, wait: bool) -> Result<()> {
        let mut session = self.dispatcher.session();
        Self::ensure_connected(&mut session, slot)?;

        let limits = Self::width_limits(&mut session, slot)?;
        self.validator.validate_move(width, limits)?;

        debug!(%slot, width, "Sending move");
        session.call(RpcMethod::GripExternal, |rpc| {
            rpc.grip_external(slot, width, MOVE_FORCE, MOVE_SPEED)
        })?;

        if wait {
            self.wait_until_idle(&mut session, slot)?;
        }
        Ok(())
    }

    /// 停止运动
    pub fn stop(&self, slot: DeviceSlot) -> OperationOutcome {
        finish("stop", slot, self.try_stop(slot))
    }

    pub fn try_stop(&self, slot: DeviceSlot) -> Result<()> {
        self.query(slot, RpcMethod::Stop, |rpc| rpc.stop(slot))
    }

    // ==================== 轮询 ====================

    fn wait_until_idle(&self, session: &mut RpcSession<'_>, slot: DeviceSlot) -> Result<()> {
        self.poll_until(session, PollPhase::Busy, self.poll.busy_max_polls, |session| {
            let busy = session.call(RpcMethod::GetBusy, |rpc| rpc.get_busy(slot))?;
            Ok(!busy)
        })
    }

    fn wait_until_gripped(&self, session: &mut RpcSession<'_>, slot: DeviceSlot) -> Result<()> {
        self.poll_until(
            session,
            PollPhase::GripDetection,
            self.poll.grip_max_polls,
            |session| Ok(session.call(RpcMethod::GetGripDetected, |rpc| rpc.get_grip_detected(slot))?),
        )
    }

    /// 固定间隔轮询，直到 `done` 为真
    ///
    /// 首次检查不计数；之后每次 sleep + 检查计一次，超过 `max_polls` 即超时。
    fn poll_until(
        &self,
        session: &mut RpcSession<'_>,
        phase: PollPhase,
        max_polls: u32,
        mut done: impl FnMut(&mut RpcSession<'_>) -> Result<bool>,
    ) -> Result<()> {
        let interval = self.poll.interval();
        let mut polls = 0;

        while !done(session)? {
            if polls >= max_polls {
                return Err(GripperError::Timeout { phase, polls });
            }
            std::thread::sleep(interval);
            polls += 1;
        }

        trace!(%phase, polls, "Poll phase finished");
        Ok(())
    }

    // ==================== 手指朝向 ====================

    /// 手指朝向的原始值（格式随固件版本变化）
    pub fn get_finger_orientation(&self, slot: DeviceSlot) -> Result<OrientationValue> {
        self.query(slot, RpcMethod::FingerOrientationOutward, |rpc| {
            rpc.finger_orientation_outward(slot)
        })
    }

    /// 归一化后的朝向；查询失败时为 `Unknown`
    pub fn finger_orientation(&self, slot: DeviceSlot) -> FingerOrientation {
        match self.get_finger_orientation(slot) {
            Ok(raw) => raw.normalize(),
            Err(e) => {
                debug!(%slot, error = %e, "Finger orientation query failed");
                FingerOrientation::Unknown
            },
        }
    }

    /// `"outward"` / `"inward"`，未知时为 `None`
    pub fn finger_orientation_label(&self, slot: DeviceSlot) -> Option<&'static str> {
        self.finger_orientation(slot).label()
    }

    /// 设置手指朝向
    ///
    /// 接受布尔值、数值或文本（见 [`OrientationValue::normalize`]）。
    /// 先走 RPC，失败后回退到 REST。
    pub fn set_finger_orientation(
        &self,
        slot: DeviceSlot,
        orientation: impl Into<OrientationValue>,
    ) -> OperationOutcome {
        finish(
            "set_finger_orientation",
            slot,
            self.try_set_finger_orientation(slot, orientation),
        )
    }

    pub fn try_set_finger_orientation(
        &self,
        slot: DeviceSlot,
        orientation: impl Into<OrientationValue>,
    ) -> Result<()> {
        let mut session = self.dispatcher.session();
        Self::ensure_connected(&mut session, slot)?;

        let requested = orientation.into();
        let outward = requested
            .normalize()
            .as_outward()
            .ok_or_else(|| GripperError::InvalidOrientation(format!("{:?}", requested)))?;

        let value = if outward { 1.0 } else { 0.0 };
        match session.call(RpcMethod::SetFingerOrientation, |rpc| {
            rpc.set_finger_orientation(slot, value)
        }) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(%slot, error = %e, "RPC orientation set failed, falling back to REST");
                let path = set_finger_orientation_path(slot, outward);
                session.call_rest(&path, self.rest_timeout)?;
                Ok(())
            },
        }
    }

    // ==================== 状态流 ====================

    /// 启动状态流
    ///
    /// 控制器只创建一次，之后的调用复用它（`on_update` 仅在创建时生效）。
    /// 未配置地址、没有事件通道或连接失败时返回 `false`。
    pub fn start_status_stream(
        &self,
        on_update: Option<Arc<dyn StatusCallback>>,
        timeout: Option<Duration>,
    ) -> bool {
        let Some(address) = self.dispatcher.address() else {
            warn!("Status stream requires a Compute Box address");
            return false;
        };

        let stream = {
            let mut guard = self.stream.lock();
            match guard.as_ref() {
                Some(stream) => Arc::clone(stream),
                None => {
                    let Some(channel) = self.event_channel.lock().take() else {
                        warn!("No event channel configured for status stream");
                        return false;
                    };
                    let stream = StatusStream::from_boxed(address, channel);
                    if let Some(callback) = on_update {
                        stream.add_callback(callback);
                    }
                    let stream = Arc::new(stream);
                    *guard = Some(Arc::clone(&stream));
                    stream
                },
            }
        };

        stream.connect(timeout.unwrap_or(self.stream_connect_timeout))
    }

    /// 断开状态流（控制器保留，可再次启动）
    pub fn stop_status_stream(&self) {
        // 事件通道的 disconnect 可能在投递线程上回调本对象，不能持锁调用
        if let Some(stream) = self.status_stream() {
            stream.disconnect();
        }
    }

    /// 状态流控制器（尚未启动时为 `None`）
    pub fn status_stream(&self) -> Option<Arc<StatusStream>> {
        self.stream.lock().clone()
    }

    /// 本槽位 2FG 的最新推送变量块
    pub fn status_snapshot(&self, slot: DeviceSlot) -> Option<JsonMap> {
        self.status_stream()?
            .get_device_variable(slot, Some(TWOFG_PRODUCT_CODE))
    }
}

/// 记录失败原因并折叠为结果码
fn finish(operation: &'static str, slot: DeviceSlot, result: Result<()>) -> OperationOutcome {
    if let Err(e) = &result {
        warn!(operation, %slot, error = %e, "2FG operation failed");
    }
    into_outcome(result)
}
