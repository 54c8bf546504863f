//! RPC 通道抽象
//!
//! Compute Box 通过 XML-RPC 暴露一组具名过程。这里为每个过程定义一个方法，
//! 而不是"按名字调用"的通用入口，让参数与返回类型在编译期可检查。
//!
//! 连接与握手由实现方负责；本 crate 只关心调用契约。所有调用都经过
//! [`RpcDispatcher`](crate::RpcDispatcher) 串行化，因此方法签名使用 `&mut self`，
//! 实现不需要是 `Sync`。

use crate::error::RpcError;
use onrobot_protocol::{DeviceSlot, OrientationValue};

/// Compute Box 远程过程集合
///
/// 方法与 [`RpcMethod`](onrobot_protocol::RpcMethod) 一一对应。
pub trait RpcChannel: Send {
    /// `cb_is_device_connected`：指定槽位上是否挂载了给定产品码的设备
    fn is_device_connected(&mut self, slot: DeviceSlot, product_code: u32)
    -> Result<bool, RpcError>;

    /// `twofg_get_busy`：夹爪是否正在运动
    fn get_busy(&mut self, slot: DeviceSlot) -> Result<bool, RpcError>;

    /// `twofg_get_grip_detected`：是否检测到夹持物
    fn get_grip_detected(&mut self, slot: DeviceSlot) -> Result<bool, RpcError>;

    /// `twofg_get_status`：设备状态码
    fn get_status(&mut self, slot: DeviceSlot) -> Result<i32, RpcError>;

    /// `twofg_get_external_width`：当前外宽（mm）
    fn get_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError>;

    /// `twofg_get_min_external_width`：当前可达的最小外宽（mm）
    fn get_min_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError>;

    /// `twofg_get_max_external_width`：当前可达的最大外宽（mm）
    fn get_max_external_width(&mut self, slot: DeviceSlot) -> Result<f64, RpcError>;

    /// `twofg_get_force`：当前夹持力（N）
    fn get_force(&mut self, slot: DeviceSlot) -> Result<f64, RpcError>;

    /// `twofg_stop`：停止运动
    fn stop(&mut self, slot: DeviceSlot) -> Result<(), RpcError>;

    /// `twofg_grip_external`：外夹到目标宽度
    ///
    /// - `width`: 目标宽度（mm）
    /// - `force`: 夹持力（N，整数）
    /// - `speed`: 速度（%，整数）
    fn grip_external(
        &mut self,
        slot: DeviceSlot,
        width: f64,
        force: i32,
        speed: i32,
    ) -> Result<(), RpcError>;

    /// `twofg_finger_orientation_outward`：手指朝向的原始值（格式随固件版本变化）
    fn finger_orientation_outward(&mut self, slot: DeviceSlot)
    -> Result<OrientationValue, RpcError>;

    /// `twofg_set_finger_orientation`：设置手指朝向（`1.0` 向外，`0.0` 向内）
    fn set_finger_orientation(&mut self, slot: DeviceSlot, value: f64) -> Result<(), RpcError>;
}
