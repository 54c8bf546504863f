//! Compute Box 远程接口名
//!
//! XML-RPC 过程名沿用 Compute Box 固件的命名，便于抓包对照；
//! REST 路径只覆盖 RPC 不一定提供的少数操作（目前只有手指朝向）。

use crate::DeviceSlot;
use std::fmt;

/// XML-RPC 远程过程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    /// `cb_is_device_connected(slot, product_code) -> bool`
    IsDeviceConnected,
    /// `twofg_get_busy(slot) -> bool`
    GetBusy,
    /// `twofg_get_grip_detected(slot) -> bool`
    GetGripDetected,
    /// `twofg_get_status(slot) -> int`
    GetStatus,
    /// `twofg_get_external_width(slot) -> float`
    GetExternalWidth,
    /// `twofg_get_min_external_width(slot) -> float`
    GetMinExternalWidth,
    /// `twofg_get_max_external_width(slot) -> float`
    GetMaxExternalWidth,
    /// `twofg_get_force(slot) -> float`
    GetForce,
    /// `twofg_stop(slot)`
    Stop,
    /// `twofg_grip_external(slot, width, force, speed)`
    GripExternal,
    /// `twofg_finger_orientation_outward(slot) -> 设备相关的原始值`
    FingerOrientationOutward,
    /// `twofg_set_finger_orientation(slot, value)`
    SetFingerOrientation,
}

impl RpcMethod {
    /// 固件侧的过程名
    pub const fn name(self) -> &'static str {
        match self {
            Self::IsDeviceConnected => "cb_is_device_connected",
            Self::GetBusy => "twofg_get_busy",
            Self::GetGripDetected => "twofg_get_grip_detected",
            Self::GetStatus => "twofg_get_status",
            Self::GetExternalWidth => "twofg_get_external_width",
            Self::GetMinExternalWidth => "twofg_get_min_external_width",
            Self::GetMaxExternalWidth => "twofg_get_max_external_width",
            Self::GetForce => "twofg_get_force",
            Self::Stop => "twofg_stop",
            Self::GripExternal => "twofg_grip_external",
            Self::FingerOrientationOutward => "twofg_finger_orientation_outward",
            Self::SetFingerOrientation => "twofg_set_finger_orientation",
        }
    }

    /// 是否会让设备产生动作（用于测试中断言"未下发命令"）
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            Self::Stop | Self::GripExternal | Self::SetFingerOrientation
        )
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 设置手指朝向的 REST 路径
///
/// `GET http://{address}/api/dc/twofg/set_finger_orientation/{slot}/{true|false}`
pub fn set_finger_orientation_path(slot: DeviceSlot, outward: bool) -> String {
    format!(
        "api/dc/twofg/set_finger_orientation/{}/{}",
        slot.index(),
        if outward { "true" } else { "false" }
    )
}
