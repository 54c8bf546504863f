//! 设备标识
//!
//! Compute Box 最多同时挂载两台夹爪（Dual Quick Changer），
//! 每次调用都需要显式给出槽位和设备类型。

use crate::ProtocolError;
use std::fmt;

/// 2FG7 / 2FG14 系列的产品码（`cb_is_device_connected` 的第二个参数）
pub const TWOFG_PRODUCT_CODE: u32 = 0xC0;

/// 设备槽位
///
/// - `Single` (0): 单夹爪安装
/// - `DualPrimary` (1): 双快换的主工位
/// - `DualSecondary` (2): 双快换的副工位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeviceSlot {
    #[default]
    Single = 0,
    DualPrimary = 1,
    DualSecondary = 2,
}

impl DeviceSlot {
    /// 全部槽位（按索引顺序）
    pub const ALL: [DeviceSlot; 3] = [
        DeviceSlot::Single,
        DeviceSlot::DualPrimary,
        DeviceSlot::DualSecondary,
    ];

    /// 远程调用使用的槽位索引
    pub fn index(self) -> u8 {
        self.into()
    }
}

impl TryFrom<u8> for DeviceSlot {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Single),
            1 => Ok(Self::DualPrimary),
            2 => Ok(Self::DualSecondary),
            other => Err(ProtocolError::InvalidSlot(other)),
        }
    }
}

impl fmt::Display for DeviceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single(0)"),
            Self::DualPrimary => write!(f, "dual-primary(1)"),
            Self::DualSecondary => write!(f, "dual-secondary(2)"),
        }
    }
}

/// 一台物理夹爪的句柄：槽位 + 产品码
///
/// 不持久化，每次调用由调用方给出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceHandle {
    pub slot: DeviceSlot,
    pub product_code: u32,
}

impl DeviceHandle {
    pub const fn new(slot: DeviceSlot, product_code: u32) -> Self {
        Self { slot, product_code }
    }

    /// 指定槽位上的 2FG 夹爪
    pub const fn twofg(slot: DeviceSlot) -> Self {
        Self::new(slot, TWOFG_PRODUCT_CODE)
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@0x{:02X}", self.slot, self.product_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_roundtrip() {
        for slot in DeviceSlot::ALL {
            assert_eq!(DeviceSlot::try_from(slot.index()), Ok(slot));
        }
        assert_eq!(DeviceSlot::DualSecondary.index(), 2);
    }

    #[test]
    fn test_slot_out_of_range() {
        assert_eq!(DeviceSlot::try_from(3), Err(ProtocolError::InvalidSlot(3)));
    }

    #[test]
    fn test_twofg_handle() {
        let handle = DeviceHandle::twofg(DeviceSlot::DualPrimary);
        assert_eq!(handle.product_code, 192);
        assert_eq!(format!("{}", handle), "dual-primary(1)@0xC0");
    }
}
