//! 客户端错误类型
//!
//! 公共操作在边界上通过 [`GripperError::outcome`] 折叠为三值结果码；
//! 查询接口直接返回 `Result`，调用方需要时用同一个方法映射。

use crate::validator::ValidationError;
use onrobot_driver::DriverError;
use onrobot_protocol::{DeviceSlot, OperationOutcome};
use std::fmt;
use thiserror::Error;

/// 轮询阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// 等待 busy 清除（运动结束）
    Busy,
    /// 等待检测到夹持物
    GripDetection,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("busy-wait"),
            Self::GripDetection => f.write_str("grip-detection"),
        }
    }
}

/// 夹爪客户端错误
#[derive(Error, Debug)]
pub enum GripperError {
    /// 槽位上没有检测到设备
    #[error("No 2FG device connected on slot {slot}")]
    NotConnected { slot: DeviceSlot },

    /// 参数越界（命令未发送）
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// 轮询预算耗尽
    #[error("Timed out in {phase} phase after {polls} polls")]
    Timeout { phase: PollPhase, polls: u32 },

    /// RPC / REST 失败
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 无法解析的朝向输入
    #[error("Invalid finger orientation: {0}")]
    InvalidOrientation(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GripperError {
    /// 折叠为公共结果码
    ///
    /// 只有连接检查失败映射为 `CONNECTION_ERROR`，其余一律 `FAILED`。
    pub fn outcome(&self) -> OperationOutcome {
        match self {
            Self::NotConnected { .. } => OperationOutcome::ConnectionError,
            _ => OperationOutcome::Failed,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, GripperError>;

/// 把操作结果折叠为结果码
pub(crate) fn into_outcome(result: Result<()>) -> OperationOutcome {
    match result {
        Ok(()) => OperationOutcome::Ok,
        Err(e) => e.outcome(),
    }
}
