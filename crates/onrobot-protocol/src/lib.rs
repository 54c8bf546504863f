//! # OnRobot Protocol
//!
//! OnRobot Compute Box 夹爪的协议层定义（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `device`: 设备槽位、产品码、设备句柄
//! - `outcome`: 公共操作的三值结果码（OK / FAILED / CONNECTION_ERROR）
//! - `methods`: XML-RPC 远程过程名与 REST 路径
//! - `orientation`: 手指朝向的原始值归一化
//! - `profile`: 各型号夹爪的静态参数表
//!
//! ## 分层
//!
//! ```text
//! onrobot-client   (TwoFg: 校验、阻塞操作、轮询)
//!     ↓
//! onrobot-driver   (RpcDispatcher、StatusCache、StatusStream)
//!     ↓
//! onrobot-protocol (此 crate：纯数据)
//! ```

pub mod device;
pub mod methods;
pub mod orientation;
pub mod outcome;
pub mod profile;

// 重新导出常用类型
pub use device::*;
pub use methods::*;
pub use orientation::*;
pub use outcome::*;
pub use profile::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 设备槽位越界（合法值 0-2）
    #[error("Invalid device slot: {0} (expected 0, 1 or 2)")]
    InvalidSlot(u8),

    /// 未知的操作结果码
    #[error("Unknown outcome code: {0}")]
    UnknownOutcome(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let msg = format!("{}", ProtocolError::InvalidSlot(7));
        assert!(msg.contains("Invalid device slot") && msg.contains('7'));

        let msg = format!("{}", ProtocolError::UnknownOutcome(-9));
        assert_eq!(msg, "Unknown outcome code: -9");
    }
}
