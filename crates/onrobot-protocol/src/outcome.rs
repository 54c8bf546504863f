//! 公共操作的结果码
//!
//! 所有对外操作（grip / move / stop / 设置手指朝向）都只返回这三个值之一，
//! 诊断细节通过 tracing 日志输出，不编码在返回值里。

use crate::ProtocolError;
use std::fmt;

/// 操作结果
///
/// 数值与 Compute Box 脚本接口保持一致：`OK = 0`、`FAILED = -1`、`CONNECTION_ERROR = -2`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum OperationOutcome {
    /// 成功
    Ok = 0,
    /// 参数非法、超时或传输失败
    Failed = -1,
    /// 指定槽位上没有对应设备
    ConnectionError = -2,
}

impl OperationOutcome {
    /// 数值形式
    pub fn code(self) -> i32 {
        self.into()
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl TryFrom<i32> for OperationOutcome {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            -1 => Ok(Self::Failed),
            -2 => Ok(Self::ConnectionError),
            other => Err(ProtocolError::UnknownOutcome(other)),
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::ConnectionError => "CONNECTION_ERROR",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_codes() {
        assert_eq!(OperationOutcome::Ok.code(), 0);
        assert_eq!(OperationOutcome::Failed.code(), -1);
        assert_eq!(OperationOutcome::ConnectionError.code(), -2);
    }

    #[test]
    fn test_outcome_from_code() {
        assert_eq!(OperationOutcome::try_from(-2), Ok(OperationOutcome::ConnectionError));
        assert_eq!(
            OperationOutcome::try_from(1),
            Err(ProtocolError::UnknownOutcome(1))
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(format!("{}", OperationOutcome::Failed), "FAILED (-1)");
        assert!(OperationOutcome::Ok.is_ok());
        assert!(!OperationOutcome::ConnectionError.is_ok());
    }
}
