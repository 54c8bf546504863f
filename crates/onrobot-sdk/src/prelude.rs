//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use onrobot_sdk::prelude::*;
//! ```

// 客户端层
pub use crate::client::{GripRequest, GripperConfig, PollConfig, TwoFg, TwoFgBuilder};

// 传输扩展点
pub use crate::driver::{EventChannel, RestTransport, RpcChannel, StatusCallback};

// 协议层常用类型
pub use crate::protocol::{
    DeviceSlot, FingerOrientation, OperationOutcome, OrientationValue, gripper_profile,
};

// 错误类型
pub use crate::client::GripperError;
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
