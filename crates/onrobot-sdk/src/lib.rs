//! OnRobot SDK - OnRobot Compute Box 夹爪 Rust SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 设备槽位、结果码、RPC 方法名、朝向归一化、参数表
//! - **驱动层** (`driver`): RPC 调度（单锁）、REST 回退、状态缓存、状态流
//! - **客户端层** (`client`): 参数校验、阻塞式 grip/move、手指朝向、配置
//!
//! # 快速开始
//!
//! ```rust,ignore
//! use onrobot_sdk::prelude::*;
//!
//! onrobot_sdk::init_logging();
//! let gripper = TwoFg::builder()
//!     .rpc_channel(channel)
//!     .address("192.168.1.1")
//!     .build()?;
//!
//! if gripper.grip(DeviceSlot::Single, GripRequest::new(10.0)) != OperationOutcome::Ok {
//!     // 细节见日志
//! }
//! ```
//!
//! RPC 与事件通道的具体传输由调用方实现 [`RpcChannel`] 与 [`EventChannel`] 提供。

pub use onrobot_client as client;
pub use onrobot_driver as driver;
pub use onrobot_protocol as protocol;

mod logging;
pub mod prelude;

pub use logging::init_logging;

// 客户端层（推荐入口）
pub use client::{
    GripRequest, GripperConfig, GripperError, PollConfig, TwoFg, TwoFgBuilder, ValidationError,
};

// 驱动层扩展点
pub use driver::{DriverError, EventChannel, RestTransport, RpcChannel, StatusCallback};

// 协议层
pub use protocol::{DeviceSlot, FingerOrientation, OperationOutcome, ProtocolError};
