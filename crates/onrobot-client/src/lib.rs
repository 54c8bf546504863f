//! 客户端接口模块
//!
//! 本 crate 提供 OnRobot 2FG 夹爪的用户接口，包括：
//! - 连接检查与参数校验（越界时命令不会发送）
//! - 阻塞式 grip / move（固定间隔、固定次数的轮询）
//! - 手指朝向读取与设置（RPC 优先，REST 回退）
//! - 状态流与推送状态查询
//! - TOML 配置
//!
//! # 示例
//!
//! ```rust,ignore
//! use onrobot_client::{GripRequest, TwoFg};
//! use onrobot_protocol::{DeviceSlot, OperationOutcome};
//!
//! let gripper = TwoFg::builder().rpc_channel(channel).address("192.168.1.1").build()?;
//! let outcome = gripper.grip(DeviceSlot::Single, GripRequest::new(10.0).force(40.0));
//! assert_eq!(outcome, OperationOutcome::Ok);
//! ```

mod builder;
pub mod config;
mod error;
mod gripper;
pub mod validator;

pub use builder::TwoFgBuilder;
pub use config::{GripperConfig, PollConfig};
pub use error::{GripperError, PollPhase, Result};
pub use gripper::{DEFAULT_MOVE_WIDTH, GripRequest, MOVE_FORCE, MOVE_SPEED, TwoFg};
pub use validator::{Bound, CommandValidator, Parameter, ValidationError, WidthLimits};
