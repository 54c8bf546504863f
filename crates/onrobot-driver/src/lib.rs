//! 驱动层模块
//!
//! 本 crate 负责与 Compute Box 的两条通道打交道：
//! - RPC 调度（单锁串行化，REST 回退）
//! - 状态同步（ArcSwap 无锁读取最新推送）
//! - 状态流生命周期与用户回调
//!
//! # 使用场景
//!
//! 需要自己组装调度器、直接发送 RPC 的场景。
//! 大多数用户应该使用 `onrobot-client` 提供的 `TwoFg` 接口。

pub mod cache;
mod dispatcher;
mod error;
pub mod hooks;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rest;
mod rpc;
pub mod stream;

pub use cache::{JsonMap, StatusCache, StatusSnapshot};
pub use dispatcher::{RpcDispatcher, RpcSession};
pub use error::{DriverError, RestError, RpcError};
pub use hooks::{StatusCallback, StatusHooks};
pub use rest::{DEFAULT_REST_TIMEOUT, HttpRestTransport, RestTransport};
pub use rpc::RpcChannel;
pub use stream::{
    ConnectOptions, DEFAULT_CONNECT_TIMEOUT, EventChannel, MessageHandler, StatusStream,
    StreamTransport,
};
