//! Builder 模式实现
//!
//! 提供链式构造 [`TwoFg`] 实例的便捷方式。

use crate::config::{GripperConfig, PollConfig};
use crate::error::{GripperError, Result};
use crate::gripper::TwoFg;
use onrobot_driver::{EventChannel, RestTransport, RpcChannel, RpcDispatcher};
use std::time::Duration;
use tracing::debug;

/// TwoFg Builder（链式构造）
///
/// RPC 通道是唯一必需的依赖；其余都有默认值。
///
/// # Example
///
/// ```rust,ignore
/// use onrobot_client::{GripperConfig, TwoFgBuilder};
///
/// let gripper = TwoFgBuilder::new()
///     .rpc_channel(my_xmlrpc_channel)
///     .address("192.168.1.1")
///     .build()?;
///
/// // 从配置文件构造
/// let config = GripperConfig::load_from_file("gripper.toml")?;
/// let gripper = TwoFgBuilder::new()
///     .rpc_channel(my_xmlrpc_channel)
///     .config(config)
///     .build()?;
/// ```
#[derive(Default)]
pub struct TwoFgBuilder {
    rpc: Option<Box<dyn RpcChannel>>,
    rest: Option<Box<dyn RestTransport>>,
    event_channel: Option<Box<dyn EventChannel>>,
    config: GripperConfig,
}

impl TwoFgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 RPC 通道（必需）
    pub fn rpc_channel(mut self, rpc: impl RpcChannel + 'static) -> Self {
        self.rpc = Some(Box::new(rpc));
        self
    }

    /// 设置 Compute Box 地址（REST 回退与状态流需要）
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = Some(address.into());
        self
    }

    /// 替换 REST 实现（默认首次使用时创建 `HttpRestTransport`）
    pub fn rest_transport(mut self, rest: impl RestTransport + 'static) -> Self {
        self.rest = Some(Box::new(rest));
        self
    }

    /// 设置状态流使用的事件通道
    pub fn event_channel(mut self, channel: impl EventChannel + 'static) -> Self {
        self.event_channel = Some(Box::new(channel));
        self
    }

    /// 参数表型号键（未知型号回退到默认型号）
    pub fn gripper_type(mut self, key: impl Into<String>) -> Self {
        self.config.gripper_type = key.into();
        self
    }

    pub fn poll_config(mut self, poll: PollConfig) -> Self {
        self.config.poll = poll;
        self
    }

    pub fn rest_timeout(mut self, timeout: Duration) -> Self {
        self.config.rest_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn stream_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.stream_connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 整体替换配置（覆盖之前设置的地址、型号与超时）
    pub fn config(mut self, config: GripperConfig) -> Self {
        self.config = config;
        self
    }

    /// 构建 TwoFg 实例
    ///
    /// # 错误
    /// - `GripperError::Config`: 未设置 RPC 通道
    pub fn build(self) -> Result<TwoFg> {
        let rpc = self
            .rpc
            .ok_or_else(|| GripperError::Config("RPC channel is required".to_string()))?;

        let mut dispatcher = RpcDispatcher::from_boxed(rpc, self.config.address.clone());
        if let Some(rest) = self.rest {
            dispatcher = dispatcher.with_rest_transport(rest);
        }

        debug!(
            address = ?self.config.address,
            gripper_type = %self.config.gripper_type,
            "Building 2FG gripper"
        );
        Ok(TwoFg::from_parts(dispatcher, &self.config, self.event_channel))
    }
}
