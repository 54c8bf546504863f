//! 驱动层错误类型定义

use onrobot_protocol::RpcMethod;
use thiserror::Error;

/// 远程过程调用错误（由 `RpcChannel` 实现返回）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// 传输层失败（连接断开、编解码失败等）
    #[error("RPC transport failure: {0}")]
    Transport(String),

    /// 远端返回 fault
    #[error("RPC fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// 调用超时
    #[error("RPC call timeout")]
    Timeout,
}

/// REST 请求错误（由 `RestTransport` 实现返回）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RestError {
    /// 请求超时
    #[error("request timeout")]
    Timeout,

    /// 无法连接
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// 非 2xx 响应
    #[error("HTTP status {0}")]
    Status(u16),

    /// 响应体读取失败
    #[error("invalid response body: {0}")]
    Body(String),
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 远程过程调用失败
    #[error("RPC call `{method}` failed: {source}")]
    Rpc {
        method: RpcMethod,
        #[source]
        source: RpcError,
    },

    /// 未配置 Compute Box 地址，无法走 REST
    #[error("Compute Box address is not configured")]
    RestNotConfigured,

    /// REST 请求失败
    #[error("REST request to {url} failed: {source}")]
    Rest {
        url: String,
        #[source]
        source: RestError,
    },

    /// HTTP 客户端初始化失败
    #[error("HTTP client init failed: {0}")]
    HttpClient(String),

    /// 事件通道错误
    #[error("Event channel error: {0}")]
    EventChannel(String),
}

impl DriverError {
    /// 是否为网络/传输层失败（与配置错误区分）
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Rpc { .. } | Self::Rest { .. } | Self::EventChannel(_))
    }
}
