//! RPC 调度器
//!
//! 一个夹爪实例只有一条 RPC 通道。`RpcDispatcher` 用一把互斥锁把所有 RPC
//! 和 REST 调用串行化：不同线程的调用全序执行，但单次调用永远不会被打断。
//!
//! # 锁的粒度
//!
//! - [`RpcDispatcher::call`] / [`RpcDispatcher::call_rest`]：单次调用持锁
//! - [`RpcDispatcher::session`]：返回持锁的 [`RpcSession`]，多步操作
//!   （例如阻塞式 grip 的整个轮询过程）在同一把锁内完成，期间其它线程的调用等待
//!
//! 锁是 `parking_lot::Mutex`，不可重入：持有 session 时不要再调用 dispatcher 本身的方法。

use crate::error::{DriverError, RpcError};
use crate::rest::{HttpRestTransport, RestTransport, rest_url};
use crate::rpc::RpcChannel;
use onrobot_protocol::RpcMethod;
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, trace};

/// 锁内的通道集合
struct Channels {
    rpc: Box<dyn RpcChannel>,
    /// 首次使用 REST 时才创建（未配置地址时永远不会创建）
    rest: Option<Box<dyn RestTransport>>,
}

/// 线程安全的 RPC/REST 调度器
pub struct RpcDispatcher {
    channels: Mutex<Channels>,
    /// Compute Box 地址（`host` 或 `host:port`），REST 回退需要
    address: Option<String>,
}

impl RpcDispatcher {
    /// 创建调度器
    ///
    /// # 参数
    /// - `rpc`: RPC 通道（所有权移入调度器）
    /// - `address`: Compute Box 地址，`None` 表示不支持 REST 回退
    pub fn new(rpc: impl RpcChannel + 'static, address: Option<String>) -> Self {
        Self::from_boxed(Box::new(rpc), address)
    }

    pub fn from_boxed(rpc: Box<dyn RpcChannel>, address: Option<String>) -> Self {
        Self {
            channels: Mutex::new(Channels { rpc, rest: None }),
            address,
        }
    }

    /// 替换 REST 实现（默认使用 [`HttpRestTransport`]）
    pub fn with_rest_transport(self, rest: impl RestTransport + 'static) -> Self {
        self.channels.lock().rest = Some(Box::new(rest));
        self
    }

    /// Compute Box 地址
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// 获取持锁会话
    ///
    /// 会话存活期间，其它线程的 `call` / `call_rest` / `session` 都会阻塞。
    pub fn session(&self) -> RpcSession<'_> {
        RpcSession {
            channels: self.channels.lock(),
            address: self.address.as_deref(),
        }
    }

    /// 单次 RPC 调用（持锁）
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let busy = dispatcher.call(RpcMethod::GetBusy, |rpc| rpc.get_busy(slot))?;
    /// ```
    pub fn call<T>(
        &self,
        method: RpcMethod,
        f: impl FnOnce(&mut dyn RpcChannel) -> Result<T, RpcError>,
    ) -> Result<T, DriverError> {
        self.session().call(method, f)
    }

    /// 单次 REST GET（与 RPC 共用同一把锁）
    ///
    /// # 错误
    /// - `DriverError::RestNotConfigured`: 未配置地址
    /// - `DriverError::Rest`: 超时、不可达或非 2xx 响应
    pub fn call_rest(&self, path: &str, timeout: Duration) -> Result<String, DriverError> {
        self.session().call_rest(path, timeout)
    }
}

/// 持有调度器锁的会话
pub struct RpcSession<'a> {
    channels: MutexGuard<'a, Channels>,
    address: Option<&'a str>,
}

impl RpcSession<'_> {
    /// 在已持有的锁内执行一次 RPC 调用
    pub fn call<T>(
        &mut self,
        method: RpcMethod,
        f: impl FnOnce(&mut dyn RpcChannel) -> Result<T, RpcError>,
    ) -> Result<T, DriverError> {
        trace!(%method, "RPC call");
        f(&mut *self.channels.rpc).map_err(|source| {
            debug!(%method, error = %source, "RPC call failed");
            DriverError::Rpc { method, source }
        })
    }

    /// 在已持有的锁内执行一次 REST GET
    pub fn call_rest(&mut self, path: &str, timeout: Duration) -> Result<String, DriverError> {
        let address = self.address.ok_or(DriverError::RestNotConfigured)?;
        let url = rest_url(address, path);

        if self.channels.rest.is_none() {
            self.channels.rest = Some(Box::new(HttpRestTransport::new()?));
        }
        let Some(rest) = self.channels.rest.as_mut() else {
            return Err(DriverError::RestNotConfigured);
        };

        rest.get(&url, timeout).map_err(|source| {
            debug!(%url, error = %source, "REST call failed");
            DriverError::Rest { url, source }
        })
    }
}
