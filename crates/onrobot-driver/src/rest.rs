//! REST 回退通道
//!
//! 部分固件版本没有通过 XML-RPC 暴露某些操作（例如手指朝向），
//! 但 Compute Box 的 Web 接口提供了对应的 `GET` 端点。

use crate::error::{DriverError, RestError};
use std::time::Duration;
use tracing::trace;

/// REST 请求的默认超时
pub const DEFAULT_REST_TIMEOUT: Duration = Duration::from_secs(2);

/// 带超时的 HTTP GET
///
/// 与 [`RpcChannel`](crate::RpcChannel) 一样只在 dispatcher 锁内被调用。
pub trait RestTransport: Send {
    /// 发送 `GET url`，返回响应体文本
    fn get(&mut self, url: &str, timeout: Duration) -> Result<String, RestError>;
}

impl<T: RestTransport + ?Sized> RestTransport for Box<T> {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<String, RestError> {
        (**self).get(url, timeout)
    }
}

/// 拼接 Compute Box REST URL（`path` 前导 `/` 可有可无）
pub fn rest_url(address: &str, path: &str) -> String {
    format!("http://{}/{}", address, path.trim_start_matches('/'))
}

/// 基于 `reqwest::blocking` 的实现
pub struct HttpRestTransport {
    client: reqwest::blocking::Client,
}

impl HttpRestTransport {
    /// 创建 HTTP 客户端
    ///
    /// # 错误
    /// - `DriverError::HttpClient`: 客户端初始化失败
    pub fn new() -> Result<Self, DriverError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DriverError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

impl RestTransport for HttpRestTransport {
    fn get(&mut self, url: &str, timeout: Duration) -> Result<String, RestError> {
        trace!(url, ?timeout, "REST GET");

        let response = self.client.get(url).timeout(timeout).send().map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RestError::Status(status.as_u16()));
        }

        response.text().map_err(|e| {
            if e.is_timeout() {
                RestError::Timeout
            } else {
                RestError::Body(e.to_string())
            }
        })
    }
}

fn classify(err: reqwest::Error) -> RestError {
    if err.is_timeout() {
        RestError::Timeout
    } else {
        RestError::Unreachable(err.to_string())
    }
}
