//! 日志初始化

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// 安装全局日志订阅器
///
/// - 过滤规则取自 `RUST_LOG`，未设置时为 `info`
/// - `log` crate 的记录通过 `tracing-log` 转发
///
/// 可重复调用；宿主程序已安装订阅器时不会覆盖。
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_log::LogTracer::init();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global tracing subscriber already installed");
        }
    });
}
