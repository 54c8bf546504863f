//! 夹爪配置
//!
//! 从 TOML 加载，所有字段都有默认值：
//!
//! ```toml
//! address = "192.168.1.1"
//! gripper_type = "twofg7"
//! rest_timeout_ms = 2000
//! stream_connect_timeout_ms = 2000
//!
//! [poll]
//! interval_ms = 100
//! busy_max_polls = 30
//! grip_max_polls = 20
//! ```

use crate::error::{GripperError, Result};
use onrobot_protocol::{DEFAULT_GRIPPER_TYPE, GripperProfile, gripper_profile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 轮询节奏
///
/// 固定间隔、固定次数，不做退避。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// 轮询间隔（毫秒）
    pub interval_ms: u64,
    /// busy 阶段最多轮询次数
    pub busy_max_polls: u32,
    /// 夹持检测阶段最多轮询次数
    pub grip_max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            busy_max_polls: 30,
            grip_max_polls: 20,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// 夹爪配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperConfig {
    /// Compute Box 地址（`host` 或 `host:port`）；REST 回退与状态流需要
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// 参数表型号键
    pub gripper_type: String,
    pub rest_timeout_ms: u64,
    pub stream_connect_timeout_ms: u64,
    pub poll: PollConfig,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            address: None,
            gripper_type: DEFAULT_GRIPPER_TYPE.to_string(),
            rest_timeout_ms: 2000,
            stream_connect_timeout_ms: 2000,
            poll: PollConfig::default(),
        }
    }
}

impl GripperConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GripperError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GripperError::Config(e.to_string()))
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| GripperError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        fs::write(path, content)
            .map_err(|e| GripperError::Config(format!("{}: {}", path.display(), e)))
    }

    /// 对应的参数表（未知型号回退到默认型号）
    pub fn profile(&self) -> &'static GripperProfile {
        gripper_profile(Some(&self.gripper_type))
    }

    pub fn rest_timeout(&self) -> Duration {
        Duration::from_millis(self.rest_timeout_ms)
    }

    pub fn stream_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_connect_timeout_ms)
    }
}
