//! 命令参数校验
//!
//! 在发送任何命令之前检查宽度、夹持力和速度：
//! - 宽度上下限来自设备实时查询（每台夹爪的物理行程不同）
//! - 夹持力与速度范围来自静态参数表
//!
//! 校验失败时命令不会被发送。

use onrobot_protocol::GripperProfile;
use std::fmt;
use thiserror::Error;

/// 被校验的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Width,
    Force,
    Speed,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => f.write_str("width"),
            Self::Force => f.write_str("force"),
            Self::Speed => f.write_str("speed"),
        }
    }
}

/// 违反的边界
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    BelowMin,
    AboveMax,
    /// NaN 或无穷
    NotFinite,
}

/// 校验失败：哪个参数、违反了哪个边界
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{parameter} {value:.3} is below minimum {limit:.3}")]
    BelowMin {
        parameter: Parameter,
        value: f64,
        limit: f64,
    },

    #[error("{parameter} {value:.3} is above maximum {limit:.3}")]
    AboveMax {
        parameter: Parameter,
        value: f64,
        limit: f64,
    },

    #[error("{parameter} {value} is not a finite number")]
    NotFinite { parameter: Parameter, value: f64 },
}

impl ValidationError {
    pub fn parameter(&self) -> Parameter {
        match self {
            Self::BelowMin { parameter, .. }
            | Self::AboveMax { parameter, .. }
            | Self::NotFinite { parameter, .. } => *parameter,
        }
    }

    pub fn bound(&self) -> Bound {
        match self {
            Self::BelowMin { .. } => Bound::BelowMin,
            Self::AboveMax { .. } => Bound::AboveMax,
            Self::NotFinite { .. } => Bound::NotFinite,
        }
    }

    /// 请求的值
    pub fn value(&self) -> f64 {
        match self {
            Self::BelowMin { value, .. }
            | Self::AboveMax { value, .. }
            | Self::NotFinite { value, .. } => *value,
        }
    }

    /// 被违反的边界值（`NotFinite` 没有）
    pub fn limit(&self) -> Option<f64> {
        match self {
            Self::BelowMin { limit, .. } | Self::AboveMax { limit, .. } => Some(*limit),
            Self::NotFinite { .. } => None,
        }
    }
}

/// 设备实时报告的外宽范围（mm）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthLimits {
    pub min: f64,
    pub max: f64,
}

impl WidthLimits {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, width: f64) -> bool {
        (self.min..=self.max).contains(&width)
    }
}

/// 校验 `value` 是否落在 `[min, max]`（含端点）
fn check_range(parameter: Parameter, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        Err(ValidationError::NotFinite { parameter, value })
    } else if value < min {
        Err(ValidationError::BelowMin {
            parameter,
            value,
            limit: min,
        })
    } else if value > max {
        Err(ValidationError::AboveMax {
            parameter,
            value,
            limit: max,
        })
    } else {
        Ok(())
    }
}

/// 命令校验器
#[derive(Debug, Clone, Copy)]
pub struct CommandValidator {
    profile: &'static GripperProfile,
}

impl CommandValidator {
    pub fn new(profile: &'static GripperProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'static GripperProfile {
        self.profile
    }

    /// 宽度是否在设备实时范围内
    pub fn check_width(&self, width: f64, limits: WidthLimits) -> Result<(), ValidationError> {
        check_range(Parameter::Width, width, limits.min, limits.max)
    }

    pub fn check_force(&self, force: f64) -> Result<(), ValidationError> {
        check_range(
            Parameter::Force,
            force,
            self.profile.force_min,
            self.profile.force_max,
        )
    }

    pub fn check_speed(&self, speed: f64) -> Result<(), ValidationError> {
        check_range(
            Parameter::Speed,
            speed,
            f64::from(self.profile.speed_min),
            f64::from(self.profile.speed_max),
        )
    }

    /// 夹取参数：依次校验宽度、夹持力、速度，返回第一个违规
    pub fn validate_grip(
        &self,
        width: f64,
        force: f64,
        speed: f64,
        limits: WidthLimits,
    ) -> Result<(), ValidationError> {
        self.check_width(width, limits)?;
        self.check_force(force)?;
        self.check_speed(speed)
    }

    /// 移动参数：只校验宽度（力与速度是固定值）
    pub fn validate_move(&self, width: f64, limits: WidthLimits) -> Result<(), ValidationError> {
        self.check_width(width, limits)
    }
}
