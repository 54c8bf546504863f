//! 夹爪参数表
//!
//! 每种夹爪型号的力/速度范围与默认宽度。进程内只读，所有同型号实例共享。
//! 宽度的物理上下限因单台设备而异，不在此表中，需要运行时通过 RPC 查询。

/// 默认型号
pub const DEFAULT_GRIPPER_TYPE: &str = "twofg7";

/// 单个型号的调参边界
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GripperProfile {
    /// 型号键（小写）
    pub key: &'static str,
    /// 展示名
    pub display_name: &'static str,
    /// 最小夹持力（N）
    pub force_min: f64,
    /// 最大夹持力（N）
    pub force_max: f64,
    /// 默认夹持力（N）
    pub force_default: f64,
    /// 最小速度（%）
    pub speed_min: u32,
    /// 最大速度（%）
    pub speed_max: u32,
    /// 默认速度（%）
    pub speed_default: u32,
    /// 默认张开宽度（mm）
    pub open_width_default: f64,
    /// 默认闭合宽度（mm）
    pub close_width_default: f64,
    /// 标定宽度（mm）
    pub calibration_width: f64,
}

impl GripperProfile {
    /// 夹持力是否在范围内（含端点）
    pub fn force_in_range(&self, force: f64) -> bool {
        (self.force_min..=self.force_max).contains(&force)
    }

    /// 速度是否在范围内（含端点）
    pub fn speed_in_range(&self, speed: u32) -> bool {
        (self.speed_min..=self.speed_max).contains(&speed)
    }
}

static PROFILES: [GripperProfile; 1] = [GripperProfile {
    key: "twofg7",
    display_name: "OnRobot 2FG7",
    force_min: 20.0,
    force_max: 140.0,
    force_default: 20.0,
    speed_min: 10,
    speed_max: 100,
    speed_default: 10,
    open_width_default: 25.0,
    close_width_default: 5.0,
    calibration_width: 5.0,
}];

fn default_profile() -> &'static GripperProfile {
    &PROFILES[0]
}

/// 按型号键查找参数表
///
/// 键不区分大小写；空键或未知键回退到 [`DEFAULT_GRIPPER_TYPE`]。
pub fn gripper_profile(key: Option<&str>) -> &'static GripperProfile {
    let normalized = key.unwrap_or_default().trim().to_lowercase();
    PROFILES
        .iter()
        .find(|profile| profile.key == normalized)
        .unwrap_or_else(default_profile)
}

/// 全部型号（按键排序，顺序稳定）
pub fn available_gripper_profiles() -> impl Iterator<Item = &'static GripperProfile> {
    let mut profiles: Vec<&'static GripperProfile> = PROFILES.iter().collect();
    profiles.sort_by_key(|profile| profile.key);
    profiles.into_iter()
}

/// 下拉选择框用的 `(value, label)` 列表
pub fn gripper_profile_options() -> Vec<(&'static str, &'static str)> {
    available_gripper_profiles()
        .map(|profile| (profile.key, profile.display_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twofg7_profile() {
        let profile = gripper_profile(Some("twofg7"));
        assert_eq!(profile.display_name, "OnRobot 2FG7");
        assert_eq!(profile.force_min, 20.0);
        assert_eq!(profile.force_max, 140.0);
        assert_eq!(profile.speed_min, 10);
        assert_eq!(profile.speed_max, 100);
        assert_eq!(profile.open_width_default, 25.0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(gripper_profile(Some("TwoFG7")).key, "twofg7");
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        assert_eq!(gripper_profile(Some("rg2")).key, DEFAULT_GRIPPER_TYPE);
        assert_eq!(gripper_profile(Some("")).key, DEFAULT_GRIPPER_TYPE);
        assert_eq!(gripper_profile(None).key, DEFAULT_GRIPPER_TYPE);
    }

    #[test]
    fn test_profile_options() {
        let options = gripper_profile_options();
        assert_eq!(options, vec![("twofg7", "OnRobot 2FG7")]);
    }

    #[test]
    fn test_range_checks_are_inclusive() {
        let profile = gripper_profile(None);
        assert!(profile.force_in_range(20.0));
        assert!(profile.force_in_range(140.0));
        assert!(!profile.force_in_range(140.5));
        assert!(!profile.force_in_range(f64::NAN));
        assert!(profile.speed_in_range(10));
        assert!(!profile.speed_in_range(9));
        assert!(!profile.speed_in_range(101));
    }
}
