//! 手指朝向
//!
//! 不同固件版本对 `twofg_finger_orientation_outward` 的返回值不统一：
//! 可能是布尔值、数值代码（1 = 向内，2 = 向外），也可能是文本标签。
//! 这里把它们统一归一化为 [`FingerOrientation`]。

use std::fmt;

/// 归一化后的手指朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerOrientation {
    Outward,
    Inward,
    Unknown,
}

impl FingerOrientation {
    /// 由"是否向外"构造
    pub fn from_outward(outward: bool) -> Self {
        if outward { Self::Outward } else { Self::Inward }
    }

    /// `Outward → Some(true)`，`Inward → Some(false)`，`Unknown → None`
    pub fn as_outward(self) -> Option<bool> {
        match self {
            Self::Outward => Some(true),
            Self::Inward => Some(false),
            Self::Unknown => None,
        }
    }

    /// 人类可读标签（未知时为 `None`）
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Outward => Some("outward"),
            Self::Inward => Some("inward"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for FingerOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("unknown"))
    }
}

/// 朝向的原始形式（设备返回值或调用方输入）
#[derive(Debug, Clone, PartialEq)]
pub enum OrientationValue {
    Bool(bool),
    Number(f64),
    Label(String),
}

impl OrientationValue {
    /// 归一化
    ///
    /// - 文本：去空白、转小写后匹配 `outward/out/outside` 与 `inward/in/inside`
    /// - 数值：向零取整；负数为未知，`2` 为向外，`1` 为向内，其余按非零即向外处理
    pub fn normalize(&self) -> FingerOrientation {
        match self {
            Self::Bool(outward) => FingerOrientation::from_outward(*outward),
            Self::Label(label) => match label.trim().to_lowercase().as_str() {
                "outward" | "out" | "outside" => FingerOrientation::Outward,
                "inward" | "in" | "inside" => FingerOrientation::Inward,
                _ => FingerOrientation::Unknown,
            },
            Self::Number(value) => {
                if !value.is_finite() {
                    return FingerOrientation::Unknown;
                }
                match value.trunc() as i64 {
                    v if v < 0 => FingerOrientation::Unknown,
                    2 => FingerOrientation::Outward,
                    1 => FingerOrientation::Inward,
                    v => FingerOrientation::from_outward(v != 0),
                }
            },
        }
    }
}

impl From<bool> for OrientationValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for OrientationValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<f64> for OrientationValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OrientationValue {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}

impl From<String> for OrientationValue {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

impl From<FingerOrientation> for OrientationValue {
    fn from(value: FingerOrientation) -> Self {
        match value {
            FingerOrientation::Outward => Self::Bool(true),
            FingerOrientation::Inward => Self::Bool(false),
            FingerOrientation::Unknown => Self::Number(-1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_label_normalization() {
        for label in ["outward", "out", "outside", "  OutWard ", "OUT"] {
            assert_eq!(
                OrientationValue::from(label).normalize(),
                FingerOrientation::Outward,
                "label: {label:?}"
            );
        }
        for label in ["inward", "in", "inside", "Inside\n"] {
            assert_eq!(
                OrientationValue::from(label).normalize(),
                FingerOrientation::Inward,
                "label: {label:?}"
            );
        }
        assert_eq!(
            OrientationValue::from("sideways").normalize(),
            FingerOrientation::Unknown
        );
    }

    #[test]
    fn test_numeric_normalization() {
        assert_eq!(OrientationValue::from(2).normalize(), FingerOrientation::Outward);
        assert_eq!(OrientationValue::from(1).normalize(), FingerOrientation::Inward);
        assert_eq!(OrientationValue::from(0).normalize(), FingerOrientation::Inward);
        assert_eq!(OrientationValue::from(5).normalize(), FingerOrientation::Outward);
        assert_eq!(OrientationValue::from(-1).normalize(), FingerOrientation::Unknown);
        // 向零取整
        assert_eq!(OrientationValue::from(2.7).normalize(), FingerOrientation::Outward);
        assert_eq!(OrientationValue::from(-0.5).normalize(), FingerOrientation::Inward);
        assert_eq!(
            OrientationValue::from(f64::NAN).normalize(),
            FingerOrientation::Unknown
        );
    }

    #[test]
    fn test_bool_normalization() {
        assert_eq!(OrientationValue::from(true).normalize(), FingerOrientation::Outward);
        assert_eq!(OrientationValue::from(false).normalize(), FingerOrientation::Inward);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FingerOrientation::Outward.label(), Some("outward"));
        assert_eq!(FingerOrientation::Inward.label(), Some("inward"));
        assert_eq!(FingerOrientation::Unknown.label(), None);
        assert_eq!(FingerOrientation::Unknown.as_outward(), None);
    }

    proptest! {
        #[test]
        fn prop_negative_numbers_are_unknown(value in -1.0e9f64..=-1.0) {
            prop_assert_eq!(OrientationValue::from(value).normalize(), FingerOrientation::Unknown);
        }

        #[test]
        fn prop_normalized_orientation_roundtrips(outward in any::<bool>()) {
            let orientation = OrientationValue::from(outward).normalize();
            prop_assert_eq!(orientation.as_outward(), Some(outward));
            prop_assert_eq!(OrientationValue::from(orientation).normalize(), orientation);
        }
    }
}
