//! 状态缓存
//!
//! 保存事件通道推送的最新一份完整状态（整体替换，不做合并）及其到达时间。
//!
//! # 同步机制
//!
//! `ArcSwapOption`：写端（事件通道线程）原子替换整个快照，读端无锁读取。
//! 与 [`RpcDispatcher`](crate::RpcDispatcher) 的锁完全独立，状态更新不会被
//! 进行中的命令阻塞，反之亦然。
//!
//! # 读取语义
//!
//! 所有读取接口都返回拷贝，调用方无法修改缓存内部状态。

use arc_swap::ArcSwapOption;
use onrobot_protocol::DeviceSlot;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 状态载荷中的设备列表键
pub const DEVICES_KEY: &str = "devices";

/// JSON 对象
pub type JsonMap = Map<String, Value>;

/// 一次推送的完整状态
///
/// 载荷形如 `{ "devices": [ { "deviceId": 0, "productCode": 192, "variable": {...} }, ... ] }`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// 原始载荷（保证包含 `devices` 键）
    pub payload: JsonMap,
    /// 到达时间
    pub received_at: SystemTime,
}

impl StatusSnapshot {
    /// 校验并构造快照
    ///
    /// 只有包含 `devices` 键的 JSON 对象才是状态载荷，其它一律返回 `None`。
    pub fn from_payload(payload: Value) -> Option<Self> {
        match payload {
            Value::Object(map) if map.contains_key(DEVICES_KEY) => Some(Self {
                payload: map,
                received_at: SystemTime::now(),
            }),
            _ => None,
        }
    }

    /// 设备条目（载荷中的顺序）
    pub fn devices(&self) -> &[Value] {
        self.payload
            .get(DEVICES_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 查找设备的变量块
    ///
    /// 按载荷顺序扫描，返回第一个 `deviceId` 匹配（且在给出产品码时 `productCode`
    /// 也匹配）、`variable` 为对象的条目。
    pub fn device_variable(&self, slot: DeviceSlot, product_code: Option<u32>) -> Option<JsonMap> {
        self.devices().iter().find_map(|device| {
            if !json_int_eq(device.get("deviceId"), i64::from(slot.index())) {
                return None;
            }
            if let Some(code) = product_code {
                if !json_int_eq(device.get("productCode"), i64::from(code)) {
                    return None;
                }
            }
            device.get("variable").and_then(Value::as_object).cloned()
        })
    }

    /// 到达时间（UNIX 秒）
    pub fn timestamp_secs(&self) -> f64 {
        self.received_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// 整数或整值浮点都视为相等（固件有时把 ID 编成浮点）
fn json_int_eq(value: Option<&Value>, expected: i64) -> bool {
    match value {
        Some(Value::Number(n)) => {
            n.as_i64() == Some(expected) || n.as_f64() == Some(expected as f64)
        },
        _ => false,
    }
}

/// 线程安全的最新状态缓存
#[derive(Debug, Default)]
pub struct StatusCache {
    latest: ArcSwapOption<StatusSnapshot>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试用新载荷替换缓存
    ///
    /// 返回 `true` 表示已替换；非状态载荷被静默丢弃（不是错误），缓存保持不变。
    pub fn update(&self, payload: Value) -> bool {
        match StatusSnapshot::from_payload(payload) {
            Some(snapshot) => {
                self.store(snapshot);
                true
            },
            None => false,
        }
    }

    /// 整体替换快照，返回存入的共享引用
    pub fn store(&self, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.latest.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// 最新快照（拷贝）
    pub fn snapshot(&self) -> Option<StatusSnapshot> {
        self.latest.load().as_deref().cloned()
    }

    /// 最新载荷（拷贝）；尚未收到任何状态时为空对象
    pub fn latest_payload(&self) -> JsonMap {
        self.latest
            .load()
            .as_ref()
            .map(|snapshot| snapshot.payload.clone())
            .unwrap_or_default()
    }

    /// 最新载荷的到达时间
    pub fn latest_timestamp(&self) -> Option<SystemTime> {
        self.latest.load().as_ref().map(|snapshot| snapshot.received_at)
    }

    /// 按槽位（及可选产品码）提取设备变量块
    pub fn get_device_variable(
        &self,
        slot: DeviceSlot,
        product_code: Option<u32>,
    ) -> Option<JsonMap> {
        self.latest
            .load()
            .as_ref()
            .and_then(|snapshot| snapshot.device_variable(slot, product_code))
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.latest.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onrobot_protocol::TWOFG_PRODUCT_CODE;
    use serde_json::json;

    fn payload_w5() -> Value {
        json!({
            "devices": [
                { "deviceId": 0, "productCode": 192, "variable": { "w": 5 } }
            ]
        })
    }

    #[test]
    fn test_device_variable_lookup() {
        let cache = StatusCache::new();
        assert!(cache.update(payload_w5()));

        assert_eq!(
            cache.get_device_variable(DeviceSlot::Single, Some(TWOFG_PRODUCT_CODE)),
            Some(json!({ "w": 5 }).as_object().unwrap().clone())
        );
        assert_eq!(
            cache.get_device_variable(DeviceSlot::DualPrimary, Some(TWOFG_PRODUCT_CODE)),
            None
        );
        // 不指定产品码时只按槽位匹配
        assert!(cache.get_device_variable(DeviceSlot::Single, None).is_some());
        // 产品码不匹配
        assert_eq!(cache.get_device_variable(DeviceSlot::Single, Some(0x20)), None);
    }

    #[test]
    fn test_non_status_payload_keeps_previous_snapshot() {
        let cache = StatusCache::new();
        cache.update(payload_w5());
        let before = cache.snapshot().unwrap();

        assert!(!cache.update(json!({ "other": 1 })));
        assert!(!cache.update(json!([1, 2, 3])));
        assert!(!cache.update(json!("devices")));

        assert_eq!(cache.snapshot().unwrap(), before);
    }

    #[test]
    fn test_payload_is_replaced_not_merged() {
        let cache = StatusCache::new();
        cache.update(json!({ "devices": [], "extra": true }));
        cache.update(json!({ "devices": [] }));

        let payload = cache.latest_payload();
        assert!(payload.contains_key("devices"));
        assert!(!payload.contains_key("extra"));
    }

    #[test]
    fn test_reads_are_defensive_copies() {
        let cache = StatusCache::new();
        cache.update(payload_w5());

        let mut variable = cache
            .get_device_variable(DeviceSlot::Single, Some(TWOFG_PRODUCT_CODE))
            .unwrap();
        variable.insert("w".into(), json!(99));
        let mut payload = cache.latest_payload();
        payload.clear();

        assert_eq!(
            cache.get_device_variable(DeviceSlot::Single, None).unwrap()["w"],
            json!(5)
        );
    }

    #[test]
    fn test_first_match_wins_and_non_object_variables_are_skipped() {
        let cache = StatusCache::new();
        cache.update(json!({
            "devices": [
                { "deviceId": 1, "productCode": 192, "variable": "broken" },
                { "deviceId": 1.0, "productCode": 192, "variable": { "w": 1 } },
                { "deviceId": 1, "productCode": 192, "variable": { "w": 2 } }
            ]
        }));

        let variable = cache.get_device_variable(DeviceSlot::DualPrimary, Some(192)).unwrap();
        assert_eq!(variable["w"], json!(1));
    }

    #[test]
    fn test_empty_cache() {
        let cache = StatusCache::new();
        assert!(cache.latest_payload().is_empty());
        assert!(cache.latest_timestamp().is_none());
        assert!(cache.get_device_variable(DeviceSlot::Single, None).is_none());
    }

    #[test]
    fn test_timestamp_advances() {
        let cache = StatusCache::new();
        cache.update(payload_w5());
        let first = cache.latest_timestamp().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.update(payload_w5());
        let second = cache.latest_timestamp().unwrap();
        assert!(second >= first);
        assert!(cache.snapshot().unwrap().timestamp_secs() > 0.0);

        cache.clear();
        assert!(cache.snapshot().is_none());
    }
}
