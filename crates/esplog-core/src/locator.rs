//! 设备定位
//!
//! 按 USB 厂商 ID 与制造商子串在当前端口列表中查找目标设备。

use crate::config::{LoggerConfig, VendorId};
use crate::port::{DeviceId, PortDescriptor, PortEnumerator};
use tracing::debug;

/// 设备匹配条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMatch {
    pub vendor_id: VendorId,
    pub manufacturer: String,
}

impl DeviceMatch {
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            vendor_id: config.vendor_id,
            manufacturer: config.manufacturer.clone(),
        }
    }

    /// 厂商 ID 相等且制造商字符串包含配置子串
    ///
    /// 缺少厂商 ID 或制造商字符串的端口（非 USB 端口）永不匹配。
    pub fn matches(&self, port: &PortDescriptor) -> bool {
        match (port.vendor_id, port.manufacturer.as_deref()) {
            (Some(vid), Some(manufacturer)) => {
                vid == self.vendor_id.0 && manufacturer.contains(&self.manufacturer)
            },
            _ => false,
        }
    }
}

/// 设备定位（会话控制器每个 tick 调用一次）
pub trait Locate {
    fn locate(&mut self) -> Option<DeviceId>;
}

/// 设备定位器
///
/// 无内部状态，每次调用都重新枚举。
pub struct DeviceLocator<E> {
    enumerator: E,
    criteria: DeviceMatch,
}

impl<E: PortEnumerator> DeviceLocator<E> {
    pub fn new(enumerator: E, criteria: DeviceMatch) -> Self {
        Self {
            enumerator,
            criteria,
        }
    }
}

impl<E: PortEnumerator> Locate for DeviceLocator<E> {
    /// 返回第一个匹配设备的标识
    ///
    /// 枚举失败视为本轮未找到（每个 tick 都可能发生，只记 debug 日志）。
    fn locate(&mut self) -> Option<DeviceId> {
        let ports = match self.enumerator.ports() {
            Ok(ports) => ports,
            Err(e) => {
                debug!("Port enumeration failed, treating as not found: {}", e);
                return None;
            },
        };

        ports.into_iter().find(|port| self.criteria.matches(port)).map(|port| port.device)
    }
}
