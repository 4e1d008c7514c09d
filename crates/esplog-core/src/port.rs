//! 串口协作者抽象
//!
//! 端口枚举与串口通道都通过 trait 注入，生产环境使用 [`SystemSerial`]
//! （基于 `serialport`），测试中使用内存 mock。

use crate::error::LoggerError;
use serialport::{SerialPort, SerialPortType};
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// 串口读取超时
///
/// 只读取 `bytes_to_read()` 报告的字节数，正常情况下不会阻塞到超时。
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// 设备标识（操作系统设备路径，如 `/dev/ttyACM0` 或 `COM3`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 枚举得到的端口描述
///
/// 非 USB 端口没有厂商 ID 和制造商字符串。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub device: DeviceId,
    pub vendor_id: Option<u16>,
    pub manufacturer: Option<String>,
}

/// 端口枚举协作者
pub trait PortEnumerator {
    /// 列出当前可见的所有串口设备
    fn ports(&mut self) -> Result<Vec<PortDescriptor>, LoggerError>;
}

/// 已打开的串口通道
pub trait SerialChannel {
    /// 读出当前缓冲区中的全部字节（无数据时返回空）
    fn drain(&mut self) -> Result<Vec<u8>, LoggerError>;
}

/// 串口通道协作者
pub trait ChannelOpener {
    type Channel: SerialChannel;

    /// 以指定波特率打开设备
    fn open(&mut self, device: &DeviceId, baud_rate: u32) -> Result<Self::Channel, LoggerError>;

    /// 设备是否仍在操作系统层面存在
    fn exists(&mut self, device: &DeviceId) -> bool;
}

/// 基于 `serialport` 的系统实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerial;

impl SystemSerial {
    pub fn new() -> Self {
        Self
    }
}

impl PortEnumerator for SystemSerial {
    fn ports(&mut self) -> Result<Vec<PortDescriptor>, LoggerError> {
        let ports =
            serialport::available_ports().map_err(|e| LoggerError::Enumerate(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|port| {
                let (vendor_id, manufacturer) = match port.port_type {
                    SerialPortType::UsbPort(info) => (Some(info.vid), info.manufacturer),
                    _ => (None, None),
                };
                PortDescriptor {
                    device: DeviceId::new(port.port_name),
                    vendor_id,
                    manufacturer,
                }
            })
            .collect())
    }
}

impl ChannelOpener for SystemSerial {
    type Channel = Box<dyn SerialPort>;

    fn open(&mut self, device: &DeviceId, baud_rate: u32) -> Result<Self::Channel, LoggerError> {
        let port = serialport::new(device.as_str(), baud_rate).timeout(READ_TIMEOUT).open()?;
        Ok(port)
    }

    #[cfg(unix)]
    fn exists(&mut self, device: &DeviceId) -> bool {
        std::path::Path::new(device.as_str()).exists()
    }

    // Windows 的 COM 口不是文件路径，改为检查枚举结果
    #[cfg(not(unix))]
    fn exists(&mut self, device: &DeviceId) -> bool {
        serialport::available_ports()
            .map(|ports| ports.iter().any(|p| p.port_name == device.as_str()))
            .unwrap_or(false)
    }
}

impl SerialChannel for Box<dyn SerialPort> {
    fn drain(&mut self) -> Result<Vec<u8>, LoggerError> {
        let available = self.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; available];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
}
