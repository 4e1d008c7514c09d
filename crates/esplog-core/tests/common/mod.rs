//! 集成测试用的模拟设备
//!
//! 一个共享状态同时充当端口枚举器和串口通道协作者。

#![allow(dead_code)]

use esplog_core::{
    ChannelOpener, DeviceId, LoggerError, PortDescriptor, PortEnumerator, SerialChannel,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub const DEVICE_PATH: &str = "/dev/ttyACM0";

#[derive(Default)]
struct DeviceState {
    /// 是否出现在端口枚举结果中
    listed: bool,
    vendor_id: u16,
    manufacturer: String,
    /// 采集中剩余的"仍在场"检查次数
    present_checks: usize,
    /// 设备缓冲区
    buffer: VecDeque<u8>,
    /// 设备消失瞬间缓冲区中的字节
    at_unplug: Vec<u8>,
    /// 每次读取额外到达的数据块
    feed: VecDeque<Vec<u8>>,
    /// 首次检测到消失的时刻
    unplugged_at: Option<Instant>,
    /// 非空读取的时刻与字节数
    reads: Vec<(Instant, usize)>,
    opens: usize,
    open_channels: usize,
    max_open_channels: usize,
}

/// 模拟的 ESP32 USB 串口设备
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl MockDevice {
    /// Espressif 设备（厂商 ID 0x303a）
    pub fn espressif() -> Self {
        Self::with_identity(0x303a, "Espressif Systems")
    }

    pub fn with_identity(vendor_id: u16, manufacturer: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                vendor_id,
                manufacturer: manufacturer.to_string(),
                ..Default::default()
            })),
        }
    }

    pub fn enumerator(&self) -> MockPorts {
        MockPorts(self.clone())
    }

    pub fn opener(&self) -> MockOpener {
        MockOpener(self.clone())
    }

    pub fn set_listed(&self, listed: bool) {
        self.state.lock().unwrap().listed = listed;
    }

    /// 下一次采集中设备在场的检查次数（之后消失）
    pub fn set_present_checks(&self, checks: usize) {
        let mut state = self.state.lock().unwrap();
        state.present_checks = checks;
        state.unplugged_at = None;
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state.lock().unwrap().buffer.extend(bytes);
    }

    /// 设备消失瞬间缓冲区中的字节
    pub fn buffer_at_unplug(&self, bytes: &[u8]) {
        self.state.lock().unwrap().at_unplug = bytes.to_vec();
    }

    /// 每次读取时追加到达一个数据块
    pub fn feed_chunks(&self, chunks: impl IntoIterator<Item = Vec<u8>>) {
        self.state.lock().unwrap().feed.extend(chunks);
    }

    pub fn unplugged_at(&self) -> Option<Instant> {
        self.state.lock().unwrap().unplugged_at
    }

    pub fn reads(&self) -> Vec<(Instant, usize)> {
        self.state.lock().unwrap().reads.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn max_open_channels(&self) -> usize {
        self.state.lock().unwrap().max_open_channels
    }

    pub fn open_channels(&self) -> usize {
        self.state.lock().unwrap().open_channels
    }
}

pub struct MockPorts(MockDevice);

impl PortEnumerator for MockPorts {
    fn ports(&mut self) -> Result<Vec<PortDescriptor>, LoggerError> {
        let state = self.0.state.lock().unwrap();
        let mut ports = vec![PortDescriptor {
            device: DeviceId::new("/dev/ttyS0"),
            vendor_id: None,
            manufacturer: None,
        }];
        if state.listed {
            ports.push(PortDescriptor {
                device: DeviceId::new(DEVICE_PATH),
                vendor_id: Some(state.vendor_id),
                manufacturer: Some(state.manufacturer.clone()),
            });
        }
        Ok(ports)
    }
}

pub struct MockOpener(MockDevice);

impl ChannelOpener for MockOpener {
    type Channel = MockChannel;

    fn open(&mut self, device: &DeviceId, _baud_rate: u32) -> Result<MockChannel, LoggerError> {
        assert_eq!(device.as_str(), DEVICE_PATH);
        let mut state = self.0.state.lock().unwrap();
        state.opens += 1;
        state.open_channels += 1;
        state.max_open_channels = state.max_open_channels.max(state.open_channels);
        Ok(MockChannel(self.0.clone()))
    }

    fn exists(&mut self, _device: &DeviceId) -> bool {
        let mut state = self.0.state.lock().unwrap();
        if state.present_checks > 0 {
            state.present_checks -= 1;
            return true;
        }
        if state.unplugged_at.is_none() {
            state.unplugged_at = Some(Instant::now());
            let residual = std::mem::take(&mut state.at_unplug);
            state.buffer.extend(residual);
        }
        false
    }
}

pub struct MockChannel(MockDevice);

impl SerialChannel for MockChannel {
    fn drain(&mut self) -> Result<Vec<u8>, LoggerError> {
        let mut state = self.0.state.lock().unwrap();
        if let Some(chunk) = state.feed.pop_front() {
            state.buffer.extend(chunk);
        }
        let bytes: Vec<u8> = state.buffer.drain(..).collect();
        if !bytes.is_empty() {
            state.reads.push((Instant::now(), bytes.len()));
        }
        Ok(bytes)
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        self.0.state.lock().unwrap().open_channels -= 1;
    }
}

/// 目录中所有采集日志文件（按文件名排序）
pub fn log_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("log_") && n.ends_with(".txt"))
        })
        .collect();
    files.sort();
    files
}
