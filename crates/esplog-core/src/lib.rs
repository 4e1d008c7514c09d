//! # esplog core
//!
//! USB 串口设备记录器核心库：持续监视指定的 USB 串口设备，把设备输出写入
//! 带时间戳的日志文件，并通过宽限期吸收短暂断开，保持"会话"的连续性。
//!
//! ## 模块
//!
//! - `config` - 固定常量配置（可由 TOML 覆盖）
//! - `port` - 端口枚举与串口通道协作者（`serialport` 实现）
//! - `locator` - 设备定位（厂商 ID + 制造商子串）
//! - `session` - 会话连续性状态机（纯函数）
//! - `capture` - 阻塞的采集循环与最终读取窗口
//! - `logfile` - 采集日志文件与问题日志
//! - `decode` - 容错的流式 UTF-8 解码
//! - `controller` - 会话控制器（轮询 + 驱动采集）
//!
//! ## 使用示例
//!
//! ```no_run
//! use esplog_core::{
//!     CaptureLoop, CaptureSettings, DeviceLocator, DeviceMatch, IssueLog, LoggerConfig,
//!     SessionController, SystemSerial,
//! };
//!
//! let config = LoggerConfig::default();
//! let locator = DeviceLocator::new(SystemSerial::new(), DeviceMatch::from_config(&config));
//! let capture = CaptureLoop::new(
//!     SystemSerial::new(),
//!     CaptureSettings::from_config(&config),
//!     IssueLog::new(&config.issue_log),
//! );
//! let mut controller =
//!     SessionController::new(locator, capture, config.grace_period, config.poll_interval);
//! controller.run();
//! ```

pub mod capture;
pub mod config;
pub mod controller;
pub mod decode;
mod error;
pub mod locator;
pub mod logfile;
pub mod port;
pub mod session;

pub use capture::{Capture, CaptureLoop, CaptureOutcome, CaptureReport, CaptureSettings};
pub use config::{LoggerConfig, VendorId};
pub use controller::SessionController;
pub use decode::LossyDecoder;
pub use error::LoggerError;
pub use locator::{DeviceLocator, DeviceMatch, Locate};
pub use logfile::{IssueLog, LogFile, ensure_log_dir};
pub use port::{ChannelOpener, DeviceId, PortDescriptor, PortEnumerator, SerialChannel, SystemSerial};
pub use session::{Session, SessionState, Transition};
