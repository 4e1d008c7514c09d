//! 采集循环
//!
//! 一次采集调用：打开串口和新的日志文件，设备在场时持续读取并写入；
//! 检测到设备从操作系统层面消失后，进入有界的最终读取窗口，把缓冲区中
//! 残留的字节写完后返回。
//!
//! **阻塞语义**：`capture()` 只在设备消失且读取窗口结束（或发生 IO 错误）后返回。
//! 任何 IO 错误都在调用边界被捕获并写入问题日志，不会向上传播。

use crate::config::LoggerConfig;
use crate::decode::LossyDecoder;
use crate::error::LoggerError;
use crate::logfile::{IssueLog, LogFile};
use crate::port::{ChannelOpener, DeviceId, SerialChannel};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// 采集调用（会话控制器通过此 trait 驱动采集）
pub trait Capture {
    /// 阻塞直到设备消失且最终读取窗口结束
    fn capture(&mut self, device: &DeviceId) -> CaptureReport;
}

/// 采集结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// 设备断开，最终读取窗口已结束
    Disconnected,
    /// IO 错误（已写入问题日志）
    Failed(String),
}

/// 单次采集的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// 本次采集的日志文件（打开失败时为 `None`）
    pub log_path: Option<PathBuf>,
    /// 从设备收到的字节数
    pub bytes_received: u64,
    pub outcome: CaptureOutcome,
}

impl CaptureReport {
    fn new() -> Self {
        Self {
            log_path: None,
            bytes_received: 0,
            outcome: CaptureOutcome::Disconnected,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CaptureOutcome::Failed(_))
    }
}

/// 采集循环参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub log_dir: PathBuf,
    pub baud_rate: u32,
    /// 读取间隔
    pub read_interval: Duration,
    /// 断开后的最终读取窗口
    pub flush_window: Duration,
}

impl CaptureSettings {
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            log_dir: config.log_dir.clone(),
            baud_rate: config.baud_rate,
            read_interval: config.read_interval,
            flush_window: config.flush_window,
        }
    }
}

/// 采集循环
pub struct CaptureLoop<O> {
    opener: O,
    settings: CaptureSettings,
    issues: IssueLog,
}

impl<O: ChannelOpener> CaptureLoop<O> {
    pub fn new(opener: O, settings: CaptureSettings, issues: IssueLog) -> Self {
        Self {
            opener,
            settings,
            issues,
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// 执行一次采集调用
    ///
    /// 串口和日志文件在 `run_invocation` 内部创建，任何退出路径上都随作用域释放。
    pub fn run(&mut self, device: &DeviceId) -> CaptureReport {
        let mut report = CaptureReport::new();

        if let Err(e) = self.run_invocation(device, &mut report) {
            let message = format!("Error during logging session: {}", e);
            self.issues.record(&message);
            error!("{}", message);
            report.outcome = CaptureOutcome::Failed(e.to_string());
        }

        report
    }

    fn run_invocation(
        &mut self,
        device: &DeviceId,
        report: &mut CaptureReport,
    ) -> Result<(), LoggerError> {
        // 先打开串口：打开失败时不留下空日志文件
        let mut channel = self.opener.open(device, self.settings.baud_rate)?;
        let mut log = LogFile::create(&self.settings.log_dir, &Local::now())?;
        report.log_path = Some(log.path().to_path_buf());
        info!("Logging to {}", log.path().display());

        let mut decoder = LossyDecoder::new();

        // 1. 设备在场：持续读取
        while self.opener.exists(device) {
            Self::drain_into(&mut channel, &mut decoder, &mut log, report)?;
            thread::sleep(self.settings.read_interval);
        }

        // 2. 设备消失：有界的最终读取窗口（第一次读取发生在检测到消失的瞬间）
        info!("Device disconnected. Continuing to read for final data...");
        let disconnected_at = Instant::now();
        while disconnected_at.elapsed() < self.settings.flush_window {
            Self::drain_into(&mut channel, &mut decoder, &mut log, report)?;
            thread::sleep(self.settings.read_interval);
        }

        log.append(&decoder.finish())?;
        info!("Final read window expired. Closing logging session.");
        Ok(())
    }

    fn drain_into(
        channel: &mut O::Channel,
        decoder: &mut LossyDecoder,
        log: &mut LogFile,
        report: &mut CaptureReport,
    ) -> Result<(), LoggerError> {
        let bytes = channel.drain()?;
        if bytes.is_empty() {
            return Ok(());
        }

        report.bytes_received += bytes.len() as u64;
        log.append(&decoder.decode(&bytes))
    }
}

impl<O: ChannelOpener> Capture for CaptureLoop<O> {
    fn capture(&mut self, device: &DeviceId) -> CaptureReport {
        self.run(device)
    }
}

/// 日志文件的显示名（用于状态输出）
pub(crate) fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_else(|| "<none>".to_string())
}
