//! esplog 主入口
//!
//! 持续监视指定的 USB 串口设备（默认 Espressif，厂商 ID 303a），把设备输出写入
//! 日志目录中带时间戳的文件。不带任何参数时使用内置的固定常量。
//!
//! 进程一直运行直到被外部终止；不处理中断信号。

mod singleton;

use anyhow::{Context, Result};
use clap::Parser;
use esplog_core::{
    CaptureLoop, CaptureSettings, DeviceLocator, DeviceMatch, IssueLog, LoggerConfig,
    SessionController, SystemSerial, VendorId, ensure_log_dir,
};
use singleton::SingletonLock;
use std::path::PathBuf;
use tracing::info;

/// USB 串口设备记录器
#[derive(Parser, Debug)]
#[command(name = "esplog")]
#[command(
    about = "Capture everything a USB-serial device transmits into timestamped log files",
    long_about = None
)]
#[command(version)]
struct Args {
    /// TOML 配置文件（所有键可选，未给出的使用内置常量）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 日志目录
    ///
    /// 默认: LOGS
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// 问题日志文件
    ///
    /// 默认: data_logger_issues_log.txt
    #[arg(long)]
    issue_log: Option<PathBuf>,

    /// USB 厂商 ID（十六进制，大小写不敏感）
    ///
    /// 默认: 303a
    #[arg(long, value_parser = parse_vendor_id)]
    vendor_id: Option<VendorId>,

    /// 制造商字符串必须包含的子串
    ///
    /// 默认: Espressif
    #[arg(long)]
    manufacturer: Option<String>,
}

fn parse_vendor_id(s: &str) -> Result<VendorId, String> {
    s.parse().map_err(|e: esplog_core::LoggerError| e.to_string())
}

impl Args {
    /// 内置常量 → 配置文件 → 命令行覆盖
    fn into_config(self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => LoggerConfig::default(),
        };

        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(issue_log) = self.issue_log {
            config.issue_log = issue_log;
        }
        if let Some(vendor_id) = self.vendor_id {
            config.vendor_id = vendor_id;
        }
        if let Some(manufacturer) = self.manufacturer {
            config.manufacturer = manufacturer;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // 状态输出到 stdout，RUST_LOG 可覆盖
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("esplog=info,esplog_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stdout).init();

    let config = Args::parse().into_config()?;

    ensure_log_dir(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {}", config.log_dir.display()))?;

    let lock = SingletonLock::acquire_in(&config.log_dir).with_context(|| {
        format!(
            "Failed to acquire instance lock in {} (is another esplog running?)",
            config.log_dir.display()
        )
    })?;

    info!("esplog starting...");
    info!(
        "  Device: vendor {} / manufacturer containing {:?}",
        config.vendor_id, config.manufacturer
    );
    info!("  Log dir: {}", config.log_dir.display());
    info!("  Issue log: {}", config.issue_log.display());
    info!("  Baud rate: {}", config.baud_rate);
    info!("  Lock file: {}", lock.path().display());

    let locator = DeviceLocator::new(SystemSerial::new(), DeviceMatch::from_config(&config));
    let capture = CaptureLoop::new(
        SystemSerial::new(),
        CaptureSettings::from_config(&config),
        IssueLog::new(&config.issue_log),
    );
    let mut controller =
        SessionController::new(locator, capture, config.grace_period, config.poll_interval);

    controller.run()
}
