//! 记录器配置
//!
//! 所有参数都是固定常量，[`LoggerConfig::default()`] 即为默认常量集。
//! 可选地从 TOML 文件覆盖部分字段（所有键均可省略，未知键报错）。

use crate::error::LoggerError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// 默认 USB 厂商 ID（Espressif）
pub const DEFAULT_VENDOR_ID: VendorId = VendorId(0x303a);
/// 默认制造商子串
pub const DEFAULT_MANUFACTURER: &str = "Espressif";
/// 默认日志目录
pub const DEFAULT_LOG_DIR: &str = "LOGS";
/// 默认问题日志文件
pub const DEFAULT_ISSUE_LOG: &str = "data_logger_issues_log.txt";
/// 串口波特率
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// 会话控制器轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// 采集循环读取间隔
pub const DEFAULT_READ_INTERVAL: Duration = Duration::from_millis(10);
/// 会话宽限期
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
/// 断开后的最终读取窗口
pub const DEFAULT_FLUSH_WINDOW: Duration = Duration::from_secs(1);

/// USB 厂商 ID
///
/// 从十六进制文本解析，大小写不敏感，可带 `0x` 前缀（`303a`、`303A`、`0x303a`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VendorId(pub u16);

impl FromStr for VendorId {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 4 {
            return Err(LoggerError::InvalidVendorId(s.to_string()));
        }

        u16::from_str_radix(digits, 16)
            .map(VendorId)
            .map_err(|_| LoggerError::InvalidVendorId(s.to_string()))
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

/// 记录器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// 目标设备的 USB 厂商 ID
    pub vendor_id: VendorId,
    /// 制造商字符串必须包含的子串（大小写敏感）
    pub manufacturer: String,
    /// 采集日志目录
    pub log_dir: PathBuf,
    /// 问题日志文件路径
    pub issue_log: PathBuf,
    /// 串口波特率
    pub baud_rate: u32,
    /// 会话控制器轮询间隔
    pub poll_interval: Duration,
    /// 采集循环读取间隔
    pub read_interval: Duration,
    /// 会话宽限期
    pub grace_period: Duration,
    /// 断开后的最终读取窗口
    pub flush_window: Duration,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            issue_log: PathBuf::from(DEFAULT_ISSUE_LOG),
            baud_rate: DEFAULT_BAUD_RATE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_interval: DEFAULT_READ_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
            flush_window: DEFAULT_FLUSH_WINDOW,
        }
    }
}

/// TOML 文件中的可选覆盖项（时长以毫秒表示）
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    vendor_id: Option<String>,
    manufacturer: Option<String>,
    log_dir: Option<PathBuf>,
    issue_log: Option<PathBuf>,
    baud_rate: Option<u32>,
    poll_interval_ms: Option<u64>,
    read_interval_ms: Option<u64>,
    grace_period_ms: Option<u64>,
    flush_window_ms: Option<u64>,
}

impl LoggerConfig {
    /// 从 TOML 文本加载配置（未给出的字段使用默认常量）
    pub fn from_toml_str(content: &str) -> Result<Self, LoggerError> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(vendor_id) = file.vendor_id {
            config.vendor_id = vendor_id.parse()?;
        }
        if let Some(manufacturer) = file.manufacturer {
            config.manufacturer = manufacturer;
        }
        if let Some(log_dir) = file.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(issue_log) = file.issue_log {
            config.issue_log = issue_log;
        }
        if let Some(baud_rate) = file.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(ms) = file.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = file.read_interval_ms {
            config.read_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = file.grace_period_ms {
            config.grace_period = Duration::from_millis(ms);
        }
        if let Some(ms) = file.flush_window_ms {
            config.flush_window = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoggerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 校验配置
    ///
    /// 制造商子串不能为空（空串会匹配任意设备），波特率和所有间隔必须非零。
    pub fn validate(&self) -> Result<(), LoggerError> {
        if self.manufacturer.is_empty() {
            return Err(LoggerError::Config(
                "manufacturer must not be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(LoggerError::Config("baud_rate must be non-zero".to_string()));
        }

        let durations = [
            ("poll_interval", self.poll_interval),
            ("read_interval", self.read_interval),
            ("grace_period", self.grace_period),
            ("flush_window", self.flush_window),
        ];
        for (name, value) in durations {
            if value.is_zero() {
                return Err(LoggerError::Config(format!("{name} must be non-zero")));
            }
        }

        Ok(())
    }
}
