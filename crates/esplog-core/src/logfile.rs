//! 采集日志文件与问题日志
//!
//! - 采集日志：每次采集一个文件，`log_<YYYY-MM-DD_HH-MM-SS>.txt`
//! - 问题日志：追加写入，每行 `[YYYY-MM-DD HH:MM:SS] message`

use crate::error::LoggerError;
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// 日志文件名中的时间戳格式
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
/// 问题日志行首的时间戳格式
const ISSUE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// 同一秒内文件名冲突时的最大后缀
const MAX_NAME_SUFFIX: u32 = 1000;

/// 确保日志目录存在（幂等）
pub fn ensure_log_dir(path: impl AsRef<Path>) -> Result<(), LoggerError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// 某个时间戳对应的日志文件名
pub fn log_file_name(timestamp: &DateTime<Local>) -> String {
    format!("log_{}.txt", timestamp.format(FILE_TIMESTAMP_FORMAT))
}

/// 单次采集的日志文件
///
/// Drop 时自动关闭。
pub struct LogFile {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl LogFile {
    /// 在 `dir` 下创建新的日志文件
    ///
    /// 设备抖动时两次采集可能落在同一秒内：已存在的文件不会被截断，
    /// 而是追加数字后缀（`log_<ts>_1.txt`）。
    pub fn create(dir: impl AsRef<Path>, timestamp: &DateTime<Local>) -> Result<Self, LoggerError> {
        let dir = dir.as_ref();
        let stem = format!("log_{}", timestamp.format(FILE_TIMESTAMP_FORMAT));

        for suffix in 0..=MAX_NAME_SUFFIX {
            let name = if suffix == 0 {
                log_file_name(timestamp)
            } else {
                format!("{stem}_{suffix}.txt")
            };
            let path = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        writer: BufWriter::new(file),
                        path,
                    });
                },
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(LoggerError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free log file name for {stem} in {}", dir.display()),
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加文本并立即 flush
    pub fn append(&mut self, text: &str) -> Result<(), LoggerError> {
        if text.is_empty() {
            return Ok(());
        }
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// 问题日志
///
/// 记录采集过程中的错误，供事后排查。写入失败只输出 tracing 错误，不会向上传播。
#[derive(Debug, Clone)]
pub struct IssueLog {
    path: PathBuf,
}

impl IssueLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 以当前本地时间记录一条问题
    pub fn record(&self, message: &str) {
        self.record_at(&Local::now(), message);
    }

    /// 以指定时间记录一条问题
    pub fn record_at(&self, timestamp: &DateTime<Local>, message: &str) {
        if let Err(e) = self.append_line(timestamp, message) {
            error!(
                "Failed to write issue log {}: {} (message: {})",
                self.path.display(),
                e,
                message
            );
        }
    }

    fn append_line(&self, timestamp: &DateTime<Local>, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "[{}] {}", timestamp.format(ISSUE_TIMESTAMP_FORMAT), message)?;
        file.flush()
    }
}
