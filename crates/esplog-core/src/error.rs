//! 错误类型定义

use thiserror::Error;

/// esplog 统一错误类型
#[derive(Error, Debug)]
pub enum LoggerError {
    /// 文件系统 IO 错误（日志文件、问题日志、目录）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 串口错误（打开、读取、查询缓冲区）
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// 端口枚举失败（视为本轮未找到设备）
    #[error("Port enumeration failed: {0}")]
    Enumerate(String),

    /// 无效的 USB 厂商 ID（必须是 16 位十六进制）
    #[error("Invalid vendor id {0:?}: expected 16-bit hex such as 303a")]
    InvalidVendorId(String),

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// 配置值无效
    #[error("Invalid config: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::LoggerError;

    #[test]
    fn test_logger_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LoggerError = io_err.into();

        match err {
            LoggerError::Io(_) => {},
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_logger_error_display() {
        let err1 = LoggerError::InvalidVendorId("xyz".to_string());
        assert!(err1.to_string().contains("Invalid vendor id"));
        assert!(err1.to_string().contains("xyz"));

        let err2 = LoggerError::Enumerate("libudev failure".to_string());
        assert!(err2.to_string().contains("enumeration"));
        assert!(err2.to_string().contains("libudev failure"));

        let err3 = LoggerError::Config("baud_rate must be non-zero".to_string());
        assert!(err3.to_string().contains("Invalid config"));
    }
}
