//! 单实例文件锁
//!
//! 同一个日志目录只允许一个记录器进程：两个进程会争抢同一个串口设备，
//! 并向同一目录写入同名日志文件。锁文件放在日志目录中，内容为持有者 PID。

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// 日志目录中的锁文件名
pub const LOCK_FILE_NAME: &str = ".esplog.lock";

/// 单实例文件锁
///
/// 进程崩溃时操作系统自动释放锁。
pub struct SingletonLock {
    file: File,
    path: PathBuf,
}

impl SingletonLock {
    /// 在日志目录中获取锁
    pub fn acquire_in(log_dir: impl AsRef<Path>) -> Result<Self, io::Error> {
        Self::try_lock(log_dir.as_ref().join(LOCK_FILE_NAME))
    }

    /// 尝试获取排他锁（非阻塞）
    ///
    /// # 返回
    /// - `Ok(Self)`: 成功获取锁
    /// - `Err`: 锁已被其他进程持有（`AlreadyExists`），或文件操作失败
    pub fn try_lock(lock_path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let path = lock_path.as_ref();

        // 拿到锁之前不能截断，文件里可能是持有者的 PID
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .read(true)
            .open(path)?;

        if !file.try_lock_exclusive()? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("another esplog instance holds {}", path.display()),
            ));
        }

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(&file, "{}", std::process::id())?;
        file.sync_all()?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
