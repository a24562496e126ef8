//! 下载结果的本地保存
//!
//! 保存是一次有作用域的资源获取：先写入临时的 `.<name>.part` 文件，
//! 成功后重命名为最终文件名。临时文件由 [`PartFile`] 守卫持有，
//! 无论写入成功还是中途出错，守卫在离开作用域时只释放一次。

use log::{debug, info, warn};

use crate::transfer::DownloadResult;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 保存下载文件的能力
pub trait FileSaver: Send + Sync {
    /// 保存文件，返回最终路径
    fn save(&self, result: &DownloadResult) -> io::Result<PathBuf>;
}

/// 保存到指定目录，不覆盖已有文件
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 找到一个不存在的目标路径: `name.ext`, `name (1).ext`, `name (2).ext` ...
    fn available_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match file_name.rfind('.') {
            Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx..]),
            _ => (file_name, ""),
        };

        (1u32..)
            .map(|n| self.dir.join(format!("{} ({}){}", stem, n, ext)))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, result: &DownloadResult) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let target = self.available_path(&result.suggested_file_name);
        let part = PartFile::create(self.dir.join(format!(".{}.part", result.suggested_file_name)))?;

        part.write(&result.content)?;
        part.commit(&target)?;

        info!(
            "Saved {} ({} bytes, {})",
            target.display(),
            result.content.len(),
            result.mime_type
        );
        Ok(target)
    }
}

/// 临时文件守卫
///
/// 未提交时在 Drop 中删除临时文件。
struct PartFile {
    path: PathBuf,
    file: Option<fs::File>,
    committed: bool,
}

impl PartFile {
    fn create(path: PathBuf) -> io::Result<Self> {
        let file = fs::File::create(&path)?;
        debug!("Created temporary file {:?}", path);
        Ok(Self {
            path,
            file: Some(file),
            committed: false,
        })
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut file = self
            .file
            .as_ref()
            .ok_or_else(|| io::Error::other("temporary file already closed"))?;
        file.write_all(data)?;
        file.sync_all()
    }

    /// 关闭并重命名为目标文件
    fn commit(mut self, target: &Path) -> io::Result<()> {
        // 先关闭句柄再重命名
        drop(self.file.take());
        fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove temporary file {:?}: {}", self.path, e);
            } else {
                debug!("Removed temporary file {:?}", self.path);
            }
        }
    }
}
