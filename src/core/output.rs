use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

/// 产物的写入目标
///
/// 路径都是相对于输出根目录、以 `/` 分隔的字符串。
pub trait Output {
    /// 写入字节内容
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()>;

    /// 原样复制一个文件
    fn copy(&mut self, from: &Path, path: &str) -> Result<()>;
}

/// 拒绝会离开输出根目录的路径
fn check_relative(path: &str) -> Result<()> {
    if path.starts_with('/') || path.contains('\\') || path.split('/').any(|part| part == "..") {
        return Err(anyhow!("输出路径不能离开输出目录: {}", path));
    }
    Ok(())
}

/// 写到磁盘上的输出目录
pub struct FsOutput {
    root: PathBuf,
}

impl FsOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target(&self, path: &str) -> Result<PathBuf> {
        check_relative(path)?;
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建目录失败: {}", parent.display()))?;
        }
        Ok(target)
    }
}

impl Output for FsOutput {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.target(path)?;
        fs::write(&target, bytes).with_context(|| format!("写入文件失败: {}", target.display()))?;
        Ok(())
    }

    fn copy(&mut self, from: &Path, path: &str) -> Result<()> {
        let target = self.target(path)?;
        fs::copy(from, &target).with_context(|| {
            format!("复制文件失败: {} -> {}", from.display(), target.display())
        })?;
        Ok(())
    }
}

/// 内存中的输出，复制的文件记录为其源路径的内容
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pub files: BTreeMap<String, Vec<u8>>,
    /// 写入顺序
    pub order: Vec<String>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path).map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl Output for MemoryOutput {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        check_relative(path)?;
        self.order.push(path.to_string());
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn copy(&mut self, from: &Path, path: &str) -> Result<()> {
        let bytes = fs::read(from).with_context(|| format!("读取文件失败: {}", from.display()))?;
        self.write(path, &bytes)
    }
}
