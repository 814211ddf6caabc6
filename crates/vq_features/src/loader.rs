//! 区域特征装载器
//!
//! 文件名约定: 前缀 + 12 位零填充图像 ID + `.tsv`。
//! 每行空白分隔, 前 10 列是几何/头部数据直接丢弃, 其余列解析为特征向量。
//! 区域顺序即文件行序。

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use vq_core::{Result, VqaError};

/// 每行开头被丢弃的几何/头部列数
const HEADER_COLUMNS: usize = 10;

/// 特征来源: 目录或 zip 归档
#[derive(Debug, Clone)]
pub enum FeatureSource {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl FeatureSource {
    /// 按路径形态识别来源 (`.zip` 后缀按归档处理)
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_zip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if is_zip {
            FeatureSource::Archive(path)
        } else {
            FeatureSource::Directory(path)
        }
    }
}

/// 特征装载器
pub struct FeatureStore {
    source: FeatureSource,
    prefix: String,
}

impl FeatureStore {
    pub fn new(source: FeatureSource, prefix: impl Into<String>) -> Self {
        Self {
            source,
            prefix: prefix.into(),
        }
    }

    /// 图像 ID 到文件名的确定性映射
    pub fn file_name(&self, image_id: u64) -> String {
        format!("{}{:012}.tsv", self.prefix, image_id)
    }

    /// 按图像 ID 装载全部区域特征向量 (文件行序)
    pub fn load(&self, image_id: u64) -> Result<Vec<Vec<f32>>> {
        let name = self.file_name(image_id);
        let rows = match &self.source {
            FeatureSource::Directory(dir) => {
                let path = dir.join(&name);
                let file = File::open(&path)
                    .map_err(|_| VqaError::FeatureNotFound(path.display().to_string()))?;
                parse_rows(BufReader::new(file), &name)?
            }
            FeatureSource::Archive(archive_path) => {
                let archive_file = File::open(archive_path)?;
                let mut archive = zip::ZipArchive::new(archive_file)
                    .map_err(|e| VqaError::FeatureParse(e.to_string()))?;
                let entry = archive
                    .by_name(&name)
                    .map_err(|_| VqaError::FeatureNotFound(name.clone()))?;
                parse_rows(BufReader::new(entry), &name)?
            }
        };

        debug!(image_id, regions = rows.len(), "features loaded");
        Ok(rows)
    }
}

/// 解析 TSV 行为特征向量序列
fn parse_rows<R: Read>(reader: BufReader<R>, name: &str) -> Result<Vec<Vec<f32>>> {
    let mut rows = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= HEADER_COLUMNS {
            return Err(VqaError::FeatureParse(format!(
                "{name}:{}: expected more than {HEADER_COLUMNS} columns, got {}",
                line_no + 1,
                fields.len()
            )));
        }

        let mut features = Vec::with_capacity(fields.len() - HEADER_COLUMNS);
        for field in &fields[HEADER_COLUMNS..] {
            let value = field.parse::<f32>().map_err(|_| {
                VqaError::FeatureParse(format!(
                    "{name}:{}: bad number: {field}",
                    line_no + 1
                ))
            })?;
            features.push(value);
        }
        rows.push(features);
    }

    Ok(rows)
}
