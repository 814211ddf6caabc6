//! # vq_features - VisuaLoom Feature Store Loader
//!
//! 按图像 ID 装载区域特征向量: 一图一 TSV 文件, 一行一个区域。
//! 文件可以散放在目录里, 也可以按同一相对路径装在 zip 归档内。

pub mod loader;

pub use loader::{FeatureSource, FeatureStore};
