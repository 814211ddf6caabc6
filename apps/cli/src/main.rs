//! VisuaLoom CLI - 问答批处理命令行接口
//!
//! 装载预训练词模型, 经外部模式匹配引擎逐行回答问题,
//! 逐题打印结果行, 最后打印聚合统计。

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vq_facts::FactStore;
use vq_features::{FeatureSource, FeatureStore};
use vq_pipeline::{BridgeConfig, QueryBridge, VqaPipeline};
use vq_scorer::{load_scorer, ScorerKind};

/// 模型种类 (启动期一次性解析)
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ModelKind {
    /// 词表集成: 每词一个子网络, 只需 --models
    Multidnn,
    /// 超网络: 还需 --words 与 --embeddings
    Hypernet,
}

impl From<ModelKind> for ScorerKind {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Multidnn => ScorerKind::MultiDnn,
            ModelKind::Hypernet => ScorerKind::Hypernet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "visualoom",
    version,
    about = "Load pretrained word models and answer questions through the external pattern matcher"
)]
struct Args {
    /// 模型种类
    #[arg(short, long, value_enum)]
    kind: ModelKind,

    /// 解析后的问题文件
    #[arg(short, long)]
    questions: PathBuf,

    /// 模型文件
    #[arg(short, long)]
    models: PathBuf,

    /// 特征路径 (zip 归档或目录)
    #[arg(short, long)]
    features: PathBuf,

    /// 词表文件 (hypernet 必需)
    #[arg(short, long, required_if_eq("kind", "hypernet"))]
    words: Option<PathBuf>,

    /// 词嵌入文件 (hypernet 必需)
    #[arg(short, long, required_if_eq("kind", "hypernet"))]
    embeddings: Option<PathBuf>,

    /// 特征文件名前缀
    #[arg(long, default_value = "val2014_parsed_features/COCO_val2014_")]
    features_prefix: String,

    /// 预载事实文件 (写入基帧)
    #[arg(short = 'a', long)]
    facts: Option<PathBuf>,

    /// 流水线日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 桥接日志级别 (独立于流水线日志流)
    #[arg(long, default_value = "warn")]
    bridge_log_level: String,

    /// 外部编译器成品路径 (jar)
    #[arg(long, default_value = "question2query.jar")]
    bridge_jar: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志: 流水线与桥接两条独立日志流
    let directives = format!(
        "visualoom={level},vq_core={level},vq_facts={level},vq_features={level},\
         vq_scorer={level},vq_pipeline={level},vq_pipeline::bridge={bridge_level}",
        level = args.log_level,
        bridge_level = args.bridge_log_level,
    );
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&directives)?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("VisuaLoom main loop started");

    // 启动期装载, 任何失败直接终止运行
    let scorer = load_scorer(
        args.kind.into(),
        &args.models,
        args.words.as_deref(),
        args.embeddings.as_deref(),
    )?;

    let features = FeatureStore::new(
        FeatureSource::detect(&args.features),
        args.features_prefix.clone(),
    );

    let mut facts = FactStore::new();
    if let Some(facts_file) = &args.facts {
        let loaded = facts.load_facts(facts_file)?;
        tracing::info!(loaded, "base facts preloaded");
    }

    let bridge = QueryBridge::spawn(BridgeConfig::jvm(&args.bridge_jar)).await?;

    let mut pipeline = VqaPipeline::new(features, scorer, bridge, facts);
    pipeline.run_from_file(&args.questions).await?;

    println!("{}", pipeline.stats());

    pipeline.into_bridge().shutdown().await?;
    tracing::info!("VisuaLoom main loop stopped");
    Ok(())
}
