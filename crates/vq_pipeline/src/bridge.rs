//! 外部编译器/查询引擎桥接
//!
//! 外部成品 (JVM 宿主的自然语言到查询编译器 + 模式匹配引擎) 作为子进程
//! 拉起, 经 stdio 上的 JSON 行协议通信。求值期间引擎会回发打分请求行,
//! 桥接用注入的 [`ScoreOracle`] 逐条应答。
//!
//! 协议 (每行一个 JSON 对象):
//! - 请求: `{"op":"translate","question":...}` / `{"op":"evaluate","query":...}`
//!   / `{"op":"execute","query":...}`; 打分应答 `{"score":v}`。
//! - 应答: `{"kind":"query",...}` / `{"kind":"no_query"}` /
//!   `{"kind":"score_request","region":n,"word":w}` / `{"kind":"truth","value":v}`
//!   / `{"kind":"results","bindings":[...]}` / `{"kind":"error","message":m}`。

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use vq_core::{Result, VqaError};
use vq_facts::RegionId;

use crate::oracle::ScoreOracle;

/// 开放题单条结果: (区域, 属性概念, 对象概念)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultBinding {
    pub region: RegionId,
    pub attribute: String,
    pub object: String,
}

/// 问题文本 -> 结构化查询 的翻译能力
#[async_trait]
pub trait QuestionTranslator: Send {
    /// 返回查询表达式; 编译器明确拒绝时为 None
    async fn translate(&mut self, question: &str) -> Result<Option<String>>;
}

/// 结构化查询求值能力 (求值期间经 oracle 回调打分)
#[async_trait]
pub trait QueryEngine: Send {
    /// 是非题: 单一真值 [0,1]
    async fn evaluate(
        &mut self,
        query: &str,
        oracle: &mut dyn ScoreOracle,
    ) -> Result<f64>;

    /// 开放题: (区域, 属性, 对象) 结果序列
    async fn execute(
        &mut self,
        query: &str,
        oracle: &mut dyn ScoreOracle,
    ) -> Result<Vec<ResultBinding>>;
}

/// 桥接配置
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// 宿主命令
    pub command: String,
    /// 前置参数
    pub args: Vec<String>,
    /// 编译器成品路径 (jar)
    pub artifact: PathBuf,
}

impl BridgeConfig {
    /// JVM 宿主的默认配置: `java -jar <artifact>`
    pub fn jvm(artifact: impl Into<PathBuf>) -> Self {
        Self {
            command: "java".to_string(),
            args: vec!["-jar".to_string()],
            artifact: artifact.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeRequest<'a> {
    Translate { question: &'a str },
    Evaluate { query: &'a str },
    Execute { query: &'a str },
}

#[derive(Serialize)]
struct ScoreReply {
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BridgeLine {
    Query { query: String },
    NoQuery,
    ScoreRequest { region: RegionId, word: String },
    Truth { value: f64 },
    Results { bindings: Vec<ResultBinding> },
    Error { message: String },
}

/// 子进程桥接
pub struct QueryBridge {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl QueryBridge {
    /// 拉起外部进程 (启动失败终止整个运行)
    pub async fn spawn(config: BridgeConfig) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .arg(&config.artifact)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VqaError::Bridge(format!(
                    "failed to spawn {} {}: {e}",
                    config.command,
                    config.artifact.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VqaError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VqaError::Bridge("bridge stdout unavailable".to_string()))?;

        debug!(command = %config.command, artifact = %config.artifact.display(), "bridge spawned");
        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        })
    }

    /// 结束子进程
    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.stdin);
        self.child
            .wait()
            .await
            .map_err(|e| VqaError::Bridge(format!("bridge wait failed: {e}")))?;
        Ok(())
    }

    async fn send(&mut self, value: &impl Serialize) -> Result<()> {
        let mut line = serde_json::to_string(value)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| VqaError::Bridge(format!("bridge write failed: {e}")))?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<BridgeLine> {
        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| VqaError::Bridge(format!("bridge read failed: {e}")))?
            .ok_or_else(|| VqaError::Bridge("bridge closed its stdout".to_string()))?;
        Ok(serde_json::from_str(&line)?)
    }

    /// 发送查询, 应答打分回调, 直到收到终结行
    async fn drive(
        &mut self,
        request: BridgeRequest<'_>,
        oracle: &mut dyn ScoreOracle,
    ) -> Result<BridgeLine> {
        self.send(&request).await?;
        loop {
            match self.recv().await? {
                BridgeLine::ScoreRequest { region, word } => {
                    let score = oracle.score(region, &word);
                    self.send(&ScoreReply { score }).await?;
                }
                BridgeLine::Error { message } => return Err(VqaError::Bridge(message)),
                terminal => return Ok(terminal),
            }
        }
    }
}

#[async_trait]
impl QuestionTranslator for QueryBridge {
    async fn translate(&mut self, question: &str) -> Result<Option<String>> {
        self.send(&BridgeRequest::Translate { question }).await?;
        match self.recv().await? {
            BridgeLine::Query { query } => Ok(Some(query)),
            BridgeLine::NoQuery => Ok(None),
            BridgeLine::Error { message } => Err(VqaError::Bridge(message)),
            other => Err(VqaError::Bridge(format!(
                "unexpected bridge line during translate: {other:?}"
            ))),
        }
    }
}

#[async_trait]
impl QueryEngine for QueryBridge {
    async fn evaluate(&mut self, query: &str, oracle: &mut dyn ScoreOracle) -> Result<f64> {
        match self.drive(BridgeRequest::Evaluate { query }, oracle).await? {
            BridgeLine::Truth { value } => Ok(value),
            other => Err(VqaError::Bridge(format!(
                "unexpected bridge line during evaluate: {other:?}"
            ))),
        }
    }

    async fn execute(
        &mut self,
        query: &str,
        oracle: &mut dyn ScoreOracle,
    ) -> Result<Vec<ResultBinding>> {
        match self.drive(BridgeRequest::Execute { query }, oracle).await? {
            BridgeLine::Results { bindings } => Ok(bindings),
            other => Err(VqaError::Bridge(format!(
                "unexpected bridge line during execute: {other:?}"
            ))),
        }
    }
}
