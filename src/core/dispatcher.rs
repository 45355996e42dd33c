use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::core::context::BuildContext;
use crate::core::error::BuildError;
use crate::core::output::Output;
use crate::theme::Render;
use crate::writers::{Artifact, ArtifactBody, Writer, WriterKind};

/// 一次分发的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// 每个写入器生成的文件数，按执行顺序
    pub writers: Vec<(String, usize)>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.writers.iter().map(|(_, n)| n).sum()
    }
}

/// 按配置顺序驱动写入器
///
/// 先让所有写入器生成计划并检查输出路径冲突，全部通过后才开始渲染和写入，
/// 冲突时不会产生任何输出。
pub struct Dispatcher {
    writers: Vec<Box<dyn Writer>>,
}

impl Dispatcher {
    pub fn new(writers: Vec<Box<dyn Writer>>) -> Self {
        Self { writers }
    }

    pub fn from_kinds(kinds: &[WriterKind]) -> Self {
        Self::new(kinds.iter().map(|kind| kind.build()).collect())
    }

    /// 每个写入器恰好执行一次，返回各自的产物
    pub fn plan(&self, ctx: &BuildContext) -> Result<Vec<(String, Vec<Artifact>)>> {
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut plans = Vec::with_capacity(self.writers.len());

        for writer in &self.writers {
            let name = writer.name().to_string();
            let artifacts = writer
                .run(ctx)
                .map_err(|e| anyhow!(BuildError::writer_failure(&name, e)))?;
            debug!("写入器 {} 计划生成 {} 个文件", name, artifacts.len());

            for artifact in &artifacts {
                if let Some(first) = owners.insert(artifact.path.clone(), name.clone()) {
                    return Err(anyhow!(BuildError::OutputConflict {
                        path: artifact.path.clone(),
                        first,
                        second: name,
                    }));
                }
            }
            plans.push((name, artifacts));
        }

        Ok(plans)
    }

    /// 执行全部写入器
    pub fn dispatch(&self, ctx: &BuildContext, renderer: &dyn Render, output: &mut dyn Output) -> Result<DispatchReport> {
        let plans = self.plan(ctx)?;
        let mut report = DispatchReport::default();

        for (name, artifacts) in plans {
            for artifact in &artifacts {
                emit(artifact, renderer, output).map_err(|e| anyhow!(BuildError::writer_failure(&name, e)))?;
            }
            info!("写入器 {} 完成，生成 {} 个文件", name, artifacts.len());
            report.writers.push((name, artifacts.len()));
        }

        Ok(report)
    }
}

fn emit(artifact: &Artifact, renderer: &dyn Render, output: &mut dyn Output) -> Result<()> {
    match &artifact.body {
        ArtifactBody::Render { template, context } => {
            let bytes = renderer.render(template, context)?;
            output.write(&artifact.path, &bytes)
        }
        ArtifactBody::Bytes(bytes) => output.write(&artifact.path, bytes),
        ArtifactBody::Copy(from) => output.copy(from, &artifact.path),
    }
}
