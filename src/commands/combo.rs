// src/commands/combo.rs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::{parse_payload, RenderContext, ShellCommand, JOB_COMBO};
use crate::errors::{JobHelperError, Result};
use crate::graph::{ConfigPayload, JobConfig};
use crate::types::JobName;

/// One member of a `job_combo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComboItem {
    /// Name of another job in the same graph.
    Job(JobName),
    /// Literal shell text.
    Shell(ShellCommand),
    /// Job definition written in place.
    Inline(Box<JobConfig>),
}

/// Several jobs packed into one submission; their scripts run in order.
///
/// ```yaml
/// command: job_combo
/// config:
///   jobs:
///     - sh: sleep 1
///     - generate_data
///     - command: shell
///       config: { sh: echo done }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCombo {
    pub jobs: Vec<ComboItem>,
}

impl JobCombo {
    pub fn from_payload(config: &ConfigPayload) -> Result<Self> {
        parse_payload(JOB_COMBO, config)
    }

    pub(crate) fn render(&self, ctx: &RenderContext<'_>, visiting: &mut Vec<JobName>) -> Result<String> {
        let mut scripts = Vec::with_capacity(self.jobs.len());

        for item in &self.jobs {
            let script = match item {
                ComboItem::Shell(sh) => sh.sh.clone(),
                ComboItem::Job(name) => {
                    if visiting.contains(name) {
                        return Err(JobHelperError::DagCycle(format!(
                            "job_combo includes '{name}' inside itself"
                        )));
                    }
                    let job = ctx
                        .graph
                        .get(name)
                        .ok_or_else(|| JobHelperError::JobNotFound(name.clone()))?;
                    debug!(member = %name, "expanding job_combo member");
                    visiting.push(name.clone());
                    let rendered = render_member(ctx, job, visiting);
                    visiting.pop();
                    rendered?
                }
                ComboItem::Inline(job) => render_member(ctx, job, visiting)?,
            };
            scripts.push(script);
        }

        Ok(scripts.join("\n"))
    }
}

fn render_member(ctx: &RenderContext<'_>, job: &JobConfig, visiting: &mut Vec<JobName>) -> Result<String> {
    ctx.registry
        .resolve(&job.command)?
        .materialize(&job.config)?
        .render_nested(ctx, visiting)
}
