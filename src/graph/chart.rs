// src/graph/chart.rs

//! Mermaid flowchart export of the job graph.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::errors::{JobHelperError, Result};
use crate::graph::dependency::DependencyKind;
use crate::graph::model::ProjectConfig;
use crate::types::{JobName, JobState};

/// Style class attached to a node in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    NoRun,
    Failed,
    Completed,
}

impl NodeClass {
    fn as_str(&self) -> &'static str {
        match self {
            NodeClass::NoRun => "norun",
            NodeClass::Failed => "failed",
            NodeClass::Completed => "completed",
        }
    }

    /// Chart class for a scheduler state; in-flight jobs stay unstyled.
    pub fn from_state(state: JobState) -> Option<Self> {
        match state {
            JobState::Completed => Some(NodeClass::Completed),
            JobState::Failed | JobState::Cancelled => Some(NodeClass::Failed),
            JobState::Pending | JobState::Running => None,
        }
    }
}

/// A dependency edge `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from: JobName,
    pub to: JobName,
    pub kind: DependencyKind,
}

const CLASS_DEFS: [&str; 3] = [
    "classDef norun fill:#ddd,stroke:#aaa,stroke-width:3px,stroke-dasharray: 5 5",
    "classDef failed fill:#eaa,stroke:#e44",
    "classDef completed fill:#aea,stroke:#4a4",
];

fn arrow(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::After => "--o",
        DependencyKind::AfterAny => "-.-o",
        DependencyKind::AfterNotOk => "-.-x",
        DependencyKind::AfterOk => "-->",
    }
}

/// Build Mermaid flowchart text from node classes and edges.
pub fn flowchart(nodes: &BTreeMap<JobName, NodeClass>, links: &[Link]) -> String {
    let label = |name: &str| match nodes.get(name) {
        Some(class) => format!("{name}:::{}", class.as_str()),
        None => name.to_string(),
    };

    let mut lines = vec!["flowchart TD".to_string()];
    for link in links {
        lines.push(format!(
            "    {} {} {}",
            label(&link.from),
            arrow(link.kind),
            label(&link.to)
        ));
    }
    lines.extend(CLASS_DEFS.iter().map(|s| s.to_string()));
    lines.join("\n")
}

impl ProjectConfig {
    /// Every dependency edge, one per (from, to) pair.
    pub fn links(&self) -> Vec<Link> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut links = Vec::new();

        for (name, job) in self.jobs() {
            for (kind, deps) in job.dependency.buckets() {
                for dep in deps {
                    if seen.insert((dep.as_str(), name.as_str())) {
                        links.push(Link {
                            from: dep.clone(),
                            to: name.clone(),
                            kind,
                        });
                    }
                }
            }
        }
        links
    }

    /// Chart of the graph with jobs outside the rerun closure marked `norun`.
    pub fn jobflow_chart(&self, reruns: &str, run_following: bool) -> Result<String> {
        let to_run = self.jobs_to_run(reruns, run_following)?;
        let nodes: BTreeMap<JobName, NodeClass> = self
            .names()
            .filter(|name| !to_run.contains(name))
            .map(|name| (name.to_string(), NodeClass::NoRun))
            .collect();
        Ok(flowchart(&nodes, &self.links()))
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <body>
    <pre class="mermaid">
{chart}
    </pre>
    <script type="module">
      import mermaid from 'https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs';
    </script>
  </body>
</html>
"#;

/// Emit a chart: `-` prints to stdout, `.html` writes a self-rendering
/// page, `.mmd` writes the raw Mermaid source.
pub fn render_chart(chart: &str, output: &str) -> Result<()> {
    if output == "-" {
        println!("{chart}");
        return Ok(());
    }

    let path = Path::new(output);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "html" => fs::write(path, HTML_TEMPLATE.replace("{chart}", chart))?,
        "mmd" => fs::write(path, format!("{chart}\n"))?,
        other => {
            return Err(JobHelperError::Config(format!(
                "unsupported chart output format '.{other}' (expected '-', .html or .mmd)"
            )));
        }
    }
    Ok(())
}
