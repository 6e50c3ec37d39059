// src/graph/dependency.rs

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{JobHandle, JobName, START};

/// Condition under which a dependent may start relative to a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Dependency has started.
    After,
    /// Dependency has finished, any outcome.
    AfterAny,
    /// Dependency has finished unsuccessfully.
    AfterNotOk,
    /// Dependency has finished successfully.
    AfterOk,
}

impl DependencyKind {
    /// Fixed bucket order used for iteration and for the Slurm string.
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::After,
        DependencyKind::AfterAny,
        DependencyKind::AfterNotOk,
        DependencyKind::AfterOk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::After => "after",
            DependencyKind::AfterAny => "afterany",
            DependencyKind::AfterNotOk => "afternotok",
            DependencyKind::AfterOk => "afterok",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Run after" relationships of a job, one list per condition.
///
/// Deserializes either from a table:
///
/// ```yaml
/// dependency:
///   afterok: [prepare]
///   afterany: [cleanup]
/// ```
///
/// or from the legacy flat list form, which means `afterok`:
///
/// ```yaml
/// dependency: [prepare, START]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDependency")]
pub struct DependencySpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<JobName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub afterany: Vec<JobName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub afternotok: Vec<JobName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub afterok: Vec<JobName>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Empty,
    List(Vec<JobName>),
    Table {
        #[serde(default)]
        after: Vec<JobName>,
        #[serde(default)]
        afterany: Vec<JobName>,
        #[serde(default)]
        afternotok: Vec<JobName>,
        #[serde(default)]
        afterok: Vec<JobName>,
    },
}

impl From<RawDependency> for DependencySpec {
    fn from(raw: RawDependency) -> Self {
        match raw {
            RawDependency::Empty => DependencySpec::default(),
            RawDependency::List(names) => DependencySpec::after_ok(names),
            RawDependency::Table {
                after,
                afterany,
                afternotok,
                afterok,
            } => DependencySpec {
                after,
                afterany,
                afternotok,
                afterok,
            },
        }
    }
}

impl DependencySpec {
    /// Shorthand for a spec that only has `afterok` entries.
    pub fn after_ok<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<JobName>,
    {
        Self {
            afterok: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn bucket(&self, kind: DependencyKind) -> &[JobName] {
        match kind {
            DependencyKind::After => &self.after,
            DependencyKind::AfterAny => &self.afterany,
            DependencyKind::AfterNotOk => &self.afternotok,
            DependencyKind::AfterOk => &self.afterok,
        }
    }

    pub fn bucket_mut(&mut self, kind: DependencyKind) -> &mut Vec<JobName> {
        match kind {
            DependencyKind::After => &mut self.after,
            DependencyKind::AfterAny => &mut self.afterany,
            DependencyKind::AfterNotOk => &mut self.afternotok,
            DependencyKind::AfterOk => &mut self.afterok,
        }
    }

    /// Non-empty buckets in fixed order, paired with their kind.
    pub fn buckets(&self) -> impl Iterator<Item = (DependencyKind, &[JobName])> {
        DependencyKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.bucket(kind)))
            .filter(|(_, names)| !names.is_empty())
    }

    /// Every referenced name, bucket by bucket. Duplicates are kept.
    pub fn names_referenced(&self) -> impl Iterator<Item = &str> {
        DependencyKind::ALL
            .into_iter()
            .flat_map(move |kind| self.bucket(kind).iter().map(String::as_str))
    }

    pub fn references(&self, name: &str) -> bool {
        self.names_referenced().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        DependencyKind::ALL
            .into_iter()
            .all(|kind| self.bucket(kind).is_empty())
    }

    /// Replace symbolic names with the handles submitted so far.
    ///
    /// In dry-run mode the name itself is kept so printed scripts stay
    /// readable. Names that were never submitted (other than `START`) are
    /// warned about and dropped.
    pub fn resolve_to_handles(
        &self,
        submitted: &HashMap<JobName, JobHandle>,
        dry_run: bool,
    ) -> DependencySpec {
        let mut resolved = DependencySpec::default();

        for kind in DependencyKind::ALL {
            let out = resolved.bucket_mut(kind);
            for name in self.bucket(kind) {
                match submitted.get(name) {
                    Some(_) if dry_run => out.push(name.clone()),
                    Some(JobHandle::Id(id)) => out.push(id.to_string()),
                    Some(JobHandle::DryRun) => {
                        warn!(dep = %name, kind = %kind, "dependency has no job id; skipping");
                    }
                    None if name == START => {}
                    None => {
                        warn!(dep = %name, kind = %kind, "dependency not found among submitted jobs; dropping");
                    }
                }
            }
        }

        resolved
    }
}
