// src/commands/template.rs

use regex::{Captures, Regex};

use crate::commands::{JobInstance, UserCommand, UserJob};
use crate::errors::{JobHelperError, Result};
use crate::graph::ConfigPayload;
use crate::graph::model::scalar_to_string;

/// User command defined by a `run` template in `jh_config.toml`.
///
/// `{key}` is replaced by the job config's `key`; `{{` and `}}` produce
/// literal braces. Strings are inserted as-is, numbers and booleans in
/// their JSON spelling, arrays and objects as compact JSON.
#[derive(Debug, Clone)]
pub struct TemplateCommand {
    template: String,
    placeholder: Regex,
}

impl TemplateCommand {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let placeholder = Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_\-]*)\}")
            .map_err(|e| JobHelperError::Other(e.into()))?;
        Ok(Self {
            template: template.into(),
            placeholder,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Fill the template from a config payload.
    pub fn fill(&self, config: &ConfigPayload) -> Result<String> {
        let mut missing = Vec::new();

        let filled = self.placeholder.replace_all(&self.template, |caps: &Captures| {
            match caps.get(1) {
                None if &caps[0] == "{{" => "{".to_string(),
                None => "}".to_string(),
                Some(key) => match config.get(key.as_str()) {
                    Some(value) => scalar_to_string(value).unwrap_or_default(),
                    None => {
                        missing.push(key.as_str().to_string());
                        String::new()
                    }
                },
            }
        });

        if !missing.is_empty() {
            return Err(JobHelperError::Config(format!(
                "missing config value(s) for template '{}': {}",
                self.template,
                missing.join(", ")
            )));
        }

        Ok(filled.into_owned())
    }
}

impl UserCommand for TemplateCommand {
    fn materialize(&self, config: &ConfigPayload) -> Result<JobInstance> {
        let run_cmd = self.fill(config)?;
        Ok(JobInstance::User(UserJob { run_cmd }))
    }
}
