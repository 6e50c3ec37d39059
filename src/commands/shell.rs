// src/commands/shell.rs

use serde::{Deserialize, Serialize};

use crate::commands::{parse_payload, SHELL};
use crate::errors::Result;
use crate::graph::ConfigPayload;

/// A literal shell command: `{sh: "python prepare.py"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCommand {
    pub sh: String,
}

impl ShellCommand {
    pub fn from_payload(config: &ConfigPayload) -> Result<Self> {
        parse_payload(SHELL, config)
    }
}
