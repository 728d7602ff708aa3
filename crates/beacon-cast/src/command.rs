// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line templates with `{placeholder}` substitution.
//!
//! Templates are split on whitespace before substitution, so a device name
//! containing spaces still reaches the program as a single argument. No shell
//! is involved.

use beacon_core::{BeaconError, Device};
use tokio::process::Command;

/// A program plus argument templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    tokens: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(template: &str) -> Result<Self, BeaconError> {
        let tokens: Vec<String> = template.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return Err(BeaconError::Config("command template is empty".into()));
        }
        Ok(Self { tokens })
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Substitutes `vars` into every token.
    pub fn render(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.tokens
            .iter()
            .map(|token| {
                vars.iter().fold(token.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{key}}}"), value)
                })
            })
            .collect()
    }

    /// Builds a [`Command`] for `device`, with `url` when the template uses it.
    pub fn command_for(&self, device: &Device, url: Option<&str>) -> Command {
        let mut vars = vec![("address", device.address.as_str()), ("name", device.name.as_str())];
        if let Some(url) = url {
            vars.push(("url", url));
        }
        let argv = self.render(&vars);
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        command
    }
}

impl std::fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}
