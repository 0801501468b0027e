use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::error::{RankfuseError, Result};

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    Error { code: String, message: String },
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings: Vec::new(),
    }
}

pub fn robot_error(err: &RankfuseError) -> RobotResponse<serde_json::Value> {
    RobotResponse {
        status: RobotStatus::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
        warnings: Vec::new(),
    }
}

impl<T> RobotResponse<T> {
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn emit_robot<T: Serialize>(response: &RobotResponse<T>) -> Result<()> {
    emit_json(response)
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| RankfuseError::Serialization(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 18,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        // Pad before styling; ANSI codes would count toward the width.
        let padded = format!("{key:width$}", width = self.key_width);
        self.lines.push(format!("{} {value}", style(padded).dim()));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn warning(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("{} {text}", style("!").yellow().bold()));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: &HumanLayout) {
    println!("{}", layout.build());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_error_carries_code_and_message() {
        let err = RankfuseError::InvalidWeights("weights [0.5] given for 2 runs".to_string());
        let value = serde_json::to_value(robot_error(&err)).unwrap();
        assert_eq!(value["status"]["error"]["code"], "invalid_weights");
        assert!(value["status"]["error"]["message"].as_str().unwrap().contains("2 runs"));
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn ok_envelope_carries_warnings() {
        let value = serde_json::to_value(robot_ok(1).with_warnings(vec!["topic 9 not in base run".into()])).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"], 1);
        assert_eq!(value["warnings"][0], "topic 9 not in base run");
    }

    #[test]
    fn layout_lines() {
        console::set_colors_enabled(false);
        let mut layout = HumanLayout::new();
        layout.title("Run").kv("queries", "2").bullet("q1");
        let text = layout.build();
        assert!(text.starts_with("Run\n\n"));
        assert!(text.contains("queries            2"));
        assert!(text.ends_with("- q1"));
    }
}
