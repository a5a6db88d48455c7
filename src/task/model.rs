#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LisaError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Work,
    Home,
    Study,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Work, Module::Home, Module::Study];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Work => "work",
            Module::Home => "home",
            Module::Study => "study",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = LisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let want = s.trim().to_lowercase();
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == want)
            .ok_or_else(|| {
                LisaError::validation(format!(
                    "invalid module '{}': must be one of {}",
                    s.trim(),
                    join_names(Module::ALL.iter().map(|m| m.as_str()))
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = LisaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let want = s.trim().to_lowercase();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == want)
            .ok_or_else(|| {
                LisaError::validation(format!(
                    "invalid priority '{}': must be one of {}",
                    s.trim(),
                    join_names(Priority::ALL.iter().map(|p| p.as_str()))
                ))
            })
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// A single tracked item.
///
/// `due` keeps the text the user typed; it is only turned into a timestamp
/// when reminders are evaluated. Field order is the CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub created: String,
    pub module: Module,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub due: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub acknowledged: bool,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_reminded: Option<String>,
}

impl Task {
    #[must_use]
    pub fn new(id: u64, text: &str, module: Module, created: String) -> Self {
        Self {
            id,
            text: text.trim().to_owned(),
            created,
            module,
            priority: Priority::default(),
            due: None,
            acknowledged: false,
            last_reminded: None,
        }
    }

    /// Duplicate rule for `add`: same trimmed text in the same module.
    /// Due date and priority do not participate.
    #[must_use]
    pub fn is_duplicate_of(&self, text: &str, module: Module) -> bool {
        self.module == module && self.text.trim() == text.trim()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<FlagRepr>::deserialize(d)? else {
        return Ok(false);
    };
    match raw {
        FlagRepr::Bool(b) => Ok(b),
        FlagRepr::Int(n) => Ok(n != 0),
        FlagRepr::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, got '{other}'"
            ))),
        },
    }
}

fn empty_as_none<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<String>::deserialize(d)?;
    Ok(v.filter(|s| !s.trim().is_empty()))
}
