#![forbid(unsafe_code)]

//! Decides which tasks should fire a reminder.
//!
//! Evaluation is a pure function of the task list, the evaluation instant and
//! the options. It never reads or writes storage and never prints; the caller
//! persists [`Evaluation::tasks`] (unless it was a dry run) and renders the
//! outcomes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use time::Duration;

use crate::core::datetime::{DateNormalizer, Timestamp, format_iso};
use crate::task::model::Task;

pub const DEFAULT_COOLDOWN_SECONDS: i64 = 3600;
pub const DEFAULT_WINDOW_SECONDS: i64 = 3600;
/// Upper bound accepted for a cooldown: one hundred years.
pub const MAX_COOLDOWN_SECONDS: i64 = 100 * 366 * 24 * 3600;

/// Inclusive `[since, until]` interval. `since > until` is not rejected; it
/// simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub since: Timestamp,
    pub until: Timestamp,
}

impl ReminderWindow {
    #[must_use]
    pub fn new(since: Timestamp, until: Timestamp) -> Self {
        Self { since, until }
    }

    /// `[now - span, now]`.
    #[must_use]
    pub fn trailing(now: Timestamp, span: Duration) -> Self {
        let since = now.checked_sub(span).unwrap_or(now);
        Self { since, until: now }
    }

    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.since <= ts && ts <= self.until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderOptions {
    pub cooldown: Duration,
    /// Skips the cooldown check. Acknowledged tasks stay silent regardless.
    pub ignore_cooldown: bool,
    /// Leaves `last_reminded` untouched.
    pub dry_run: bool,
}

impl Default for ReminderOptions {
    fn default() -> Self {
        Self {
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECONDS),
            ignore_cooldown: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Fired,
    OutOfWindow,
    Acknowledged,
    Cooldown,
    ParseError,
}

impl OutcomeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Fired => "fired",
            OutcomeKind::OutOfWindow => "out-of-window",
            OutcomeKind::Acknowledged => "acknowledged",
            OutcomeKind::Cooldown => "cooldown",
            OutcomeKind::ParseError => "parse-error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReminderOutcome {
    pub task_id: u64,
    pub kind: OutcomeKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub outcomes: Vec<ReminderOutcome>,
    pub tasks: Vec<Task>,
}

impl Evaluation {
    pub fn fired(&self) -> impl Iterator<Item = &ReminderOutcome> {
        self.outcomes.iter().filter(|o| o.kind == OutcomeKind::Fired)
    }

    #[must_use]
    pub fn summary(&self) -> BTreeMap<OutcomeKind, usize> {
        let mut counts = BTreeMap::new();
        for o in &self.outcomes {
            *counts.entry(o.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReminderEvaluator {
    normalizer: DateNormalizer,
}

impl ReminderEvaluator {
    #[must_use]
    pub fn new(normalizer: DateNormalizer) -> Self {
        Self { normalizer }
    }

    #[must_use]
    pub fn evaluate(
        &self,
        tasks: &[Task],
        now: Timestamp,
        window: ReminderWindow,
        opts: ReminderOptions,
    ) -> Evaluation {
        let mut outcomes = Vec::new();
        let mut updated = tasks.to_vec();
        for task in &mut updated {
            self.evaluate_task(task, now, window, opts, &mut outcomes);
        }
        Evaluation {
            outcomes,
            tasks: updated,
        }
    }

    fn evaluate_task(
        &self,
        task: &mut Task,
        now: Timestamp,
        window: ReminderWindow,
        opts: ReminderOptions,
        outcomes: &mut Vec<ReminderOutcome>,
    ) {
        let task_id = task.id;
        let mut push = |kind: OutcomeKind, detail: String| {
            outcomes.push(ReminderOutcome {
                task_id,
                kind,
                detail,
            });
        };

        let Some(due_text) = task.due.as_deref() else {
            return;
        };
        let due = match self.normalizer.parse(due_text, now) {
            Ok(due) => due,
            Err(_) => {
                push(OutcomeKind::ParseError, format!("due: unparseable '{due_text}'"));
                return;
            }
        };
        if !window.contains(due) {
            push(
                OutcomeKind::OutOfWindow,
                format!(
                    "due {} outside {} .. {}",
                    format_iso(due),
                    format_iso(window.since),
                    format_iso(window.until)
                ),
            );
            return;
        }
        if task.acknowledged {
            push(OutcomeKind::Acknowledged, format!("due {}", format_iso(due)));
            return;
        }

        if !opts.ignore_cooldown
            && let Some(last_text) = task.last_reminded.as_deref()
        {
            match self.normalizer.parse_iso(last_text) {
                Ok(last) => {
                    let elapsed = now - last;
                    if elapsed < opts.cooldown {
                        let left = opts.cooldown.saturating_sub(elapsed);
                        push(
                            OutcomeKind::Cooldown,
                            format!(
                                "last reminded {}, {}s of cooldown left",
                                format_iso(last),
                                left.whole_seconds()
                            ),
                        );
                        return;
                    }
                }
                Err(_) => push(
                    OutcomeKind::ParseError,
                    format!("last_reminded: unparseable '{last_text}'"),
                ),
            }
        }

        push(OutcomeKind::Fired, format!("due {}", format_iso(due)));
        if !opts.dry_run {
            task.last_reminded = Some(format_iso(now));
        }
    }
}
