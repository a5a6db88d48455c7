#![forbid(unsafe_code)]

//! Command implementations shared by the one-shot subcommands and the menu.
//!
//! Every action loads the store, applies one change, saves and reports to the
//! writer it is given. Errors the user can fix come back as [`LisaError`]
//! values; the caller decides how to show them.

use std::io::Write;
use std::path::PathBuf;

use time::Duration;

use crate::cli::{AddArgs, CheckRemindersArgs, ExportArgs, ImportArgs, ListArgs};
use crate::config::Config;
use crate::core::datetime::{DateNormalizer, Timestamp, format_iso};
use crate::core::reminder::{
    MAX_COOLDOWN_SECONDS, OutcomeKind, ReminderEvaluator, ReminderOptions, ReminderOutcome,
    ReminderWindow,
};
use crate::error::LisaError;
use crate::output::table::Table;
use crate::task::model::{Module, Priority, Task};
use crate::task::storage::TaskStore;
use crate::task::transfer::{self, Format};

pub struct App {
    cfg: Config,
    store: TaskStore,
    normalizer: DateNormalizer,
    evaluator: ReminderEvaluator,
    env_interval: Option<String>,
    fixed_now: Option<Timestamp>,
}

impl App {
    #[must_use]
    pub fn new(cfg: Config, store: TaskStore, normalizer: DateNormalizer) -> Self {
        Self {
            cfg,
            store,
            normalizer,
            evaluator: ReminderEvaluator::new(normalizer),
            env_interval: None,
            fixed_now: None,
        }
    }

    /// Raw value of the reminder interval environment variable, if set.
    #[must_use]
    pub fn with_env_interval(mut self, value: Option<String>) -> Self {
        self.env_interval = value;
        self
    }

    /// Pins the clock, so relative dates and reminder windows are stable.
    #[must_use]
    pub fn with_fixed_now(mut self, now: Timestamp) -> Self {
        self.fixed_now = Some(now);
        self
    }

    #[must_use]
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn now(&self) -> Timestamp {
        self.fixed_now.unwrap_or_else(|| self.normalizer.now())
    }

    /// Saves and reports whether it worked. A failed save is logged and
    /// mentioned but does not fail the command.
    fn persist(&self, tasks: &[Task], out: &mut dyn Write) -> anyhow::Result<bool> {
        match self.store.save(tasks) {
            Ok(()) => Ok(true),
            Err(err) => {
                tracing::error!(path = %self.store.path().display(), "save failed: {err:#}");
                writeln!(out, "[!] Could not save tasks: {err:#}")?;
                Ok(false)
            }
        }
    }

    /// Loads the task list, telling the user when an unparseable task file
    /// had to be moved aside.
    fn load_tasks(&self, out: &mut dyn Write) -> anyhow::Result<Vec<Task>> {
        let loaded = self.store.load_for_update()?;
        if let Some(backup) = &loaded.moved_aside {
            writeln!(
                out,
                "[!] Could not parse {}. It was moved to {} and the task list starts empty.",
                self.store.path().display(),
                backup.display()
            )?;
        }
        Ok(loaded.tasks)
    }

    pub fn add(&self, args: &AddArgs, out: &mut dyn Write) -> anyhow::Result<()> {
        let text = args.text.trim();
        if text.is_empty() {
            return Err(LisaError::validation("task text must not be empty").into());
        }
        let module = match args.module.as_deref() {
            Some(m) => m.parse::<Module>()?,
            None => self.cfg.tasks.default_module,
        };
        let priority = match args.priority.as_deref() {
            Some(p) => p.parse::<Priority>()?,
            None => self.cfg.tasks.default_priority,
        };

        let now = self.now();
        let due = match args.due.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(self.normalize_due(raw, now)?),
            _ => None,
        };

        let mut tasks = self.load_tasks(out)?;
        if !args.force
            && let Some(existing) = tasks.iter().find(|t| t.is_duplicate_of(text, module))
        {
            return Err(LisaError::validation(format!(
                "Task already exists as #{} in '{module}'. Use --force to add it anyway.",
                existing.id
            ))
            .into());
        }

        let mut task = Task::new(TaskStore::next_id(&tasks), text, module, format_iso(now));
        task.priority = priority;
        task.due = due;
        let id = task.id;
        let line = describe_added(&task);
        tasks.push(task);

        if self.persist(&tasks, out)? {
            tracing::info!(id, %module, "task added");
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Relative input is pinned to an absolute timestamp at creation time;
    /// inputs without a time of day are kept as plain dates.
    fn normalize_due(&self, raw: &str, now: Timestamp) -> Result<String, LisaError> {
        let ts = self
            .normalizer
            .parse(raw, now)
            .map_err(|_| LisaError::validation(format!("Invalid due date '{raw}'.")))?;
        if ts.time() == time::Time::MIDNIGHT {
            Ok(ts.date().to_string())
        } else {
            Ok(format_iso(ts))
        }
    }

    pub fn list(&self, args: &ListArgs, out: &mut dyn Write) -> anyhow::Result<()> {
        let module = args
            .module
            .as_deref()
            .map(str::parse::<Module>)
            .transpose()?;
        let tasks: Vec<Task> = self
            .load_tasks(out)?
            .into_iter()
            .filter(|t| module.is_none_or(|m| t.module == m))
            .collect();

        if args.json {
            serde_json::to_writer_pretty(&mut *out, &tasks)?;
            writeln!(out)?;
            return Ok(());
        }
        if tasks.is_empty() {
            writeln!(out, "No tasks found.")?;
            return Ok(());
        }

        let mut table =
            Table::new(["ID", "MODULE", "PRIORITY", "DUE", "ACK", "TEXT", "CREATED"]).align_right(0);
        for t in &tasks {
            table.row([
                t.id.to_string(),
                t.module.to_string(),
                t.priority.to_string(),
                t.due.clone().unwrap_or_else(|| "-".to_owned()),
                if t.acknowledged { "yes" } else { "" }.to_owned(),
                t.text.clone(),
                t.created.clone(),
            ]);
        }
        table.write_to(&mut *out)?;
        Ok(())
    }

    pub fn remove(&self, id: u64, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks(out)?;
        let Some(pos) = tasks.iter().position(|t| t.id == id) else {
            return Err(not_found(id).into());
        };
        tasks.remove(pos);
        if self.persist(&tasks, out)? {
            tracing::info!(id, "task removed");
            writeln!(out, "[-] Removed task #{id}.")?;
        }
        Ok(())
    }

    pub fn clear(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let count = self.load_tasks(out)?.len();
        if let Err(err) = self.store.clear() {
            tracing::error!(path = %self.store.path().display(), "clear failed: {err:#}");
            writeln!(out, "[!] Could not clear tasks: {err:#}")?;
            return Ok(());
        }
        tracing::info!(count, "tasks cleared");
        writeln!(out, "[-] Cleared {count} task(s).")?;
        Ok(())
    }

    pub fn acknowledge(&self, id: u64, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut tasks = self.load_tasks(out)?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Err(not_found(id).into());
        };
        if task.acknowledged {
            writeln!(out, "Task #{id} is already acknowledged.")?;
            return Ok(());
        }
        task.acknowledged = true;
        if self.persist(&tasks, out)? {
            tracing::info!(id, "task acknowledged");
            writeln!(out, "[+] Acknowledged task #{id}. It will not remind again.")?;
        }
        Ok(())
    }

    pub fn export(&self, args: &ExportArgs, out: &mut dyn Write) -> anyhow::Result<()> {
        let format = match (&args.format, &args.output) {
            (Some(f), _) => f.parse::<Format>()?,
            (None, Some(path)) => Format::from_path(path),
            (None, None) => Format::Json,
        };
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("tasks_export.{}", format.extension())));

        let tasks = self.load_tasks(out)?;
        if transfer::export(&tasks, format, &path)? {
            writeln!(
                out,
                "[+] Exported {} task(s) to {} ({format}).",
                tasks.len(),
                path.display()
            )?;
        } else {
            writeln!(out, "No tasks to export.")?;
        }
        Ok(())
    }

    pub fn import(&self, args: &ImportArgs, out: &mut dyn Write) -> anyhow::Result<()> {
        let format = match args.format.as_deref() {
            Some(f) => f.parse::<Format>()?,
            None => Format::from_path(&args.file),
        };
        let incoming = transfer::import(&args.file, format)?;

        let mut tasks = self.load_tasks(out)?;
        let report = transfer::merge(&mut tasks, incoming);
        if !report.added.is_empty() && !self.persist(&tasks, out)? {
            return Ok(());
        }
        tracing::info!(
            file = %args.file.display(),
            added = report.added.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "tasks imported"
        );
        writeln!(
            out,
            "[+] Imported {} task(s) from {}.",
            report.added.len(),
            args.file.display()
        )?;
        if !report.skipped.is_empty() {
            writeln!(out, "    Skipped existing IDs: {}", id_list(&report.skipped))?;
        }
        if !report.rejected.is_empty() {
            writeln!(
                out,
                "    Rejected records (id 0 or empty text): {}",
                id_list(&report.rejected)
            )?;
        }
        Ok(())
    }

    pub fn check_reminders(
        &self,
        args: &CheckRemindersArgs,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let now = self.now();
        let default =
            ReminderWindow::trailing(now, Duration::seconds(self.cfg.reminders.window_seconds));
        let until = match args.until.as_deref() {
            Some(raw) => self.normalizer.parse(raw, now)?,
            None => default.until,
        };
        let since = match args.since.as_deref() {
            Some(raw) => self.normalizer.parse(raw, now)?,
            None => default.since,
        };
        let cooldown = match args.interval {
            Some(secs) if !(0..=MAX_COOLDOWN_SECONDS).contains(&secs) => {
                return Err(LisaError::validation(format!(
                    "--interval must be between 0 and {MAX_COOLDOWN_SECONDS}"
                ))
                .into());
            }
            Some(secs) => secs,
            None => self
                .cfg
                .default_cooldown_seconds(self.env_interval.as_deref()),
        };

        let opts = ReminderOptions {
            cooldown: Duration::seconds(cooldown),
            ignore_cooldown: args.all,
            dry_run: args.dry_run,
        };
        let window = ReminderWindow::new(since, until);
        let tasks = self.load_tasks(out)?;
        tracing::debug!(
            since = %format_iso(since),
            until = %format_iso(until),
            cooldown,
            tasks = tasks.len(),
            "checking reminders"
        );
        let eval = self.evaluator.evaluate(&tasks, now, window, opts);

        for o in &eval.outcomes {
            match o.kind {
                OutcomeKind::Fired => tracing::info!(id = o.task_id, "reminder fired"),
                OutcomeKind::ParseError => {
                    tracing::warn!(id = o.task_id, detail = %o.detail, "reminder skipped");
                }
                _ => tracing::debug!(id = o.task_id, kind = %o.kind, detail = %o.detail),
            }
        }

        if !args.dry_run && eval.tasks != tasks {
            self.persist(&eval.tasks, out)?;
        }

        if args.json {
            serde_json::to_writer_pretty(&mut *out, &eval.outcomes)?;
            writeln!(out)?;
            return Ok(());
        }

        let icons = self.cfg.ui.icons;
        let mut fired = 0usize;
        for o in &eval.outcomes {
            match o.kind {
                OutcomeKind::Fired => {
                    fired += 1;
                    writeln!(out, "{}", describe_fired(o, &eval.tasks, icons))?;
                }
                OutcomeKind::ParseError => writeln!(out, "[!] Task #{}: {}", o.task_id, o.detail)?,
                kind if args.verbose => {
                    writeln!(out, "[-] Task #{} skipped ({kind}): {}", o.task_id, o.detail)?;
                }
                _ => {}
            }
        }
        if fired == 0 {
            writeln!(out, "No reminders due.")?;
        } else {
            writeln!(out, "{fired} reminder(s).")?;
        }
        if args.dry_run {
            writeln!(out, "(dry run: nothing saved)")?;
        }
        Ok(())
    }
}

fn not_found(id: u64) -> LisaError {
    LisaError::NotFound(format!("Task #{id} not found."))
}

fn id_list(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_added(task: &Task) -> String {
    let mut line = format!(
        "[+] Added task #{}: '{}' [module: {}, priority: {}]",
        task.id, task.text, task.module, task.priority
    );
    if let Some(due) = &task.due {
        line.push_str(&format!(" due {due}"));
    }
    line
}

fn describe_fired(o: &ReminderOutcome, tasks: &[Task], icons: bool) -> String {
    let marker = if icons { "🔔" } else { "[*]" };
    match tasks.iter().find(|t| t.id == o.task_id) {
        Some(t) => format!(
            "{marker} Reminder: #{} [{}] {} ({})",
            t.id, t.module, t.text, o.detail
        ),
        None => format!("{marker} Reminder: #{} ({})", o.task_id, o.detail),
    }
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;
    use time::macros::datetime;

    use super::*;

    const NOW: Timestamp = datetime!(2024-06-01 10:00);

    fn app(dir: &tempfile::TempDir) -> App {
        let mut cfg = Config::default();
        cfg.ui.icons = false;
        App::new(
            cfg,
            TaskStore::new(dir.path().join("tasks.json")),
            DateNormalizer::new(UtcOffset::UTC),
        )
        .with_fixed_now(NOW)
    }

    fn add_args(text: &str) -> AddArgs {
        AddArgs {
            text: text.to_owned(),
            module: None,
            due: None,
            priority: None,
            force: false,
        }
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::<u8>::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn user_error(result: anyhow::Result<()>) -> String {
        let err = result.unwrap_err();
        let e = err.downcast_ref::<LisaError>().unwrap();
        assert!(e.is_user_facing(), "{e:?}");
        e.to_string()
    }

    #[test]
    fn add_uses_configured_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let text = run(|out| app.add(&add_args("  Write report "), out));
        assert_eq!(
            text,
            "[+] Added task #1: 'Write report' [module: work, priority: medium]\n"
        );

        let tasks = app.store().load();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Write report");
        assert_eq!(tasks[0].created, "2024-06-01T10:00:00");
        assert_eq!(tasks[0].due, None);
    }

    #[test]
    fn add_pins_relative_due_dates() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let mut args = add_args("Call plumber");
        args.module = Some("HOME".to_owned());
        args.due = Some("tomorrow 14:30".to_owned());
        run(|out| app.add(&args, out));

        let mut args = add_args("Exam");
        args.module = Some("study".to_owned());
        args.due = Some("2024-06-10".to_owned());
        run(|out| app.add(&args, out));

        let tasks = app.store().load();
        assert_eq!(tasks[0].module, Module::Home);
        assert_eq!(tasks[0].due.as_deref(), Some("2024-06-02T14:30:00"));
        assert_eq!(tasks[1].due.as_deref(), Some("2024-06-10"));
    }

    #[test]
    fn add_rejects_bad_input_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        assert_eq!(
            user_error(app.add(&add_args("   "), &mut Vec::<u8>::new())),
            "task text must not be empty"
        );

        let mut args = add_args("Write report");
        args.module = Some("garden".to_owned());
        user_error(app.add(&args, &mut Vec::<u8>::new()));

        let mut args = add_args("Write report");
        args.due = Some("someday".to_owned());
        assert_eq!(
            user_error(app.add(&args, &mut Vec::<u8>::new())),
            "Invalid due date 'someday'."
        );

        assert!(!app.store().path().exists());
    }

    #[test]
    fn duplicates_need_force() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        run(|out| app.add(&add_args("Write report"), out));

        let msg = user_error(app.add(&add_args("Write report"), &mut Vec::<u8>::new()));
        assert!(msg.contains("#1"), "{msg}");

        let mut other_module = add_args("Write report");
        other_module.module = Some("home".to_owned());
        run(|out| app.add(&other_module, out));

        let mut forced = add_args("Write report");
        forced.force = true;
        run(|out| app.add(&forced, out));

        let ids: Vec<u64> = app.store().load().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn list_filters_and_renders() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        assert_eq!(run(|out| app.list(&ListArgs::default(), out)), "No tasks found.\n");

        run(|out| app.add(&add_args("Write report"), out));
        let mut home = add_args("Water plants");
        home.module = Some("home".to_owned());
        run(|out| app.add(&home, out));

        let filtered = ListArgs {
            module: Some("home".to_owned()),
            json: true,
        };
        let json = run(|out| app.list(&filtered, out));
        let tasks: Vec<Task> = serde_json::from_str(&json).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Water plants");

        let table = run(|out| app.list(&ListArgs::default(), out));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  MODULE  PRIORITY"));
        assert!(lines[1].contains("Write report"));
    }

    #[test]
    fn remove_and_ack_report_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        run(|out| app.add(&add_args("Write report"), out));

        assert_eq!(
            user_error(app.remove(9, &mut Vec::<u8>::new())),
            "Task #9 not found."
        );
        assert_eq!(
            user_error(app.acknowledge(9, &mut Vec::<u8>::new())),
            "Task #9 not found."
        );

        assert_eq!(
            run(|out| app.acknowledge(1, out)),
            "[+] Acknowledged task #1. It will not remind again.\n"
        );
        assert_eq!(
            run(|out| app.acknowledge(1, out)),
            "Task #1 is already acknowledged.\n"
        );
        assert!(app.store().load()[0].acknowledged);

        assert_eq!(run(|out| app.remove(1, out)), "[-] Removed task #1.\n");
        assert!(app.store().load().is_empty());
    }

    #[test]
    fn clear_empties_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        run(|out| app.add(&add_args("a"), out));
        run(|out| app.add(&add_args("b"), out));
        assert_eq!(run(|out| app.clear(out)), "[-] Cleared 2 task(s).\n");
        assert!(app.store().load().is_empty());
    }

    #[test]
    fn export_skips_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let target = dir.path().join("out.csv");
        let args = ExportArgs {
            format: None,
            output: Some(target.clone()),
        };
        assert_eq!(run(|out| app.export(&args, out)), "No tasks to export.\n");
        assert!(!target.exists());

        run(|out| app.add(&add_args("Write report"), out));
        let text = run(|out| app.export(&args, out));
        assert!(text.ends_with("(csv).\n"), "{text}");
        let csv = std::fs::read_to_string(&target).unwrap();
        assert!(csv.starts_with("id,text,created,module,priority,due,acknowledged,last_reminded"));
    }

    #[test]
    fn import_of_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let args = ImportArgs {
            file: dir.path().join("nope.json"),
            format: None,
        };
        let msg = user_error(app.import(&args, &mut Vec::<u8>::new()));
        assert!(msg.starts_with("import file not found"), "{msg}");
    }

    #[test]
    fn import_reports_unparseable_files_and_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "not json").unwrap();
        let args = ImportArgs {
            file: broken,
            format: None,
        };
        let msg = user_error(app.import(&args, &mut Vec::<u8>::new()));
        assert!(msg.starts_with("could not import"), "{msg}");

        let mixed = dir.path().join("mixed.json");
        std::fs::write(
            &mixed,
            r#"[{"id":0,"text":"no id","created":"c","module":"work"},
                {"id":3,"text":"  ","created":"c","module":"home"},
                {"id":4,"text":"Call mom","created":"c","module":"home"}]"#,
        )
        .unwrap();
        let args = ImportArgs {
            file: mixed,
            format: None,
        };
        let text = run(|out| app.import(&args, out));
        assert!(text.starts_with("[+] Imported 1 task(s)"), "{text}");
        assert!(
            text.contains("    Rejected records (id 0 or empty text): #0, #3\n"),
            "{text}"
        );
        let ids: Vec<u64> = app.store().load().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn unparseable_store_survives_the_next_add() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let original = r#"[{"id":1,"text":"Old","created":"c","module":"work"},
            {"id":2,"text":"Older","created":"c","module":"general"}]"#;
        std::fs::write(app.store().path(), original).unwrap();

        let text = run(|out| app.add(&add_args("New"), out));
        assert!(text.starts_with("[!] Could not parse"), "{text}");
        assert!(text.contains("[+] Added task #1: 'New'"), "{text}");

        let kept: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("tasks.json.corrupt-"))
            })
            .collect();
        assert_eq!(kept.len(), 1, "{kept:?}");
        assert_eq!(std::fs::read_to_string(&kept[0]).unwrap(), original);
        assert_eq!(app.store().load().len(), 1);
    }

    #[test]
    fn check_reminders_fires_then_cools_down() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let mut args = add_args("Write report");
        args.due = Some("2024-06-01 09:30".to_owned());
        run(|out| app.add(&args, out));

        let check = CheckRemindersArgs::default();
        let first = run(|out| app.check_reminders(&check, out));
        assert_eq!(
            first,
            "[*] Reminder: #1 [work] Write report (due 2024-06-01T09:30:00)\n1 reminder(s).\n"
        );
        assert_eq!(
            app.store().load()[0].last_reminded.as_deref(),
            Some("2024-06-01T10:00:00")
        );

        let second = run(|out| app.check_reminders(&check, out));
        assert_eq!(second, "No reminders due.\n");

        let verbose = CheckRemindersArgs {
            verbose: true,
            ..CheckRemindersArgs::default()
        };
        let text = run(|out| app.check_reminders(&verbose, out));
        assert!(text.starts_with("[-] Task #1 skipped (cooldown)"), "{text}");
    }

    #[test]
    fn check_reminders_dry_run_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let mut args = add_args("Write report");
        args.due = Some("2024-06-01 09:30".to_owned());
        run(|out| app.add(&args, out));

        let dry = CheckRemindersArgs {
            dry_run: true,
            ..CheckRemindersArgs::default()
        };
        let text = run(|out| app.check_reminders(&dry, out));
        assert!(text.ends_with("(dry run: nothing saved)\n"), "{text}");
        assert_eq!(app.store().load()[0].last_reminded, None);
    }

    #[test]
    fn check_reminders_validates_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let bad_since = CheckRemindersArgs {
            since: Some("whenever".to_owned()),
            ..CheckRemindersArgs::default()
        };
        assert_eq!(
            user_error(app.check_reminders(&bad_since, &mut Vec::<u8>::new())),
            "could not parse date 'whenever'"
        );
        let negative = CheckRemindersArgs {
            interval: Some(-5),
            ..CheckRemindersArgs::default()
        };
        user_error(app.check_reminders(&negative, &mut Vec::<u8>::new()));
        let huge = CheckRemindersArgs {
            interval: Some(i64::MAX),
            ..CheckRemindersArgs::default()
        };
        let msg = user_error(app.check_reminders(&huge, &mut Vec::<u8>::new()));
        assert!(msg.starts_with("--interval must be between 0 and"), "{msg}");
    }

    #[test]
    fn env_interval_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).with_env_interval(Some("0".to_owned()));
        let mut args = add_args("Write report");
        args.due = Some("2024-06-01 09:30".to_owned());
        run(|out| app.add(&args, out));

        let check = CheckRemindersArgs::default();
        run(|out| app.check_reminders(&check, out));
        let again = run(|out| app.check_reminders(&check, out));
        assert!(again.contains("Reminder: #1"), "{again}");
    }
}
