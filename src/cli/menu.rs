#![forbid(unsafe_code)]

//! Interactive menu. On a terminal the command is chosen with the picker;
//! otherwise a numbered list is printed and a line is read. Command
//! arguments are always prompted for line by line.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::actions::App;
use crate::cli::{AddArgs, CheckRemindersArgs, ExportArgs, ImportArgs, ListArgs, report};
use crate::error::LisaError;
use crate::tui::{self, picker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Add,
    List,
    Remove,
    Ack,
    CheckReminders,
    Export,
    Import,
    Clear,
    Quit,
}

struct Entry {
    command: MenuCommand,
    name: &'static str,
    aliases: &'static [&'static str],
    help: &'static str,
}

const ENTRIES: [Entry; 9] = [
    Entry {
        command: MenuCommand::Add,
        name: "add",
        aliases: &[],
        help: "Add a task with an optional due date",
    },
    Entry {
        command: MenuCommand::List,
        name: "list",
        aliases: &["ls"],
        help: "List tasks, optionally for one module",
    },
    Entry {
        command: MenuCommand::Remove,
        name: "remove",
        aliases: &["rm"],
        help: "Remove a task by ID",
    },
    Entry {
        command: MenuCommand::Ack,
        name: "ack",
        aliases: &["acknowledge"],
        help: "Stop reminders for a task",
    },
    Entry {
        command: MenuCommand::CheckReminders,
        name: "check-reminders",
        aliases: &["check", "reminders"],
        help: "Show reminders for tasks due recently",
    },
    Entry {
        command: MenuCommand::Export,
        name: "export",
        aliases: &[],
        help: "Export tasks to JSON or CSV",
    },
    Entry {
        command: MenuCommand::Import,
        name: "import",
        aliases: &[],
        help: "Import tasks from JSON or CSV",
    },
    Entry {
        command: MenuCommand::Clear,
        name: "clear",
        aliases: &[],
        help: "Delete every task",
    },
    Entry {
        command: MenuCommand::Quit,
        name: "quit",
        aliases: &["q", "exit"],
        help: "Leave the menu",
    },
];

impl MenuCommand {
    /// Resolves a 1-based menu number or an exact command name.
    #[must_use]
    pub fn lookup(input: &str) -> Option<Self> {
        let key = input.trim().to_lowercase();
        if let Ok(n) = key.parse::<usize>() {
            return ENTRIES.get(n.checked_sub(1)?).map(|e| e.command);
        }
        ENTRIES
            .iter()
            .find(|e| e.name == key || e.aliases.contains(&key.as_str()))
            .map(|e| e.command)
    }
}

pub fn run_interactive(app: &App) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    Menu::new(app, stdin.lock(), std::io::stdout(), tui::is_tty()).run()
}

pub struct Menu<'a, R, W> {
    app: &'a App,
    input: R,
    out: W,
    use_picker: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(app: &'a App, input: R, out: W, use_picker: bool) -> Self {
        Self {
            app,
            input,
            out,
            use_picker,
        }
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        tracing::debug!(picker = self.use_picker, "menu started");
        loop {
            let Some(command) = self.choose()? else {
                break;
            };
            if command == MenuCommand::Quit {
                break;
            }
            let result = self.execute(command);
            if let Err(err) = report(result, &mut self.out) {
                tracing::error!("menu command failed: {err:#}");
                writeln!(self.out, "[!] {err:#}")?;
            }
            writeln!(self.out)?;
        }
        writeln!(self.out, "Goodbye.")?;
        Ok(())
    }

    /// `None` means input ended.
    fn choose(&mut self) -> anyhow::Result<Option<MenuCommand>> {
        if self.use_picker {
            let items: Vec<picker::PickerItem> = ENTRIES
                .iter()
                .map(|e| picker::PickerItem {
                    title: e.name.to_owned(),
                    preview: e.help.to_owned(),
                })
                .collect();
            match picker::pick_one("LISA", &items) {
                Ok(i) => return Ok(ENTRIES.get(i).map(|e| e.command)),
                Err(LisaError::Cancelled) => return Ok(Some(MenuCommand::Quit)),
                Err(err) => {
                    tracing::warn!("picker unavailable, using line input: {err}");
                    self.use_picker = false;
                }
            }
        }

        self.print_menu()?;
        loop {
            write!(self.out, "Select an option: ")?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            match MenuCommand::lookup(&line) {
                Some(cmd) => return Ok(Some(cmd)),
                None => writeln!(
                    self.out,
                    "[!] Unknown option '{line}'. Enter 1-{} or a command name.",
                    ENTRIES.len()
                )?,
            }
        }
    }

    fn print_menu(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "LISA - Local Intelligent Scheduling Assistant")?;
        for (i, e) in ENTRIES.iter().enumerate() {
            writeln!(self.out, "{:>3}. {:<16} {}", i + 1, e.name, e.help)?;
        }
        Ok(())
    }

    fn execute(&mut self, command: MenuCommand) -> anyhow::Result<()> {
        let app = self.app;
        match command {
            MenuCommand::Add => {
                let args = AddArgs {
                    text: self.prompt("Task text: ")?,
                    module: self.optional(&format!(
                        "Module (work/home/study) [{}]: ",
                        app.config().tasks.default_module
                    ))?,
                    due: self.optional("Due date (optional): ")?,
                    priority: self.optional(&format!(
                        "Priority (low/medium/high) [{}]: ",
                        app.config().tasks.default_priority
                    ))?,
                    force: false,
                };
                app.add(&args, &mut self.out)
            }
            MenuCommand::List => {
                let args = ListArgs {
                    module: self.optional("Module filter (blank for all): ")?,
                    json: false,
                };
                app.list(&args, &mut self.out)
            }
            MenuCommand::Remove => {
                let id = self.prompt_id()?;
                app.remove(id, &mut self.out)
            }
            MenuCommand::Ack => {
                let id = self.prompt_id()?;
                app.acknowledge(id, &mut self.out)
            }
            MenuCommand::CheckReminders => {
                let args = CheckRemindersArgs {
                    since: self.optional("Since (blank for the default window): ")?,
                    until: self.optional("Until (blank for now): ")?,
                    all: self.confirm("Ignore cooldown? [y/N]: ")?,
                    dry_run: self.confirm("Dry run? [y/N]: ")?,
                    ..CheckRemindersArgs::default()
                };
                app.check_reminders(&args, &mut self.out)
            }
            MenuCommand::Export => {
                let args = ExportArgs {
                    format: self.optional("Format (json/csv) [json]: ")?,
                    output: self.optional("Output file [tasks_export.<format>]: ")?.map(PathBuf::from),
                };
                app.export(&args, &mut self.out)
            }
            MenuCommand::Import => {
                let file = self.prompt("File to import: ")?;
                if file.is_empty() {
                    return Err(LisaError::validation("A file path is required.").into());
                }
                let args = ImportArgs {
                    file: PathBuf::from(file),
                    format: self.optional("Format (json/csv) [from extension]: ")?,
                };
                app.import(&args, &mut self.out)
            }
            MenuCommand::Clear => {
                if self.confirm("Delete ALL tasks? [y/N]: ")? {
                    app.clear(&mut self.out)
                } else {
                    writeln!(self.out, "Nothing deleted.")?;
                    Ok(())
                }
            }
            MenuCommand::Quit => Ok(()),
        }
    }

    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// End of input cancels the command being prompted for.
    fn prompt(&mut self, label: &str) -> anyhow::Result<String> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        Ok(self.read_line()?.ok_or(LisaError::Cancelled)?)
    }

    fn optional(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        let answer = self.prompt(label)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    fn confirm(&mut self, label: &str) -> anyhow::Result<bool> {
        let answer = self.prompt(label)?.to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    fn prompt_id(&mut self) -> anyhow::Result<u64> {
        let raw = self.prompt("Task ID: ")?;
        let id = raw
            .trim_start_matches('#')
            .parse::<u64>()
            .map_err(|_| LisaError::validation(format!("Invalid task ID '{raw}'.")))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use time::UtcOffset;
    use time::macros::datetime;

    use super::*;
    use crate::config::Config;
    use crate::core::datetime::DateNormalizer;
    use crate::task::storage::TaskStore;

    fn app(dir: &tempfile::TempDir) -> App {
        App::new(
            Config::default(),
            TaskStore::new(dir.path().join("tasks.json")),
            DateNormalizer::new(UtcOffset::UTC),
        )
        .with_fixed_now(datetime!(2024-06-01 10:00))
    }

    fn session(app: &App, script: &str) -> String {
        let mut out = Vec::<u8>::new();
        Menu::new(app, Cursor::new(script.as_bytes()), &mut out, false)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(MenuCommand::lookup("1"), Some(MenuCommand::Add));
        assert_eq!(MenuCommand::lookup(" 9 "), Some(MenuCommand::Quit));
        assert_eq!(MenuCommand::lookup("Check"), Some(MenuCommand::CheckReminders));
        assert_eq!(MenuCommand::lookup("rm"), Some(MenuCommand::Remove));
        assert_eq!(MenuCommand::lookup("0"), None);
        assert_eq!(MenuCommand::lookup("10"), None);
        assert_eq!(MenuCommand::lookup("re"), None);
        assert_eq!(MenuCommand::lookup("a"), None);
    }

    #[test]
    fn add_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let out = session(&app, "add\nWrite report\nwork\ntomorrow 9am\nhigh\n2\n\nquit\n");

        assert!(out.contains("[+] Added task #1: 'Write report'"), "{out}");
        assert!(out.contains("2024-06-02T09:00:00"), "{out}");
        assert!(out.ends_with("Goodbye.\n"), "{out}");

        let tasks = app.store().load();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority.as_str(), "high");
    }

    #[test]
    fn errors_are_shown_and_the_menu_continues() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let out = session(&app, "bogus\nremove\nabc\nack\n7\nq\n");

        assert!(out.contains("[!] Unknown option 'bogus'."), "{out}");
        assert!(out.contains("[!] Invalid task ID 'abc'."), "{out}");
        assert!(out.contains("[!] Task #7 not found."), "{out}");
        assert!(out.ends_with("Goodbye.\n"), "{out}");
    }

    #[test]
    fn clear_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        session(&app, "add\nWrite report\n\n\n\n");
        assert_eq!(app.store().load().len(), 1);

        let out = session(&app, "clear\nn\nclear\ny\n");
        assert!(out.contains("Nothing deleted."), "{out}");
        assert!(out.contains("[-] Cleared 1 task(s)."), "{out}");
        assert!(app.store().load().is_empty());
    }

    #[test]
    fn end_of_input_mid_prompt_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir);
        let out = session(&app, "add\nHalf typed");
        assert!(out.contains("[!] operation cancelled"), "{out}");
        assert!(app.store().load().is_empty());
    }
}
