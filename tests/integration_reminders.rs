use time::macros::datetime;
use time::{Duration, UtcOffset};

use lisa::core::datetime::{DateNormalizer, Timestamp};
use lisa::core::reminder::{OutcomeKind, ReminderEvaluator, ReminderOptions, ReminderWindow};
use lisa::task::model::{Module, Task};
use lisa::task::storage::TaskStore;

const NOW: Timestamp = datetime!(2024-06-01 10:00);

fn evaluator() -> ReminderEvaluator {
    ReminderEvaluator::new(DateNormalizer::new(UtcOffset::UTC))
}

fn window() -> ReminderWindow {
    ReminderWindow::new(datetime!(2024-05-31 0:00), datetime!(2024-06-02 0:00))
}

fn task(id: u64, due: &str) -> Task {
    let mut t = Task::new(id, "Write report", Module::Work, "2024-05-20T08:00:00".to_owned());
    t.due = Some(due.to_owned());
    t
}

#[test]
fn fired_reminder_survives_a_save_and_reload() {
    let td = tempfile::tempdir().expect("tempdir");
    let store = TaskStore::new(td.path().join("tasks.json"));
    store.save(&[task(1, "2024-06-01")]).expect("save");

    let eval = evaluator().evaluate(&store.load(), NOW, window(), ReminderOptions::default());
    assert_eq!(eval.fired().count(), 1);
    store.save(&eval.tasks).expect("save");

    let reloaded = store.load();
    assert_eq!(reloaded[0].last_reminded.as_deref(), Some("2024-06-01T10:00:00"));

    let later = NOW + Duration::seconds(1800);
    let eval = evaluator().evaluate(&reloaded, later, window(), ReminderOptions::default());
    assert_eq!(eval.outcomes.len(), 1);
    assert_eq!(eval.outcomes[0].kind, OutcomeKind::Cooldown);

    let much_later = NOW + Duration::seconds(3601);
    let eval = evaluator().evaluate(&reloaded, much_later, window(), ReminderOptions::default());
    assert_eq!(eval.fired().count(), 1);
}

#[test]
fn mixed_task_list_reports_each_task_once() {
    let mut acked = task(2, "2024-06-01T09:00");
    acked.acknowledged = true;
    let mut no_due = task(3, "");
    no_due.due = None;
    let tasks = vec![
        task(1, "2024-06-01"),
        acked,
        no_due,
        task(4, "not-a-date"),
        task(5, "2024-07-01"),
    ];

    let eval = evaluator().evaluate(&tasks, NOW, window(), ReminderOptions::default());
    let kinds: Vec<(u64, OutcomeKind)> = eval.outcomes.iter().map(|o| (o.task_id, o.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (1, OutcomeKind::Fired),
            (2, OutcomeKind::Acknowledged),
            (4, OutcomeKind::ParseError),
            (5, OutcomeKind::OutOfWindow),
        ]
    );

    let summary = eval.summary();
    assert_eq!(summary.get(&OutcomeKind::Fired), Some(&1));
    assert_eq!(summary.get(&OutcomeKind::Cooldown), None);

    let changed: Vec<u64> = eval
        .tasks
        .iter()
        .zip(&tasks)
        .filter(|(after, before)| after != before)
        .map(|(after, _)| after.id)
        .collect();
    assert_eq!(changed, vec![1]);
}

#[test]
fn natural_language_due_dates_are_evaluated_against_now() {
    let tasks = vec![task(1, "today 9:30"), task(2, "in 2 days")];
    let eval = evaluator().evaluate(
        &tasks,
        NOW,
        ReminderWindow::trailing(NOW, Duration::hours(1)),
        ReminderOptions::default(),
    );
    let kinds: Vec<OutcomeKind> = eval.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(kinds, vec![OutcomeKind::Fired, OutcomeKind::OutOfWindow]);
}
