use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 9;
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub const DAILY_REPEAT_DAYS: usize = 14;
pub const WEEKLY_REPEAT_WEEKS: usize = 12;
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

pub const INBOX_MIGRATION_NOTE: &str = "Migrated from inbox";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub scheduled_time: String,
    pub details: String,
    pub starred: bool,
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: String,
    pub text: String,
    pub done: bool,
    pub starred: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub scheduled_time: String,
    pub details: String,
    pub checklist: Vec<String>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn kept_checklist_rows(&self) -> Vec<&str> {
        self.checklist
            .iter()
            .filter(|row| !row.trim().is_empty())
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
}

impl Recurrence {
    pub fn parse(raw: &str) -> Option<Recurrence> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "once" => Some(Recurrence::None),
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            _ => None,
        }
    }

    pub fn expand(self, anchor: NaiveDate) -> Vec<NaiveDate> {
        let (repeats, step_days) = match self {
            Recurrence::None => return vec![anchor],
            Recurrence::Daily => (DAILY_REPEAT_DAYS, 1i64),
            Recurrence::Weekly => (WEEKLY_REPEAT_WEEKS, 7i64),
        };

        let mut days = Vec::with_capacity(repeats + 1);
        days.push(anchor);
        for occurrence in 1..=repeats {
            days.push(anchor + Duration::days(occurrence as i64 * step_days));
        }
        days
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: BTreeMap<NaiveDate, Vec<Task>>,
}

impl Schedule {
    // A missing key and an empty bucket are the same thing to readers.
    pub fn tasks_on(&self, day: NaiveDate) -> &[Task] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn task(&self, day: NaiveDate, task_id: &str) -> Option<&Task> {
        self.tasks_on(day).iter().find(|task| task.id == task_id)
    }

    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[Task])> {
        self.days.iter().map(|(day, tasks)| (*day, tasks.as_slice()))
    }

    pub fn task_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn with_task_added(
        &self,
        anchor: NaiveDate,
        draft: &TaskDraft,
        repeat: Recurrence,
    ) -> Schedule {
        let rows = draft.kept_checklist_rows();
        let mut next = self.clone();
        for day in repeat.expand(anchor) {
            let task = Task {
                id: generate_id(),
                title: draft.title.clone(),
                scheduled_time: draft.scheduled_time.clone(),
                details: draft.details.clone(),
                starred: false,
                checklist: rows
                    .iter()
                    .map(|text| ChecklistItem {
                        id: generate_id(),
                        text: (*text).to_string(),
                        done: false,
                    })
                    .collect(),
            };
            next.days.entry(day).or_default().push(task);
        }
        next
    }

    #[must_use]
    pub fn with_task_removed(&self, day: NaiveDate, task_id: &str) -> Schedule {
        let mut next = self.clone();
        if let Some(tasks) = next.days.get_mut(&day) {
            tasks.retain(|task| task.id != task_id);
            if tasks.is_empty() {
                next.days.remove(&day);
            }
        }
        next
    }

    #[must_use]
    pub fn with_star_toggled(&self, day: NaiveDate, task_id: &str) -> Schedule {
        let mut next = self.clone();
        if let Some(tasks) = next.days.get_mut(&day) {
            if let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) {
                task.starred = !task.starred;
            }
        }
        next
    }

    #[must_use]
    pub fn with_checklist_toggled(
        &self,
        day: NaiveDate,
        task_id: &str,
        item_id: &str,
    ) -> Schedule {
        let mut next = self.clone();
        if let Some(tasks) = next.days.get_mut(&day) {
            if let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) {
                if let Some(item) = task.checklist.iter_mut().find(|item| item.id == item_id) {
                    item.done = !item.done;
                }
            }
        }
        next
    }

    #[must_use]
    pub fn normalized(&self) -> Schedule {
        let mut next = self.clone();
        next.days.retain(|_, tasks| !tasks.is_empty());
        next
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Planner {
    pub schedule: Schedule,
    pub inbox: Vec<InboxItem>,
}

impl Planner {
    pub fn inbox_item(&self, item_id: &str) -> Option<&InboxItem> {
        self.inbox.iter().find(|item| item.id == item_id)
    }

    #[must_use]
    pub fn with_inbox_captured(&self, text: impl Into<String>, starred: bool) -> Planner {
        let mut next = self.clone();
        next.inbox.insert(
            0,
            InboxItem {
                id: generate_id(),
                text: text.into(),
                done: false,
                starred,
            },
        );
        next
    }

    #[must_use]
    pub fn with_inbox_toggled(&self, item_id: &str) -> Planner {
        let mut next = self.clone();
        if let Some(item) = next.inbox.iter_mut().find(|item| item.id == item_id) {
            item.done = !item.done;
        }
        next
    }

    #[must_use]
    pub fn with_inbox_starred(&self, item_id: &str) -> Planner {
        let mut next = self.clone();
        if let Some(item) = next.inbox.iter_mut().find(|item| item.id == item_id) {
            item.starred = !item.starred;
        }
        next
    }

    #[must_use]
    pub fn with_inbox_removed(&self, item_id: &str) -> Planner {
        let mut next = self.clone();
        next.inbox.retain(|item| item.id != item_id);
        next
    }

    // Removal from the inbox and insertion into the schedule happen in one
    // snapshot; no observer sees the item in both places or in neither.
    #[must_use]
    pub fn with_inbox_item_scheduled(&self, item_id: &str, target: NaiveDate) -> Planner {
        let Some(item) = self.inbox_item(item_id) else {
            return self.clone();
        };

        let task = Task {
            id: generate_id(),
            title: item.text.clone(),
            scheduled_time: String::new(),
            details: INBOX_MIGRATION_NOTE.to_string(),
            starred: item.starred,
            checklist: Vec::new(),
        };

        let mut next = self.clone();
        next.schedule.days.entry(target).or_default().push(task);
        next.inbox.retain(|entry| entry.id != item_id);
        next
    }

    #[must_use]
    pub fn normalized(&self) -> Planner {
        Planner {
            schedule: self.schedule.normalized(),
            inbox: self.inbox.clone(),
        }
    }

    pub fn stats(&self, today: NaiveDate) -> PlannerStats {
        let mut total_tasks = 0;
        let mut starred_tasks = 0;
        let mut checklist_total = 0;
        let mut checklist_done = 0;

        for (_, tasks) in self.schedule.days() {
            total_tasks += tasks.len();
            for task in tasks {
                if task.starred {
                    starred_tasks += 1;
                }
                checklist_total += task.checklist.len();
                checklist_done += task.checklist.iter().filter(|item| item.done).count();
            }
        }

        let mut daily_counts = Vec::with_capacity(ACTIVITY_WINDOW_DAYS as usize);
        for offset in (0..ACTIVITY_WINDOW_DAYS).rev() {
            let day = today - Duration::days(offset);
            daily_counts.push((day, self.schedule.tasks_on(day).len()));
        }

        PlannerStats {
            total_tasks,
            starred_tasks,
            checklist_total,
            checklist_done,
            daily_counts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerStats {
    pub total_tasks: usize,
    pub starred_tasks: usize,
    pub checklist_total: usize,
    pub checklist_done: usize,
    pub daily_counts: Vec<(NaiveDate, usize)>,
}

impl PlannerStats {
    pub fn completion_rate(&self) -> u32 {
        if self.checklist_total == 0 {
            return 0;
        }
        ((self.checklist_done as f64 / self.checklist_total as f64) * 100.0).round() as u32
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_date_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_KEY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        DAILY_REPEAT_DAYS, INBOX_MIGRATION_NOTE, Planner, Recurrence, Schedule, TaskDraft,
        WEEKLY_REPEAT_WEEKS, format_date_key, generate_id, parse_date_key,
    };

    fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, dom).expect("test date should be valid")
    }

    #[test]
    fn adding_once_touches_a_single_day() {
        let anchor = day(2026, 3, 10);
        let schedule = Schedule::default().with_task_added(
            anchor,
            &TaskDraft::titled("Call the bank"),
            Recurrence::None,
        );

        assert_eq!(schedule.tasks_on(anchor).len(), 1);
        assert_eq!(schedule.task_count(), 1);
        assert!(schedule.tasks_on(day(2026, 3, 11)).is_empty());
    }

    #[test]
    fn daily_expansion_covers_fifteen_consecutive_days() {
        let anchor = day(2026, 3, 1);
        let mut draft = TaskDraft::titled("Stretch");
        draft.scheduled_time = "7:00 AM".to_string();
        let schedule = Schedule::default().with_task_added(anchor, &draft, Recurrence::Daily);

        assert_eq!(schedule.task_count(), DAILY_REPEAT_DAYS + 1);
        let mut seen_ids = std::collections::HashSet::new();
        for offset in 0..=DAILY_REPEAT_DAYS as i64 {
            let target = anchor + chrono::Duration::days(offset);
            let tasks = schedule.tasks_on(target);
            assert_eq!(tasks.len(), 1, "expected one task on {target}");
            assert_eq!(tasks[0].title, "Stretch");
            assert_eq!(tasks[0].scheduled_time, "7:00 AM");
            assert!(seen_ids.insert(tasks[0].id.clone()), "ids must be distinct");
        }
    }

    #[test]
    fn weekly_expansion_steps_by_seven_days() {
        let anchor = day(2026, 1, 5);
        let schedule = Schedule::default().with_task_added(
            anchor,
            &TaskDraft::titled("Review week"),
            Recurrence::Weekly,
        );

        assert_eq!(schedule.task_count(), WEEKLY_REPEAT_WEEKS + 1);
        for occurrence in 0..=WEEKLY_REPEAT_WEEKS as i64 {
            let target = anchor + chrono::Duration::days(occurrence * 7);
            assert_eq!(schedule.tasks_on(target).len(), 1);
        }
        assert!(schedule.tasks_on(anchor + chrono::Duration::days(1)).is_empty());
    }

    #[test]
    fn expansion_rolls_over_month_and_year_boundaries() {
        let targets = Recurrence::Daily.expand(day(2025, 12, 28));
        assert_eq!(targets.len(), 15);
        assert_eq!(targets[4], day(2026, 1, 1));
        assert_eq!(*targets.last().expect("expansion is non-empty"), day(2026, 1, 11));
    }

    #[test]
    fn blank_checklist_rows_are_dropped() {
        let mut draft = TaskDraft::titled("Pack bags");
        draft.checklist = vec![
            "Passport".to_string(),
            "   ".to_string(),
            String::new(),
            "Chargers".to_string(),
        ];
        let anchor = day(2026, 6, 2);
        let schedule = Schedule::default().with_task_added(anchor, &draft, Recurrence::None);

        let task = &schedule.tasks_on(anchor)[0];
        let texts: Vec<&str> = task.checklist.iter().map(|item| item.text.as_str()).collect();
        assert_eq!(texts, vec!["Passport", "Chargers"]);
        assert!(task.checklist.iter().all(|item| !item.done));
        assert_ne!(task.checklist[0].id, task.checklist[1].id);
    }

    #[test]
    fn removal_is_idempotent_and_prunes_empty_days() {
        let anchor = day(2026, 4, 20);
        let schedule = Schedule::default().with_task_added(
            anchor,
            &TaskDraft::titled("Water plants"),
            Recurrence::None,
        );
        let task_id = schedule.tasks_on(anchor)[0].id.clone();

        let removed = schedule.with_task_removed(anchor, &task_id);
        assert!(removed.tasks_on(anchor).is_empty());
        assert_eq!(removed.days().count(), 0, "empty bucket must be pruned");

        let removed_again = removed.with_task_removed(anchor, &task_id);
        assert_eq!(removed_again.task_count(), removed.task_count());
    }

    #[test]
    fn star_toggle_is_an_involution() {
        let anchor = day(2026, 2, 14);
        let schedule = Schedule::default().with_task_added(
            anchor,
            &TaskDraft::titled("Book dinner"),
            Recurrence::None,
        );
        let task_id = schedule.tasks_on(anchor)[0].id.clone();

        let starred = schedule.with_star_toggled(anchor, &task_id);
        assert!(starred.tasks_on(anchor)[0].starred);

        let reverted = starred.with_star_toggled(anchor, &task_id);
        assert!(!reverted.tasks_on(anchor)[0].starred);
    }

    #[test]
    fn checklist_toggle_flips_only_the_matching_item() {
        let mut draft = TaskDraft::titled("Prepare talk");
        draft.checklist = vec!["Slides".to_string(), "Dry run".to_string()];
        let anchor = day(2026, 5, 11);
        let schedule = Schedule::default().with_task_added(anchor, &draft, Recurrence::None);
        let task = &schedule.tasks_on(anchor)[0];
        let (task_id, item_id) = (task.id.clone(), task.checklist[0].id.clone());

        let toggled = schedule.with_checklist_toggled(anchor, &task_id, &item_id);
        let task = &toggled.tasks_on(anchor)[0];
        assert!(task.checklist[0].done);
        assert!(!task.checklist[1].done);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let anchor = day(2026, 7, 1);
        let schedule = Schedule::default().with_task_added(
            anchor,
            &TaskDraft::titled("Mow lawn"),
            Recurrence::None,
        );

        let untouched = schedule
            .with_task_removed(anchor, "missing")
            .with_star_toggled(anchor, "missing")
            .with_checklist_toggled(anchor, "missing", "also-missing");
        assert_eq!(untouched.task_count(), 1);
        assert!(!untouched.tasks_on(anchor)[0].starred);
    }

    #[test]
    fn migration_moves_an_inbox_item_exactly_once() {
        let planner = Planner::default().with_inbox_captured("Renew passport", true);
        let item_id = planner.inbox[0].id.clone();
        let target = day(2026, 9, 3);

        let migrated = planner.with_inbox_item_scheduled(&item_id, target);
        assert!(migrated.inbox_item(&item_id).is_none());
        let tasks = migrated.schedule.tasks_on(target);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Renew passport");
        assert!(tasks[0].starred, "star must carry over");
        assert_eq!(tasks[0].details, INBOX_MIGRATION_NOTE);
        assert!(tasks[0].checklist.is_empty());

        let repeated = migrated.with_inbox_item_scheduled(&item_id, target);
        assert_eq!(repeated.schedule.tasks_on(target).len(), 1);
        assert_eq!(repeated.inbox.len(), migrated.inbox.len());
    }

    #[test]
    fn capture_prepends_and_inbox_toggles_are_involutions() {
        let planner = Planner::default()
            .with_inbox_captured("First", false)
            .with_inbox_captured("Second", false);
        assert_eq!(planner.inbox[0].text, "Second");

        let item_id = planner.inbox[1].id.clone();
        let toggled = planner.with_inbox_toggled(&item_id).with_inbox_starred(&item_id);
        assert!(toggled.inbox[1].done);
        assert!(toggled.inbox[1].starred);

        let reverted = toggled.with_inbox_toggled(&item_id).with_inbox_starred(&item_id);
        assert!(!reverted.inbox[1].done);
        assert!(!reverted.inbox[1].starred);

        let unchanged = reverted.with_inbox_removed("missing");
        assert_eq!(unchanged.inbox.len(), 2);
    }

    #[test]
    fn stats_count_tasks_stars_and_checklist_progress() {
        let today = day(2026, 8, 6);
        let mut draft = TaskDraft::titled("Ship release");
        draft.checklist = vec!["Tag".to_string(), "Announce".to_string()];
        let schedule = Schedule::default()
            .with_task_added(today, &draft, Recurrence::None)
            .with_task_added(
                today - chrono::Duration::days(2),
                &TaskDraft::titled("Retro"),
                Recurrence::None,
            );
        let task_id = schedule.tasks_on(today)[0].id.clone();
        let item_id = schedule.tasks_on(today)[0].checklist[0].id.clone();
        let planner = Planner {
            schedule: schedule
                .with_star_toggled(today, &task_id)
                .with_checklist_toggled(today, &task_id, &item_id),
            inbox: Vec::new(),
        };

        let stats = planner.stats(today);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.starred_tasks, 1);
        assert_eq!(stats.checklist_total, 2);
        assert_eq!(stats.checklist_done, 1);
        assert_eq!(stats.completion_rate(), 50);
        assert_eq!(stats.daily_counts.len(), 30);
        assert_eq!(stats.daily_counts.last(), Some(&(today, 1)));
        assert_eq!(stats.daily_counts[27], (today - chrono::Duration::days(2), 1));
    }

    #[test]
    fn date_keys_are_zero_padded_and_round_trip() {
        let date = day(2026, 1, 7);
        let key = format_date_key(date);
        assert_eq!(key, "2026-01-07");
        assert_eq!(parse_date_key(&key), Some(date));
        assert_eq!(parse_date_key("not-a-date"), None);
    }

    #[test]
    fn generated_ids_are_short_alphanumeric() {
        let id = generate_id();
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_id(), id);
    }
}
