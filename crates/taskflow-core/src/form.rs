use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::task::{Priority, Status, Task, TaskDraft};

pub const DUE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Uuid),
}

#[derive(Debug, Clone)]
struct PendingSubmission {
    draft: TaskDraft,
    ready_at: DateTime<Utc>,
}

/// Edit buffer for one create/edit dialog. Submission goes through a
/// pending state that settles at `ready_at`; discarding the form (or
/// calling `cancel`) while it is pending means the draft is never
/// delivered, so a torn-down dialog cannot mutate the store.
#[derive(Debug, Clone)]
pub struct TaskForm {
    mode: FormMode,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    /// Raw field text; blank means no deadline.
    pub due: String,
    pending: Option<PendingSubmission>,
}

impl TaskForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            status: Status::default(),
            due: String::new(),
            pending: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            mode: FormMode::Edit(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            due: task
                .due
                .map(|due| due.format(DUE_FORMAT).to_string())
                .unwrap_or_default(),
            pending: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn validate(&self) -> anyhow::Result<TaskDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("title is required"));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(anyhow!("description is required"));
        }

        Ok(TaskDraft {
            title: title.to_string(),
            description: description.to_string(),
            priority: self.priority,
            status: self.status,
            due: parse_due(&self.due)?,
        })
    }

    /// Validates and arms the pending submission. Once this returns Ok the
    /// draft is frozen; settlement cannot fail, only be discarded.
    #[tracing::instrument(skip_all)]
    pub fn submit(&mut self, delay: Duration, now: DateTime<Utc>) -> anyhow::Result<()> {
        if self.pending.is_some() {
            return Err(anyhow!("a submission is already in flight"));
        }

        let draft = self.validate()?;
        info!(
            mode = ?self.mode,
            delay_ms = delay.num_milliseconds(),
            "submission accepted"
        );
        self.pending = Some(PendingSubmission {
            draft,
            ready_at: now + delay,
        });
        Ok(())
    }

    /// Yields the settled draft exactly once, after the delay has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<TaskDraft> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.ready_at);
        if !ready {
            return None;
        }

        let pending = self.pending.take()?;
        debug!(mode = ?self.mode, "submission settled");
        Some(pending.draft)
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!(mode = ?self.mode, "pending submission discarded");
        }
    }
}

fn parse_due(raw: &str) -> anyhow::Result<Option<NaiveDate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let due = NaiveDate::parse_from_str(trimmed, DUE_FORMAT)
        .with_context(|| format!("invalid due date: {trimmed}"))?;
    Ok(Some(due))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{FormMode, TaskForm};
    use crate::task::{Priority, Status, Task, TaskDraft};

    fn filled_form() -> TaskForm {
        let mut form = TaskForm::create();
        form.title = "Plan the retro".to_string();
        form.description = "Collect talking points".to_string();
        form
    }

    #[test]
    fn fresh_form_defaults_to_medium_and_todo() {
        let form = TaskForm::create();
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.priority, Priority::Medium);
        assert_eq!(form.status, Status::Todo);
        assert!(form.due.is_empty());
    }

    #[test]
    fn edit_form_is_prefilled_from_the_task() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let task = Task::from_draft(
            TaskDraft {
                title: "Fix the flaky login test".to_string(),
                description: "It times out on CI".to_string(),
                priority: Priority::High,
                status: Status::InProgress,
                due: NaiveDate::from_ymd_opt(2026, 3, 1),
            },
            now,
        );

        let form = TaskForm::edit(&task);
        assert_eq!(form.mode(), FormMode::Edit(task.id));
        assert_eq!(form.title, task.title);
        assert_eq!(form.priority, Priority::High);
        assert_eq!(form.status, Status::InProgress);
        assert_eq!(form.due, "2026-03-01");
    }

    #[test]
    fn blank_required_fields_block_validation() {
        let mut form = TaskForm::create();
        assert!(form.validate().is_err());

        form.title = "   ".to_string();
        form.description = "Something".to_string();
        assert!(form.validate().is_err());

        form.title = "Something".to_string();
        form.description = String::new();
        assert!(form.validate().is_err());
    }

    #[test]
    fn blank_due_maps_to_none_and_garbage_is_rejected() {
        let mut form = filled_form();

        form.due = "  ".to_string();
        let draft = form.validate().expect("valid draft");
        assert_eq!(draft.due, None);

        form.due = "2026-03-01".to_string();
        let draft = form.validate().expect("valid draft");
        assert_eq!(draft.due, NaiveDate::from_ymd_opt(2026, 3, 1));

        form.due = "next tuesday".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn submission_settles_only_after_the_delay() {
        let start = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let mut form = filled_form();

        form.submit(Duration::milliseconds(500), start)
            .expect("submit");
        assert!(form.is_pending());

        assert!(form.poll(start).is_none());
        assert!(form.poll(start + Duration::milliseconds(499)).is_none());

        let draft = form
            .poll(start + Duration::milliseconds(500))
            .expect("settled draft");
        assert_eq!(draft.title, "Plan the retro");

        assert!(!form.is_pending());
        assert!(form.poll(start + Duration::seconds(10)).is_none());
    }

    #[test]
    fn cancel_discards_the_pending_draft() {
        let start = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let mut form = filled_form();

        form.submit(Duration::milliseconds(500), start)
            .expect("submit");
        form.cancel();

        assert!(!form.is_pending());
        assert!(form.poll(start + Duration::seconds(10)).is_none());
    }

    #[test]
    fn a_second_submit_while_pending_is_an_error() {
        let start = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let mut form = filled_form();

        form.submit(Duration::milliseconds(500), start)
            .expect("submit");
        assert!(form.submit(Duration::milliseconds(500), start).is_err());
    }
}
