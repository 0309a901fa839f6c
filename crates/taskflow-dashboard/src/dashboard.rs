use anyhow::anyhow;
use chrono::{DateTime, Days, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use taskflow_core::config::Config;
use taskflow_core::filter::{StatusFilter, TaskCounts, TaskQuery};
use taskflow_core::form::{FormMode, TaskForm};
use taskflow_core::store::{TaskEvent, TaskStore};
use taskflow_core::task::{Priority, Status, Task, TaskDraft};

/// The dashboard shell: owns the store, the active query, and the one
/// form dialog that may be open at a time. UI layers read `view()` and
/// call the methods; they never touch the store directly.
#[derive(Debug)]
pub struct Dashboard {
    store: TaskStore,
    form: Option<TaskForm>,
    form_delay: Duration,
    query: TaskQuery,
}

#[derive(Debug)]
pub struct DashboardView<'a> {
    pub rows: Vec<&'a Task>,
    pub counts: TaskCounts,
}

impl Dashboard {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            store: TaskStore::new(cfg.insert_order()?),
            form: None,
            form_delay: cfg.form_delay()?,
            query: TaskQuery::default(),
        })
    }

    pub fn with_demo_tasks(cfg: &Config, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let mut dashboard = Self::new(cfg)?;
        for draft in demo_tasks(now) {
            dashboard.store.create(draft, now);
        }
        info!(count = dashboard.store.len(), "seeded demo tasks");
        Ok(dashboard)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn form_delay(&self) -> Duration {
        self.form_delay
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&TaskEvent) + 'static,
    {
        self.store.subscribe(listener);
    }

    pub fn form(&self) -> Option<&TaskForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut TaskForm> {
        self.form.as_mut()
    }

    #[tracing::instrument(skip(self))]
    pub fn open_create_form(&mut self) {
        info!("opening create form");
        self.form = Some(TaskForm::create());
    }

    #[tracing::instrument(skip(self))]
    pub fn open_edit_form(&mut self, id: Uuid) -> bool {
        let Some(task) = self.store.get(id) else {
            debug!(%id, "edit requested for unknown task");
            return false;
        };

        info!(%id, "opening edit form");
        self.form = Some(TaskForm::edit(task));
        true
    }

    /// Drops the open form. A submission still in flight goes with it, so
    /// nothing can reach the store after the dialog is gone.
    #[tracing::instrument(skip(self))]
    pub fn close_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };

        if form.is_pending() {
            info!("form closed with a submission in flight; discarding it");
        } else {
            debug!("form closed");
        }
    }

    pub fn submit_form(&mut self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let form = self
            .form
            .as_mut()
            .ok_or_else(|| anyhow!("no form is open"))?;
        form.submit(self.form_delay, now)
    }

    /// Settles a ready submission: create or update through the store,
    /// then close the form. Returns whether a mutation was applied — an
    /// edit whose target vanished during the delay settles as a no-op.
    #[tracing::instrument(skip(self, now))]
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        let Some(draft) = form.poll(now) else {
            return false;
        };

        let mode = form.mode();
        self.form = None;

        match mode {
            FormMode::Create => {
                let id = self.store.create(draft, now);
                info!(%id, "create submission applied");
                true
            }
            FormMode::Edit(id) => {
                let applied = self.store.update(id, draft, now);
                if applied {
                    info!(%id, "edit submission applied");
                } else {
                    debug!(%id, "edit target vanished before the submission settled");
                }
                applied
            }
        }
    }

    pub fn delete_task(&mut self, id: Uuid) -> bool {
        self.store.delete(id)
    }

    pub fn toggle_status(&mut self, id: Uuid, now: DateTime<Utc>) -> bool {
        self.store.toggle_status(id, now)
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.search = term.into();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            rows: self.query.apply(self.store.tasks()),
            counts: TaskCounts::tally(self.store.tasks()),
        }
    }
}

fn demo_tasks(now: DateTime<Utc>) -> Vec<TaskDraft> {
    let today = now.date_naive();
    vec![
        TaskDraft {
            title: "Complete project proposal".to_string(),
            description: "Finish the quarterly project proposal for the new client".to_string(),
            priority: Priority::High,
            status: Status::InProgress,
            due: today.checked_add_days(Days::new(5)),
        },
        TaskDraft {
            title: "Review team performance".to_string(),
            description: "Conduct monthly team performance reviews".to_string(),
            priority: Priority::Medium,
            status: Status::Todo,
            due: today.checked_add_days(Days::new(10)),
        },
        TaskDraft {
            title: "Update documentation".to_string(),
            description: "Update project documentation with recent changes".to_string(),
            priority: Priority::Low,
            status: Status::Completed,
            due: today.checked_sub_days(Days::new(2)),
        },
    ]
}
