use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::task::{Status, Task, TaskDraft};

/// Where freshly created tasks land in the collection. Display order is
/// insertion order, so this is the one ordering policy for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrder {
    OldestFirst,
    NewestFirst,
}

impl std::str::FromStr for InsertOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest-first" | "append" => Ok(Self::OldestFirst),
            "newest-first" | "prepend" => Ok(Self::NewestFirst),
            other => Err(anyhow!("invalid insert order: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Created(Task),
    Updated(Task),
    Deleted(Uuid),
}

type Listener = Box<dyn Fn(&TaskEvent)>;

/// The authoritative in-memory task collection for one session. Mutations
/// either succeed or are silent no-ops on a missing id; observers are
/// notified after the collection has changed, never on a no-op.
pub struct TaskStore {
    tasks: Vec<Task>,
    insert_order: InsertOrder,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("insert_order", &self.insert_order)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TaskStore {
    pub fn new(insert_order: InsertOrder) -> Self {
        debug!(?insert_order, "initialized task store");
        Self {
            tasks: Vec::new(),
            insert_order,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&TaskEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[tracing::instrument(skip(self, draft, now))]
    pub fn create(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Uuid {
        let task = Task::from_draft(draft, now);
        let id = task.id;

        match self.insert_order {
            InsertOrder::OldestFirst => self.tasks.push(task.clone()),
            InsertOrder::NewestFirst => self.tasks.insert(0, task.clone()),
        }

        info!(%id, count = self.tasks.len(), "task created");
        self.emit(TaskEvent::Created(task));
        id
    }

    #[tracing::instrument(skip(self, draft, now))]
    pub fn update(&mut self, id: Uuid, draft: TaskDraft, now: DateTime<Utc>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(%id, "update for unknown task ignored");
            return false;
        };

        task.apply_draft(draft, now);
        let snapshot = task.clone();

        info!(%id, "task updated");
        self.emit(TaskEvent::Updated(snapshot));
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            debug!(%id, "delete for unknown task ignored");
            return false;
        }

        info!(%id, count = self.tasks.len(), "task deleted");
        self.emit(TaskEvent::Deleted(id));
        true
    }

    /// Two-state toggle: completed flips back to todo, everything else
    /// (todo and in-progress alike) lands on completed.
    #[tracing::instrument(skip(self, now))]
    pub fn toggle_status(&mut self, id: Uuid, now: DateTime<Utc>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(%id, "toggle for unknown task ignored");
            return false;
        };

        task.status = match task.status {
            Status::Completed => Status::Todo,
            Status::Todo | Status::InProgress => Status::Completed,
        };
        task.modified = now;
        let snapshot = task.clone();

        info!(%id, status = %snapshot.status, "task status toggled");
        self.emit(TaskEvent::Updated(snapshot));
        true
    }

    fn emit(&self, event: TaskEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}
