use anyhow::anyhow;
use tracing::trace;

use crate::task::{
  Status,
  Task
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum StatusFilter {
  #[default]
  All,
  Todo,
  InProgress,
  Completed
}

impl StatusFilter {
  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    match text
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(Self::All),
      | "todo" => Ok(Self::Todo),
      | "in-progress" => {
        Ok(Self::InProgress)
      }
      | "completed" => {
        Ok(Self::Completed)
      }
      | other => Err(anyhow!(
        "unknown status filter: \
         {other}"
      ))
    }
  }

  fn admits(
    self,
    status: Status
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Todo => {
        status == Status::Todo
      }
      | Self::InProgress => {
        status == Status::InProgress
      }
      | Self::Completed => {
        status == Status::Completed
      }
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
  pub search: String,
  pub status: StatusFilter
}

impl TaskQuery {
  pub fn new(
    search: impl Into<String>,
    status: StatusFilter
  ) -> Self {
    Self {
      search: search.into(),
      status
    }
  }

  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    let ok = self
      .status
      .admits(task.status)
      && matches_search(
        &self.search,
        task
      );
    trace!(id = %task.id, ok, "query evaluation");
    ok
  }

  pub fn apply<'a>(
    &self,
    tasks: &'a [Task]
  ) -> Vec<&'a Task> {
    tasks
      .iter()
      .filter(|task| self.matches(task))
      .collect()
  }
}

fn matches_search(
  term: &str,
  task: &Task
) -> bool {
  if term.is_empty() {
    return true;
  }
  let needle =
    term.to_ascii_lowercase();
  task
    .title
    .to_ascii_lowercase()
    .contains(&needle)
    || task
      .description
      .to_ascii_lowercase()
      .contains(&needle)
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct TaskCounts {
  pub total:       usize,
  pub todo:        usize,
  pub in_progress: usize,
  pub completed:   usize
}

impl TaskCounts {
  pub fn tally(
    tasks: &[Task]
  ) -> Self {
    let mut counts = Self::default();
    for task in tasks {
      counts.total += 1;
      match task.status {
        | Status::Todo => {
          counts.todo += 1
        }
        | Status::InProgress => {
          counts.in_progress += 1
        }
        | Status::Completed => {
          counts.completed += 1
        }
      }
    }
    counts
  }
}
