use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Local, NaiveDate, Utc};
use unicode_width::UnicodeWidthStr;

use taskflow_core::config::Config;
use taskflow_core::task::Task;

use crate::dashboard::DashboardView;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, view, now))]
    pub fn print_dashboard(
        &mut self,
        view: &DashboardView<'_>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let counts = view.counts;
        writeln!(
            out,
            "{} total / {} todo / {} in progress / {} completed",
            counts.total, counts.todo, counts.in_progress, counts.completed
        )?;
        writeln!(out)?;

        if view.rows.is_empty() {
            writeln!(out, "No tasks match.")?;
            return Ok(());
        }

        let headers = ["Status", "Pri", "Title", "Description", "Due", "Updated"];
        let today = now.date_naive();
        let rows: Vec<Vec<String>> = view.rows.iter().map(|task| self.row(task, today)).collect();

        write_table(&mut out, &headers, rows)?;
        Ok(())
    }

    fn row(&self, task: &Task, today: NaiveDate) -> Vec<String> {
        let due = task
            .due
            .map(|due| due.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let due = if task.is_overdue(today) {
            self.paint(&due, "31")
        } else {
            due
        };

        let updated = task
            .modified
            .with_timezone(&Local)
            .format("%b %d %H:%M")
            .to_string();

        vec![
            task.status.to_string(),
            task.priority.to_string(),
            task.title.clone(),
            task.description.clone(),
            due,
            updated,
        ]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(*header))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$}  ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$}  ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible);
            write!(writer, "{}{}  ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
