pub mod cli;
pub mod dashboard;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use tracing::{debug, info};

use taskflow_core::config::Config;
use taskflow_core::filter::StatusFilter;
use taskflow_core::task::Priority;

use crate::dashboard::Dashboard;
use crate::render::Renderer;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let args = cli::GlobalCli::parse_from(raw_args);
    cli::init_tracing(args.verbose, args.quiet)?;

    info!(
        verbose = args.verbose,
        quiet = args.quiet,
        "starting taskflow demo session"
    );

    let mut cfg = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    cfg.apply_overrides(args.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let status = StatusFilter::parse(&args.status)?;
    let now = Utc::now();

    let mut dashboard = if args.no_seed {
        Dashboard::new(&cfg)?
    } else {
        Dashboard::with_demo_tasks(&cfg, now)?
    };
    dashboard.subscribe(|event| debug!(?event, "store changed"));

    let mut renderer = Renderer::new(&cfg)?;
    let end = demo_session(&mut dashboard, now)?;

    dashboard.set_search(args.search);
    dashboard.set_status_filter(status);
    renderer.print_dashboard(&dashboard.view(), end)?;

    info!("done");
    Ok(())
}

/// Walks the form lifecycle the way a user session would: create a task
/// through the dialog, toggle and edit existing ones, and abandon one
/// submission mid-flight.
fn demo_session(
    dashboard: &mut Dashboard,
    start: DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    let step = dashboard.form_delay() + Duration::seconds(1);
    let mut now = start;

    dashboard.open_create_form();
    if let Some(form) = dashboard.form_mut() {
        form.title = "Prepare sprint demo".to_string();
        form.description = "Walk through the dashboard with the team".to_string();
        form.priority = Priority::High;
    }
    dashboard.submit_form(now)?;
    now += step;
    dashboard.tick(now);

    if let Some(id) = dashboard.store().tasks().first().map(|task| task.id) {
        now += Duration::seconds(1);
        dashboard.toggle_status(id, now);
    }

    if let Some(id) = dashboard.store().tasks().last().map(|task| task.id) {
        dashboard.open_edit_form(id);
        if let Some(form) = dashboard.form_mut() {
            form.description.push_str(" (reviewed)");
        }
        dashboard.submit_form(now)?;
        now += step;
        dashboard.tick(now);
    }

    // an abandoned dialog takes its in-flight submission with it
    dashboard.open_create_form();
    if let Some(form) = dashboard.form_mut() {
        form.title = "Scratch task".to_string();
        form.description = "Closed before the submission settled".to_string();
    }
    dashboard.submit_form(now)?;
    dashboard.close_form();
    now += step;
    dashboard.tick(now);

    Ok(now)
}
