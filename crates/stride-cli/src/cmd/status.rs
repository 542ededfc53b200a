use crate::output::{print_json, print_table};
use crate::workspace;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use stride_core::types::SprintState;

#[derive(Serialize)]
struct SprintSummary {
    id: String,
    title: String,
    state: SprintState,
    completed_strides: usize,
    total_strides: usize,
    percent: u32,
    blockers: usize,
    stale: bool,
}

pub fn run(
    root: &Path,
    config_path: Option<&Path>,
    state: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = workspace::load_config(root, config_path)?;
    let state: Option<SprintState> = state.map(str::parse).transpose()?;

    let summaries: Vec<SprintSummary> = workspace::analyze_sprints(root, &config, Utc::now())?
        .into_iter()
        .filter(|(_, report)| state.map_or(true, |s| report.state == s))
        .map(|(id, report)| SprintSummary {
            title: if report.title.is_empty() {
                id.clone()
            } else {
                report.title
            },
            id,
            state: report.state,
            completed_strides: report.progress.completed_strides,
            total_strides: report.progress.total_strides,
            percent: report.progress.percent,
            blockers: report.blockers.len(),
            stale: report.stale,
        })
        .collect();

    if json {
        print_json(&summaries)?;
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No sprints.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.state.to_string(),
                format!("{}/{} ({}%)", s.completed_strides, s.total_strides, s.percent),
                s.blockers.to_string(),
                if s.stale { "stale".to_string() } else { String::new() },
                s.title.clone(),
            ]
        })
        .collect();
    print_table(
        &["SPRINT", "STATE", "STRIDES", "BLOCKERS", "STALE", "TITLE"],
        rows,
    );
    Ok(())
}
