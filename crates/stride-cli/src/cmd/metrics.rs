use crate::output::{print_json, print_table};
use crate::workspace;
use chrono::Utc;
use std::path::Path;
use stride_core::metrics::calculate;
use stride_core::sprint::SprintReport;
use stride_core::types::{DocumentKind, SprintState};

pub fn run(root: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = workspace::load_config(root, config_path)?;
    let reports: Vec<SprintReport> = workspace::analyze_sprints(root, &config, Utc::now())?
        .into_iter()
        .map(|(_, report)| report)
        .collect();
    let metrics = calculate(&reports);

    if json {
        print_json(&metrics)?;
        return Ok(());
    }

    if metrics.counts.total == 0 {
        println!("No sprints.");
        return Ok(());
    }

    let counts = &metrics.counts;
    let tasks = &metrics.tasks;
    let summary = &metrics.summary;

    println!(
        "Health:     {}/100 ({})",
        summary.health_score, summary.overall_status
    );
    println!("Sprints:    {} total, {:.0}% completed", counts.total, counts.completion_rate);
    println!(
        "Tasks:      {}/{} ({:.0}%), {} pending",
        tasks.completed_tasks, tasks.total_tasks, tasks.task_completion_rate, tasks.pending_tasks
    );
    println!(
        "Strides:    {}/{} logged",
        tasks.completed_strides, tasks.total_strides
    );
    println!(
        "Velocity:   {:.1} tasks per completed sprint ({})",
        tasks.sprint_velocity, summary.productivity
    );
    println!(
        "Process:    {:.0}% adoption ({})",
        metrics.coverage.process_adoption_rate, summary.process_maturity
    );
    if counts.blocked > 0 || counts.stale > 0 {
        println!("Attention:  {} blocked, {} stale", counts.blocked, counts.stale);
    }

    println!();
    let rows: Vec<Vec<String>> = SprintState::all()
        .iter()
        .map(|&state| vec![state.to_string(), counts.by_state(state).to_string()])
        .collect();
    print_table(&["STATE", "SPRINTS"], rows);

    println!();
    let rows: Vec<Vec<String>> = DocumentKind::all()
        .iter()
        .map(|&kind| {
            let n = metrics.coverage.count(kind);
            vec![
                kind.as_str().to_string(),
                n.to_string(),
                format!("{:.0}%", n as f64 / counts.total as f64 * 100.0),
            ]
        })
        .collect();
    print_table(&["DOCUMENT", "SPRINTS", "COVERAGE"], rows);
    Ok(())
}
