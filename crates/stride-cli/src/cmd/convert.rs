use crate::output::{print_json, print_table};
use crate::workspace;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use stride_core::emit::{self, FormatSpec};
use stride_core::registry::AgentRegistry;
use stride_core::template::CommandTemplate;

pub struct ConvertArgs<'a> {
    pub template: &'a Path,
    pub agent: Option<&'a str>,
    pub format: Option<&'a str>,
    pub command: Option<&'a str>,
    pub all: bool,
}

pub fn run(
    root: &Path,
    config_path: Option<&Path>,
    args: ConvertArgs<'_>,
    json: bool,
) -> anyhow::Result<()> {
    let config = workspace::load_config(root, config_path)?;
    let raw = std::fs::read_to_string(args.template)
        .with_context(|| format!("failed to read template {}", args.template.display()))?;

    let command = match args.command {
        Some(c) => c.to_string(),
        None => command_from_path(args.template),
    };
    let template = CommandTemplate::parse_with_placeholder(&raw, &config.placeholder)
        .with_context(|| format!("failed to parse template {}", args.template.display()))?
        .with_command(command);

    let registry = AgentRegistry::builtin();

    if args.all {
        return convert_all(&registry, &template, json);
    }

    let (spec, agent) = match (args.agent, args.format) {
        (Some(key), _) => {
            let agent = registry.get(key)?;
            (FormatSpec::by_kind(agent.format), Some(agent))
        }
        (None, Some(name)) => (FormatSpec::by_name(name)?, None),
        (None, None) => anyhow::bail!("one of --agent, --format or --all is required"),
    };

    let content = emit::emit(&template, spec)
        .with_context(|| format!("failed to convert {} to {}", args.template.display(), spec.kind))?;
    tracing::info!(command = %template.command, format = %spec.kind, bytes = content.len(), "converted");

    if json {
        #[derive(Serialize)]
        struct ConvertOutput<'a> {
            command: &'a str,
            format: &'a str,
            agent: Option<&'a str>,
            destination: Option<String>,
            content: &'a str,
        }

        print_json(&ConvertOutput {
            command: &template.command,
            format: spec.kind.as_str(),
            agent: agent.map(|a| a.key),
            destination: agent.map(|a| a.destination(&template.command)),
            content: &content,
        })?;
        return Ok(());
    }

    print!("{content}");
    Ok(())
}

fn convert_all(
    registry: &AgentRegistry,
    template: &CommandTemplate,
    json: bool,
) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct AgentResult {
        agent: &'static str,
        format: &'static str,
        destination: String,
        bytes: Option<usize>,
        error: Option<String>,
    }

    let results: Vec<AgentResult> = registry
        .agents()
        .into_iter()
        .map(|agent| {
            let outcome = emit::emit(template, FormatSpec::by_kind(agent.format));
            if let Err(e) = &outcome {
                tracing::warn!(agent = agent.key, error = %e, "conversion failed");
            }
            AgentResult {
                agent: agent.key,
                format: agent.format.as_str(),
                destination: agent.destination(&template.command),
                bytes: outcome.as_ref().ok().map(String::len),
                error: outcome.err().map(|e| e.to_string()),
            }
        })
        .collect();
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    if json {
        print_json(&results)?;
    } else {
        let rows: Vec<Vec<String>> = results
            .iter()
            .map(|r| {
                vec![
                    r.agent.to_string(),
                    r.format.to_string(),
                    r.destination.clone(),
                    match (&r.bytes, &r.error) {
                        (Some(n), _) => n.to_string(),
                        (None, Some(e)) => format!("error: {e}"),
                        (None, None) => String::new(),
                    },
                ]
            })
            .collect();
        print_table(&["AGENT", "FORMAT", "DESTINATION", "BYTES"], rows);
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} agent conversion(s) failed", results.len());
    }
    Ok(())
}

/// `plan.md` and `stride-plan.md` both name the `plan` command.
fn command_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.strip_prefix("stride-")
        .map(str::to_string)
        .unwrap_or(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_from_paths() {
        assert_eq!(command_from_path(Path::new("templates/plan.md")), "plan");
        assert_eq!(command_from_path(Path::new("stride-init.md")), "init");
        assert_eq!(command_from_path(Path::new("status")), "status");
    }
}
