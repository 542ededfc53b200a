use crate::output::{print_json, print_table};
use serde::Serialize;
use stride_core::emit::{FormatSpec, KeyAllowlist};
use stride_core::registry::AgentRegistry;

pub fn run(json: bool) -> anyhow::Result<()> {
    let registry = AgentRegistry::builtin();

    #[derive(Serialize)]
    struct FormatRow {
        format: &'static str,
        wrapper: &'static str,
        placeholder: &'static str,
        keys: KeyAllowlist,
        agents: Vec<&'static str>,
    }

    let rows: Vec<FormatRow> = FormatSpec::all()
        .iter()
        .map(|spec| FormatRow {
            format: spec.kind.as_str(),
            wrapper: spec.wrapper.as_str(),
            placeholder: spec.placeholder.as_str(),
            keys: spec.key_allowlist,
            agents: registry.by_format(spec.kind).iter().map(|a| a.key).collect(),
        })
        .collect();

    if json {
        print_json(&rows)?;
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let keys = match r.keys {
                KeyAllowlist::All => "*".to_string(),
                KeyAllowlist::Only(keys) if keys.is_empty() => "-".to_string(),
                KeyAllowlist::Only(keys) => keys.join(","),
            };
            vec![
                r.format.to_string(),
                r.wrapper.to_string(),
                r.placeholder.to_string(),
                keys,
                r.agents.join(","),
            ]
        })
        .collect();
    print_table(&["FORMAT", "WRAPPER", "PLACEHOLDER", "KEYS", "AGENTS"], table);
    Ok(())
}
