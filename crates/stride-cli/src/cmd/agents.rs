use crate::output::{print_json, print_table};
use stride_core::registry::AgentRegistry;
use stride_core::types::FormatKind;

pub fn run(format: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = AgentRegistry::builtin();
    let agents = match format {
        Some(name) => {
            let kind: FormatKind = name.parse()?;
            registry.by_format(kind)
        }
        None => registry.agents(),
    };

    if json {
        print_json(&agents)?;
        return Ok(());
    }

    if agents.is_empty() {
        println!("No agents.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = agents
        .iter()
        .map(|a| {
            vec![
                a.key.to_string(),
                a.name.to_string(),
                a.format.to_string(),
                a.destination("{command}"),
            ]
        })
        .collect();
    print_table(&["KEY", "NAME", "FORMAT", "DESTINATION"], rows);
    Ok(())
}
