use crate::error::{Result, StrideError};
use crate::types::FormatKind;
use serde::Serialize;

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Where and in which format one coding agent expects its command files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub directory: &'static str,
    /// Including the leading dot, e.g. `.prompt.md`.
    pub extension: &'static str,
    pub format: FormatKind,
    /// `{command}` or `stride-{command}`.
    pub filename_pattern: &'static str,
    /// Installed under the user's home directory rather than the project.
    pub global: bool,
}

impl AgentConfig {
    pub fn filename(&self, command: &str) -> String {
        format!(
            "{}{}",
            self.filename_pattern.replace("{command}", command),
            self.extension
        )
    }

    /// Relative destination path; global agents keep their `~/` prefix.
    pub fn destination(&self, command: &str) -> String {
        format!("{}/{}", self.directory, self.filename(command))
    }
}

const fn agent(
    key: &'static str,
    name: &'static str,
    directory: &'static str,
    extension: &'static str,
    format: FormatKind,
    filename_pattern: &'static str,
) -> AgentConfig {
    AgentConfig {
        key,
        name,
        directory,
        extension,
        format,
        filename_pattern,
        global: false,
    }
}

const PREFIXED: &str = "stride-{command}";
const BARE: &str = "{command}";

#[rustfmt::skip]
const BUILTIN_AGENTS: [AgentConfig; 20] = [
    agent("claude", "Claude Code", ".claude/commands/stride", ".md", FormatKind::YamlRichMetadata, BARE),
    agent("cline", "Cline", ".clinerules/workflows", ".md", FormatKind::MarkdownHeading, PREFIXED),
    agent("auggie", "Auggie", ".augment/commands", ".md", FormatKind::YamlArguments, PREFIXED),
    agent("codebuddy", "CodeBuddy", ".codebuddy/commands/stride", ".md", FormatKind::YamlRichMetadata, BARE),
    agent("costrict", "Costrict", ".cospec/openspec/commands", ".md", FormatKind::YamlArguments, PREFIXED),
    agent("qoder", "Qoder", ".qoder/commands/stride", ".md", FormatKind::YamlRichMetadata, BARE),
    agent("qwen", "Qwen", ".qwen/commands", ".toml", FormatKind::Toml, PREFIXED),
    agent("roocode", "RooCode", ".roo/commands", ".md", FormatKind::MarkdownHeading, PREFIXED),
    agent("crush", "Crush", ".crush/commands/stride", ".md", FormatKind::YamlRichMetadata, BARE),
    agent("cursor", "Cursor", ".cursor/commands", ".md", FormatKind::YamlNameId, PREFIXED),
    agent("factory", "Factory Droid", ".factory/commands", ".md", FormatKind::YamlArguments, PREFIXED),
    agent("gemini", "Gemini CLI", ".gemini/commands/stride", ".toml", FormatKind::Toml, BARE),
    agent("opencode", "OpenCode", ".opencode/command", ".md", FormatKind::YamlXmlTags, PREFIXED),
    agent("kilocode", "KiloCode", ".kilocode/workflows", ".md", FormatKind::NoFrontmatter, PREFIXED),
    AgentConfig {
        global: true,
        ..agent("codex", "Codex", "~/.codex/prompts", ".md", FormatKind::YamlArguments, PREFIXED)
    },
    agent("github-copilot", "GitHub Copilot", ".github/prompts", ".prompt.md", FormatKind::YamlGithubCopilot, PREFIXED),
    agent("amazon-q", "Amazon Q", ".amazonq/prompts", ".md", FormatKind::YamlXmlTags, PREFIXED),
    agent("antigravity", "Antigravity", ".agent/workflows", ".md", FormatKind::YamlRichMetadata, PREFIXED),
    agent("windsurf", "Windsurf", ".windsurf/workflows", ".md", FormatKind::YamlAutoExec, PREFIXED),
    agent("iflow", "iFlow", ".iflow/commands", ".md", FormatKind::YamlNameId, PREFIXED),
];

// ---------------------------------------------------------------------------
// AgentRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentConfig>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentConfig>) -> Self {
        Self { agents }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_AGENTS.to_vec())
    }

    pub fn get(&self, key: &str) -> Result<&AgentConfig> {
        self.agents
            .iter()
            .find(|a| a.key == key)
            .ok_or_else(|| StrideError::UnknownAgent {
                name: key.to_string(),
                available: self.keys().join(", "),
            })
    }

    /// Agent keys in alphabetical order.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.agents.iter().map(|a| a.key).collect();
        keys.sort_unstable();
        keys
    }

    /// All agents, sorted by key.
    pub fn agents(&self) -> Vec<&AgentConfig> {
        let mut agents: Vec<&AgentConfig> = self.agents.iter().collect();
        agents.sort_by_key(|a| a.key);
        agents
    }

    pub fn by_format(&self, kind: FormatKind) -> Vec<&AgentConfig> {
        self.agents().into_iter().filter(|a| a.format == kind).collect()
    }

    pub fn destination(&self, key: &str, command: &str) -> Result<String> {
        Ok(self.get(key)?.destination(command))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_has_twenty_unique_agents() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.len(), 20);
        let keys: HashSet<_> = registry.keys().into_iter().collect();
        assert_eq!(keys.len(), 20);
    }

    #[test]
    fn keys_are_sorted() {
        let keys = AgentRegistry::builtin().keys();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first(), Some(&"amazon-q"));
    }

    #[test]
    fn every_format_has_an_agent() {
        let registry = AgentRegistry::builtin();
        for &kind in FormatKind::all() {
            assert!(!registry.by_format(kind).is_empty(), "no agent for {kind}");
        }
    }

    #[test]
    fn unknown_agent_lists_available() {
        let err = AgentRegistry::builtin().get("vim").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown agent 'vim'"));
        assert!(msg.contains("claude"));
        assert!(msg.contains("windsurf"));
    }

    #[test]
    fn destinations() {
        let registry = AgentRegistry::builtin();
        assert_eq!(
            registry.destination("claude", "plan").unwrap(),
            ".claude/commands/stride/plan.md"
        );
        assert_eq!(
            registry.destination("github-copilot", "init").unwrap(),
            ".github/prompts/stride-init.prompt.md"
        );
        assert_eq!(
            registry.destination("gemini", "status").unwrap(),
            ".gemini/commands/stride/status.toml"
        );
        assert_eq!(
            registry.destination("codex", "plan").unwrap(),
            "~/.codex/prompts/stride-plan.md"
        );
        assert!(registry.get("codex").unwrap().global);
        assert!(!registry.get("claude").unwrap().global);
    }

    #[test]
    fn toml_agents_use_toml_extension() {
        let registry = AgentRegistry::builtin();
        for agent in registry.by_format(FormatKind::Toml) {
            assert_eq!(agent.extension, ".toml");
        }
        let keys: Vec<_> = registry
            .by_format(FormatKind::Toml)
            .iter()
            .map(|a| a.key)
            .collect();
        assert_eq!(keys, vec!["gemini", "qwen"]);
    }
}
