use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SprintState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintState {
    Uninitialized,
    Proposed,
    Active,
    Completed,
}

impl SprintState {
    pub fn all() -> &'static [SprintState] {
        &[
            SprintState::Uninitialized,
            SprintState::Proposed,
            SprintState::Active,
            SprintState::Completed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SprintState::Uninitialized => "uninitialized",
            SprintState::Proposed => "proposed",
            SprintState::Active => "active",
            SprintState::Completed => "completed",
        }
    }
}

impl fmt::Display for SprintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SprintState {
    type Err = crate::error::StrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uninitialized" => Ok(SprintState::Uninitialized),
            "proposed" => Ok(SprintState::Proposed),
            "active" => Ok(SprintState::Active),
            "completed" => Ok(SprintState::Completed),
            _ => Err(crate::error::StrideError::InvalidSprintState(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Proposal,
    Plan,
    Design,
    Implementation,
    Retrospective,
}

impl DocumentKind {
    pub fn all() -> &'static [DocumentKind] {
        &[
            DocumentKind::Proposal,
            DocumentKind::Plan,
            DocumentKind::Design,
            DocumentKind::Implementation,
            DocumentKind::Retrospective,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Proposal => "proposal",
            DocumentKind::Plan => "plan",
            DocumentKind::Design => "design",
            DocumentKind::Implementation => "implementation",
            DocumentKind::Retrospective => "retrospective",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            DocumentKind::Proposal => "proposal.md",
            DocumentKind::Plan => "plan.md",
            DocumentKind::Design => "design.md",
            DocumentKind::Implementation => "implementation.md",
            DocumentKind::Retrospective => "retrospective.md",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = crate::error::StrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_suffix(".md").unwrap_or(s);
        match name {
            "proposal" => Ok(DocumentKind::Proposal),
            "plan" => Ok(DocumentKind::Plan),
            "design" => Ok(DocumentKind::Design),
            "implementation" => Ok(DocumentKind::Implementation),
            "retrospective" => Ok(DocumentKind::Retrospective),
            _ => Err(crate::error::StrideError::InvalidDocumentKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// FormatKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
    YamlRichMetadata,
    YamlNameId,
    YamlArguments,
    YamlXmlTags,
    YamlAutoExec,
    YamlGithubCopilot,
    Toml,
    MarkdownHeading,
    NoFrontmatter,
}

impl FormatKind {
    pub fn all() -> &'static [FormatKind] {
        &[
            FormatKind::YamlRichMetadata,
            FormatKind::YamlNameId,
            FormatKind::YamlArguments,
            FormatKind::YamlXmlTags,
            FormatKind::YamlAutoExec,
            FormatKind::YamlGithubCopilot,
            FormatKind::Toml,
            FormatKind::MarkdownHeading,
            FormatKind::NoFrontmatter,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatKind::YamlRichMetadata => "yaml-rich-metadata",
            FormatKind::YamlNameId => "yaml-name-id",
            FormatKind::YamlArguments => "yaml-arguments",
            FormatKind::YamlXmlTags => "yaml-xml-tags",
            FormatKind::YamlAutoExec => "yaml-auto-exec",
            FormatKind::YamlGithubCopilot => "yaml-github-copilot",
            FormatKind::Toml => "toml",
            FormatKind::MarkdownHeading => "markdown-heading",
            FormatKind::NoFrontmatter => "no-frontmatter",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FormatKind {
    type Err = crate::error::StrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::error::StrideError::UnknownFormat(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// WrapperStyle / PlaceholderSyntax
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperStyle {
    Yaml,
    Toml,
    Heading,
    None,
}

impl WrapperStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            WrapperStyle::Yaml => "yaml",
            WrapperStyle::Toml => "toml",
            WrapperStyle::Heading => "heading",
            WrapperStyle::None => "none",
        }
    }
}

impl fmt::Display for WrapperStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderSyntax {
    /// Token left in the body verbatim.
    Bare,
    /// Every occurrence rewritten to `{{args}}`.
    Braced,
    /// Token kept in the body and declared as an `arguments:` field.
    ArgumentsField,
    /// Token placed on its own line ahead of the body.
    Leading,
    /// Token wrapped in a `<UserRequest>` block ahead of the body.
    Tagged,
}

impl PlaceholderSyntax {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderSyntax::Bare => "bare",
            PlaceholderSyntax::Braced => "braced",
            PlaceholderSyntax::ArgumentsField => "arguments-field",
            PlaceholderSyntax::Leading => "leading",
            PlaceholderSyntax::Tagged => "tagged",
        }
    }
}

impl fmt::Display for PlaceholderSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
