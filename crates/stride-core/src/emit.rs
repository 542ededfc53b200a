use crate::error::{Result, StrideError};
use crate::template::{CommandTemplate, Metadata, STRIDE_END, STRIDE_START};
use crate::types::{FormatKind, PlaceholderSyntax, WrapperStyle};
use serde::Serialize;

pub const BRACED_ARGS: &str = "{{args}}";

// ---------------------------------------------------------------------------
// KeyAllowlist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAllowlist {
    All,
    Only(&'static [&'static str]),
}

impl KeyAllowlist {
    pub fn permits(&self, key: &str) -> bool {
        match self {
            KeyAllowlist::All => true,
            KeyAllowlist::Only(keys) => keys.contains(&key),
        }
    }
}

// ---------------------------------------------------------------------------
// FormatSpec
// ---------------------------------------------------------------------------

/// Declarative description of one target syntax. Entries are fn pointers so
/// the whole table lives in a static.
pub struct FormatSpec {
    pub kind: FormatKind,
    pub key_allowlist: KeyAllowlist,
    pub wrapper: WrapperStyle,
    pub placeholder: PlaceholderSyntax,
    /// Keys filled in when the template does not define them.
    pub defaults: fn(&CommandTemplate) -> Vec<(&'static str, String)>,
    /// Keys that always override the template.
    pub fixed: &'static [(&'static str, &'static str)],
    /// Optional rewrite of the marker-enclosed body.
    pub decorate: Option<fn(&str) -> String>,
}

impl FormatSpec {
    pub fn by_kind(kind: FormatKind) -> &'static FormatSpec {
        FORMATS
            .iter()
            .find(|f| f.kind == kind)
            .unwrap_or(&FORMATS[0])
    }

    pub fn by_name(name: &str) -> Result<&'static FormatSpec> {
        let kind: FormatKind = name.parse()?;
        Ok(Self::by_kind(kind))
    }

    pub fn all() -> &'static [FormatSpec] {
        &FORMATS
    }
}

impl std::fmt::Debug for FormatSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatSpec")
            .field("kind", &self.kind)
            .field("key_allowlist", &self.key_allowlist)
            .field("wrapper", &self.wrapper)
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Synthesized keys
// ---------------------------------------------------------------------------

fn no_defaults(_: &CommandTemplate) -> Vec<(&'static str, String)> {
    Vec::new()
}

fn rich_defaults(t: &CommandTemplate) -> Vec<(&'static str, String)> {
    let mut keys = Vec::new();
    if !t.command.is_empty() {
        keys.push(("name", format!("Stride: {}", display_name(&t.command))));
    }
    keys.push(("category", "Stride".to_string()));
    if !t.command.is_empty() {
        keys.push(("tags", format!("[stride, {}]", t.command)));
    }
    keys
}

fn name_id_defaults(t: &CommandTemplate) -> Vec<(&'static str, String)> {
    if t.command.is_empty() {
        return Vec::new();
    }
    vec![
        ("name", format!("/stride-{}", t.command)),
        ("id", format!("stride-{}", t.command)),
    ]
}

fn arguments_defaults(t: &CommandTemplate) -> Vec<(&'static str, String)> {
    vec![
        ("argument-hint", "command arguments".to_string()),
        ("arguments", t.placeholder.clone()),
    ]
}

fn heading_defaults(t: &CommandTemplate) -> Vec<(&'static str, String)> {
    if t.command.is_empty() {
        return Vec::new();
    }
    vec![("name", format!("Stride: {}", display_name(&t.command)))]
}

fn wrap_instructions(body: &str) -> String {
    format!("<Instructions>\n{body}\n</Instructions>")
}

// ---------------------------------------------------------------------------
// Dispatch table
// ---------------------------------------------------------------------------

static FORMATS: [FormatSpec; 9] = [
    FormatSpec {
        kind: FormatKind::YamlRichMetadata,
        key_allowlist: KeyAllowlist::All,
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::Bare,
        defaults: rich_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::YamlNameId,
        key_allowlist: KeyAllowlist::Only(&["name", "id"]),
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::Bare,
        defaults: name_id_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::YamlArguments,
        key_allowlist: KeyAllowlist::Only(&["description", "argument-hint", "arguments"]),
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::ArgumentsField,
        defaults: arguments_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::YamlXmlTags,
        key_allowlist: KeyAllowlist::Only(&["description"]),
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::Tagged,
        defaults: no_defaults,
        fixed: &[],
        decorate: Some(wrap_instructions),
    },
    FormatSpec {
        kind: FormatKind::YamlAutoExec,
        key_allowlist: KeyAllowlist::Only(&["description", "auto_execute"]),
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::Bare,
        defaults: no_defaults,
        fixed: &[("auto_execute", "true")],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::YamlGithubCopilot,
        key_allowlist: KeyAllowlist::Only(&["description", "mode", "model", "tools"]),
        wrapper: WrapperStyle::Yaml,
        placeholder: PlaceholderSyntax::Leading,
        defaults: no_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::Toml,
        key_allowlist: KeyAllowlist::Only(&["description"]),
        wrapper: WrapperStyle::Toml,
        placeholder: PlaceholderSyntax::Braced,
        defaults: no_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::MarkdownHeading,
        key_allowlist: KeyAllowlist::Only(&["name", "description"]),
        wrapper: WrapperStyle::Heading,
        placeholder: PlaceholderSyntax::Bare,
        defaults: heading_defaults,
        fixed: &[],
        decorate: None,
    },
    FormatSpec {
        kind: FormatKind::NoFrontmatter,
        key_allowlist: KeyAllowlist::Only(&[]),
        wrapper: WrapperStyle::None,
        placeholder: PlaceholderSyntax::Bare,
        defaults: no_defaults,
        fixed: &[],
        decorate: None,
    },
];

// ---------------------------------------------------------------------------
// Emission
// ---------------------------------------------------------------------------

/// Render `template` in the target syntax described by `spec`.
pub fn emit(template: &CommandTemplate, spec: &FormatSpec) -> Result<String> {
    tracing::debug!(format = %spec.kind, command = %template.command, "emitting template");

    if spec.placeholder == PlaceholderSyntax::ArgumentsField && !template.references_placeholder() {
        return Err(StrideError::Conversion(format!(
            "placeholder '{}' required by {} but absent from body",
            template.placeholder, spec.kind
        )));
    }

    let metadata = project_metadata(template, spec);
    let body = render_body(template, spec);

    let out = match spec.wrapper {
        WrapperStyle::Yaml => render_yaml(&metadata, &body)?,
        WrapperStyle::Toml => render_toml(&metadata, &body),
        WrapperStyle::Heading => render_heading(&metadata, &body),
        WrapperStyle::None => format!("{body}\n"),
    };
    Ok(out)
}

/// Parse raw template text and emit it; nothing is emitted when parsing fails.
pub fn convert(raw: &str, kind: FormatKind, command: &str) -> Result<String> {
    let template = CommandTemplate::parse(raw)?.with_command(command);
    emit(&template, FormatSpec::by_kind(kind))
}

/// Candidate metadata (synthesized defaults, template keys, fixed keys)
/// projected onto the format's allowlist.
pub fn project_metadata(template: &CommandTemplate, spec: &FormatSpec) -> Metadata {
    let mut candidate = Metadata::new();
    for (key, value) in (spec.defaults)(template) {
        if !template.metadata.contains_key(key) {
            candidate.insert(key, value);
        }
    }
    for (key, value) in template.metadata.iter() {
        candidate.insert(key, value);
    }
    for (key, value) in spec.fixed {
        candidate.insert(*key, *value);
    }

    candidate
        .iter()
        .filter(|(key, _)| spec.key_allowlist.permits(key))
        .collect()
}

/// Placeholder handling plus the marker-enclosed managed region.
fn render_body(template: &CommandTemplate, spec: &FormatSpec) -> String {
    let token = template.placeholder.as_str();
    let mut body = match spec.placeholder {
        PlaceholderSyntax::Braced if !token.is_empty() => template.body.replace(token, BRACED_ARGS),
        _ => template.body.clone(),
    };
    if let Some(decorate) = spec.decorate {
        body = decorate(&body);
    }

    let region = format!("{STRIDE_START}\n{body}\n{STRIDE_END}");
    match spec.placeholder {
        PlaceholderSyntax::Leading => format!("{token}\n\n{region}"),
        PlaceholderSyntax::Tagged => format!(
            "{}\n\n<UserRequest>\n  {token}\n</UserRequest>\n\n{region}",
            request_context(&template.command)
        ),
        _ => region,
    }
}

fn render_yaml(metadata: &Metadata, body: &str) -> Result<String> {
    let mut out = String::from("---\n");
    for (key, value) in metadata.iter() {
        out.push_str(&format!("{key}: {}\n", yaml_value(value)?));
    }
    out.push_str("---\n\n");
    out.push_str(body);
    out.push('\n');
    Ok(out)
}

/// Values are written as-is when YAML reads them back as a scalar or flow
/// sequence (`true`, `[stride, plan]`); anything else is quoted.
fn yaml_value(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Ok(value.to_string());
    }
    let plain = match serde_yaml::from_str::<serde_yaml::Value>(value) {
        Ok(serde_yaml::Value::Null) => matches!(value.trim(), "~" | "null" | "Null" | "NULL"),
        Ok(serde_yaml::Value::Sequence(_)) => value.trim_start().starts_with('['),
        Ok(serde_yaml::Value::Mapping(_) | serde_yaml::Value::Tagged(_)) => false,
        Ok(_) => !value.trim_start().starts_with('&'),
        Err(_) => false,
    };
    if plain {
        return Ok(value.to_string());
    }
    Ok(serde_yaml::to_string(value)?.trim_end().to_string())
}

fn render_toml(metadata: &Metadata, body: &str) -> String {
    let mut out = String::new();
    for (key, value) in metadata.iter() {
        let value = toml::Value::String(value.to_string());
        out.push_str(&format!("{key} = {value}\n"));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str("prompt = \"\"\"\n");
    out.push_str(&toml_multiline_escape(body));
    out.push_str("\n\"\"\"\n");
    out
}

fn render_heading(metadata: &Metadata, body: &str) -> String {
    let mut out = String::new();
    if let Some(name) = metadata.get("name") {
        out.push_str(&format!("# {name}\n\n"));
    }
    if let Some(description) = metadata.get("description") {
        out.push_str(&format!("{description}\n\n"));
    }
    let bullets: Vec<String> = metadata
        .iter()
        .filter(|(k, _)| *k != "name" && *k != "description")
        .map(|(k, v)| format!("- {k}: {v}"))
        .collect();
    if !bullets.is_empty() {
        out.push_str(&bullets.join("\n"));
        out.push_str("\n\n");
    }
    out.push_str(body);
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `sprint-review` -> `Sprint Review`
pub fn display_name(command: &str) -> String {
    command
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn request_context(command: &str) -> String {
    let phrase = match command {
        "init" => "initialize or validate their Stride project context",
        "derive" => "derive sprint details from an existing proposal",
        "lite" => "create a lightweight sprint without full planning",
        "plan" => "create a detailed sprint plan",
        "present" => "present the sprint plan for review",
        "implement" => "implement the sprint plan",
        "feedback" => "provide feedback on sprint progress",
        "review" => "review sprint implementation",
        "complete" => "mark the sprint as complete",
        "status" => "check sprint status",
        "" => return "The user wants to run a Stride command.".to_string(),
        other => return format!("The user wants to execute the {other} command."),
    };
    format!("The user wants to {phrase}.")
}

/// Escape text for a `"""` multi-line basic string.
fn toml_multiline_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' | '\t' => out.push(c),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.replace("\"\"\"", "\"\"\\\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
