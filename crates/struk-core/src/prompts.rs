//! Prompt library for the image-understanding model
//!
//! Every prompt is a markdown file with YAML frontmatter and two sections,
//! `# System` and `# User`. Backends send both: the system section as the
//! model's instructions and the rendered user section as the request.
//!
//! A file named `<id>.md` in the override directory replaces the embedded
//! default. The directory is `STRUK_PROMPTS_DIR` when set, otherwise
//! `~/.local/share/struk/prompts/overrides/`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

const ANALYZE_IMAGE: &str = include_str!("../../../prompts/analyze_image.md");
const CATEGORIZE_ITEMS: &str = include_str!("../../../prompts/categorize_items.md");

/// Known prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Receipt-or-not decision plus field extraction (vision)
    AnalyzeImage,
    /// Group line items into spending categories
    CategorizeItems,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeImage => "analyze_image",
            Self::CategorizeItems => "categorize_items",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::AnalyzeImage, Self::CategorizeItems]
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::AnalyzeImage => ANALYZE_IMAGE,
            Self::CategorizeItems => CATEGORIZE_ITEMS,
        }
    }

    fn file_name(&self) -> String {
        format!("{}.md", self.as_str())
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::all().iter().map(|id| id.as_str()).collect();
                Error::InvalidRequest(format!(
                    "Unknown prompt '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Frontmatter of a prompt file
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// vision or fast_classification
    pub task_type: String,
}

/// Where a loaded prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    Override(PathBuf),
}

/// A parsed prompt file
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter, both sections included
    pub content: String,
    pub source: PromptSource,
}

/// A prompt ready to send: instructions plus the filled-in request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Fill `{{name}}` placeholders in both sections
    ///
    /// A file without a `# User` header is sent whole as the request.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> RenderedPrompt {
        let user = self.user_section().unwrap_or(&self.content);
        RenderedPrompt {
            system: self
                .system_section()
                .filter(|s| !s.is_empty())
                .map(|s| fill(s, vars)),
            user: fill(user, vars),
        }
    }
}

/// Listing entry for `struk prompts list`
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: PromptId,
    pub version: u32,
    pub task_type: String,
    pub source: PromptSource,
}

/// Loads prompts once and caches them per id
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Library using `STRUK_PROMPTS_DIR` or the default override directory
    pub fn new() -> Self {
        match std::env::var_os("STRUK_PROMPTS_DIR") {
            Some(dir) => Self::with_override_dir(PathBuf::from(dir)),
            None => Self {
                override_dir: default_prompts_dir(),
                cache: HashMap::new(),
            },
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// No override lookup at all
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        let prompt = match self.cache.entry(id) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let loaded = load(self.override_dir.as_deref(), id)?;
                entry.insert(loaded)
            }
        };
        Ok(prompt)
    }

    /// Render a prompt by id
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt> {
        Ok(self.get(id)?.render(vars))
    }

    /// Every known prompt with its version and source
    ///
    /// Fails if an override file exists but cannot be parsed.
    pub fn list(&mut self) -> Result<Vec<PromptInfo>> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let prompt = self.get(id)?;
                Ok(PromptInfo {
                    id,
                    version: prompt.metadata.version,
                    task_type: prompt.metadata.task_type.clone(),
                    source: prompt.source.clone(),
                })
            })
            .collect()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("struk").join("prompts").join("overrides"))
}

fn load(override_dir: Option<&Path>, id: PromptId) -> Result<Prompt> {
    if let Some(path) = override_dir
        .map(|dir| dir.join(id.file_name()))
        .filter(|p| p.exists())
    {
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::InvalidData(format!("Failed to read prompt override: {}", e)))?;
        let (metadata, content) = parse_prompt(&raw)?;
        return Ok(Prompt {
            metadata,
            content,
            source: PromptSource::Override(path),
        });
    }

    let (metadata, content) = parse_prompt(id.embedded())?;
    Ok(Prompt {
        metadata,
        content,
        source: PromptSource::Embedded,
    })
}

/// Split a prompt file into frontmatter and body
fn parse_prompt(raw: &str) -> Result<(PromptMetadata, String)> {
    let rest = raw.trim().strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;
    let (frontmatter, body) = rest.split_once("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter.trim())
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.trim().to_string()))
}

/// Text under `header` up to the next top-level header
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

fn fill(template: &str, vars: &HashMap<&str, &str>) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{{{}}}}}", key), value)
    })
}
