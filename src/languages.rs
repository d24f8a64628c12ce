//! Language configuration for compilation and execution

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::{Error, Result};

/// How the execute command addresses the program entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// Entry is a source file path ({mainfile})
    #[default]
    MainFile,
    /// Entry is a class name derived from the entry file ({mainclass})
    MainClass,
}

/// Configuration for a supported programming language
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Registry identifier (e.g. "cpp", "python3")
    pub id: String,
    /// Display name used by the judge (e.g. "Python 3")
    pub name: String,
    /// Recognized file extensions, without the dot, in priority order
    pub extensions: Vec<String>,
    /// Compile command template (None if not needed)
    pub compile_command: Option<Vec<String>>,
    /// Run command template with an entry placeholder
    pub run_command: Vec<String>,
    /// Main-file-name template containing a {problemid} placeholder
    pub mainfile_template: Option<String>,
    /// How the entry point is passed to the run command
    pub entry_kind: EntryKind,
    /// Regex matching a program entry symbol in source text
    pub entry_marker: Option<String>,
    /// Appended to derived class names (e.g. "Kt")
    pub class_suffix: Option<String>,
    /// Capitalize the first letter of derived class names
    pub capitalize_class: bool,
    /// Stderr substring that marks a fatal parse/syntax error
    pub fatal_signature: Option<String>,
}

impl LanguageConfig {
    /// Whether a compile step must run before any sample
    pub fn needs_compile(&self) -> bool {
        self.compile_command.is_some()
    }
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    name: String,
    extensions: Vec<String>,
    #[serde(default)]
    compile: String,
    execute: String,
    #[serde(default)]
    mainfile: Option<String>,
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    entry_marker: Option<String>,
    #[serde(default)]
    class_suffix: Option<String>,
    #[serde(default)]
    capitalize_class: bool,
    #[serde(default)]
    fatal_signature: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Lookup table of language configurations, keyed by identifier and alias
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageConfig>,
}

impl LanguageRegistry {
    /// Registry built from the language table shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/files/languages.toml"
        )))
    }

    /// Load a registry from a TOML file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        let mut languages = HashMap::new();

        for (id, raw) in raw_configs {
            let entry_kind = match raw.entry.as_deref() {
                Some("class") => EntryKind::MainClass,
                _ => EntryKind::MainFile,
            };

            let compile_command = if raw.compile.trim().is_empty() {
                None
            } else {
                Some(into_command(&raw.compile))
            };

            let config = LanguageConfig {
                id: id.to_lowercase(),
                name: raw.name,
                extensions: raw.extensions,
                compile_command,
                run_command: into_command(&raw.execute),
                mainfile_template: raw.mainfile,
                entry_kind,
                entry_marker: raw.entry_marker,
                class_suffix: raw.class_suffix,
                capitalize_class: raw.capitalize_class,
                fatal_signature: raw.fatal_signature,
            };

            // Aliases share the canonical config
            for alias in &raw.aliases {
                languages.insert(alias.to_lowercase(), config.clone());
            }
            languages.insert(id.to_lowercase(), config);
        }

        debug!("loaded {} language entries", languages.len());
        Ok(Self { languages })
    }

    /// Get language configuration by identifier or alias
    pub fn get(&self, language: &str) -> Result<&LanguageConfig> {
        self.languages
            .get(&language.to_lowercase())
            .ok_or_else(|| Error::LanguageNotSupported(language.to_string()))
    }

    /// All canonical identifiers, sorted
    pub fn supported(&self) -> Vec<String> {
        let ids: std::collections::BTreeSet<String> =
            self.languages.values().map(|c| c.id.clone()).collect();
        ids.into_iter().collect()
    }

    /// Guess a language identifier from a file extension.
    ///
    /// `.C` counts as C++, and a bare header is C only when a sibling `.c`
    /// file is present. Returns None when nothing matches.
    pub fn guess_by_extension(&self, ext: &str, files: &[String]) -> Option<&LanguageConfig> {
        let ext = ext.trim_start_matches('.');
        if ext == "C" {
            return self.languages.get("cpp");
        }
        let ext = ext.to_lowercase();
        if ext == "h" {
            if files.iter().any(|f| f.ends_with(".c")) {
                return self.languages.get("c");
            }
            return self.languages.get("cpp");
        }
        self.languages
            .values()
            .find(|c| c.extensions.iter().any(|e| *e == ext))
    }
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
