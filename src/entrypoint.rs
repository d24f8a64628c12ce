//! Entry-point resolution
//!
//! Picks the file (or derived class name) a language's toolchain must be
//! pointed at. Resolution is an ordered rule list with a guaranteed final
//! fallback: it always answers, because a wrongly guessed entry point shows
//! up later as a compile or runtime error, not here.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::languages::{EntryKind, LanguageConfig};

/// Resolved program entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry source file
    pub file: PathBuf,
    /// Derived class name, for languages that launch a class
    pub mainclass: Option<String>,
}

type Rule = fn(&LanguageConfig, &[PathBuf], &str) -> Option<PathBuf>;

/// Rules evaluated in priority order; the last one always matches
const RULES: &[(&str, Rule)] = &[
    ("single-file", rule_single_file),
    ("mainfile-template", rule_mainfile_template),
    ("named-main-or-problem", rule_named_main_or_problem),
    ("entry-marker", rule_entry_marker),
    ("first-file", rule_first_file),
];

/// Resolve the entry point for one submission attempt.
///
/// `files` must already be deduplicated and sorted.
pub fn resolve(config: &LanguageConfig, files: &[PathBuf], problem_id: &str) -> Entry {
    let mut file = PathBuf::new();
    for (rule_name, rule) in RULES {
        if let Some(found) = rule(config, files, problem_id) {
            debug!(rule = %rule_name, file = %found.display(), "entry point resolved");
            file = found;
            break;
        }
    }

    let mainclass = match config.entry_kind {
        EntryKind::MainClass => Some(derive_class_name(config, &file)),
        EntryKind::MainFile => None,
    };

    Entry { file, mainclass }
}

fn rule_single_file(_config: &LanguageConfig, files: &[PathBuf], _problem_id: &str) -> Option<PathBuf> {
    match files {
        [only] => Some(only.clone()),
        _ => None,
    }
}

/// An explicit mainfile template in the config always wins over heuristics
fn rule_mainfile_template(
    config: &LanguageConfig,
    _files: &[PathBuf],
    problem_id: &str,
) -> Option<PathBuf> {
    config
        .mainfile_template
        .as_ref()
        .map(|t| PathBuf::from(t.replace("{problemid}", problem_id)))
}

fn rule_named_main_or_problem(
    _config: &LanguageConfig,
    files: &[PathBuf],
    problem_id: &str,
) -> Option<PathBuf> {
    files
        .iter()
        .find(|f| {
            let stem = file_stem(f);
            stem.eq_ignore_ascii_case("main") || (!problem_id.is_empty() && stem == problem_id)
        })
        .cloned()
}

/// Scan file contents for the language's entry symbol, in supplied order
fn rule_entry_marker(config: &LanguageConfig, files: &[PathBuf], _problem_id: &str) -> Option<PathBuf> {
    let pattern = config.entry_marker.as_deref()?;
    let marker = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(language = %config.id, "invalid entry marker pattern: {}", e);
            return None;
        }
    };
    files
        .iter()
        .find(|f| match std::fs::read_to_string(f) {
            Ok(contents) => marker.is_match(&contents),
            Err(_) => false,
        })
        .cloned()
}

fn rule_first_file(_config: &LanguageConfig, files: &[PathBuf], _problem_id: &str) -> Option<PathBuf> {
    files.first().cloned()
}

/// Class name from the entry file's stem, with per-language casing rules
fn derive_class_name(config: &LanguageConfig, file: &Path) -> String {
    let stem = file_stem(file);
    let mut name = if config.capitalize_class {
        let mut chars = stem.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        stem.to_string()
    };
    if let Some(suffix) = &config.class_suffix {
        name.push_str(suffix);
    }
    name
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;
    use std::io::Write;

    fn registry() -> LanguageRegistry {
        LanguageRegistry::builtin().unwrap()
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_single_file_wins_regardless_of_name() {
        let registry = registry();
        let config = registry.get("python3").unwrap();
        let entry = resolve(config, &paths(&["whatever.py"]), "hello");
        assert_eq!(entry.file, PathBuf::from("whatever.py"));
        assert_eq!(entry.mainclass, None);
    }

    #[test]
    fn test_mainfile_template_overrides_heuristics() {
        let registry = registry();
        let mut config = registry.get("python3").unwrap().clone();
        config.mainfile_template = Some("{problemid}_sol.py".to_string());
        let entry = resolve(&config, &paths(&["main.py", "other.py"]), "hello");
        assert_eq!(entry.file, PathBuf::from("hello_sol.py"));
    }

    #[test]
    fn test_basename_main_selected_case_insensitively() {
        let registry = registry();
        let config = registry.get("python3").unwrap();
        let entry = resolve(config, &paths(&["aux.py", "Main.py"]), "hello");
        assert_eq!(entry.file, PathBuf::from("Main.py"));
    }

    #[test]
    fn test_basename_matching_problem_id() {
        let registry = registry();
        let config = registry.get("python3").unwrap();
        let entry = resolve(config, &paths(&["aux.py", "hello.py"]), "hello");
        assert_eq!(entry.file, PathBuf::from("hello.py"));
    }

    #[test]
    fn test_entry_marker_scan_picks_file_with_main() {
        let dir = tempfile::tempdir().unwrap();
        let helper = dir.path().join("algo.rs");
        let mainful = dir.path().join("solve.rs");
        writeln!(std::fs::File::create(&helper).unwrap(), "pub fn gcd(a: u64, b: u64) -> u64 {{ 0 }}")
            .unwrap();
        writeln!(std::fs::File::create(&mainful).unwrap(), "fn main() {{}}").unwrap();

        let registry = registry();
        let config = registry.get("rust").unwrap();
        let entry = resolve(config, &[helper, mainful.clone()], "hello");
        assert_eq!(entry.file, mainful);
    }

    #[test]
    fn test_fallback_is_first_file() {
        let registry = registry();
        let config = registry.get("python3").unwrap();
        let entry = resolve(config, &paths(&["a.py", "b.py"]), "hello");
        assert_eq!(entry.file, PathBuf::from("a.py"));
    }

    #[test]
    fn test_java_mainclass_is_stem() {
        let registry = registry();
        let config = registry.get("java").unwrap();
        let entry = resolve(config, &paths(&["Solver.java"]), "hello");
        assert_eq!(entry.mainclass.as_deref(), Some("Solver"));
    }

    #[test]
    fn test_kotlin_mainclass_is_capitalized_with_suffix() {
        let registry = registry();
        let config = registry.get("kotlin").unwrap();
        let entry = resolve(config, &paths(&["solution.kt"]), "hello");
        assert_eq!(entry.mainclass.as_deref(), Some("SolutionKt"));
    }
}
