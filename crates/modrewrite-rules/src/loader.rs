//! Discovery and loading of `module-rewrite.conf` files
//!
//! Configuration is looked up in a project directory and in every one of its
//! ancestors. All files found are merged into one [`RuleStore`]: a section for
//! a module that already has rules appends to them.

use modrewrite_core::PropertySource;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::Rewriter;
use crate::error::{LoadError, ParseWarning};
use crate::parser::ConfParser;
use crate::store::RuleStore;

/// File name searched for in each directory
pub const CONF_FILE_NAME: &str = "module-rewrite.conf";

/// Configuration files for `start_dir`, closest directory first
///
/// Walks `start_dir` and all of its ancestors up to the filesystem root and
/// keeps the candidates that exist as regular files.
pub fn discover(start_dir: &Path) -> Vec<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONF_FILE_NAME))
        .filter(|candidate| candidate.is_file())
        .collect()
}

/// Result of loading one or more configuration files
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub store: RuleStore,
    /// Files (or named sources) loaded, in load order
    pub sources: Vec<PathBuf>,
    /// Lines that were skipped
    pub warnings: Vec<ParseWarning>,
}

impl LoadedConfig {
    /// Freeze the loaded rules for rewriting
    pub fn into_rewriter(self) -> Rewriter {
        Rewriter::new(self.store)
    }
}

/// Accumulates configuration sources into a single rule store
pub struct ConfigLoader<'p, P: PropertySource + ?Sized> {
    properties: &'p P,
    loaded: LoadedConfig,
}

impl<'p, P: PropertySource + ?Sized> ConfigLoader<'p, P> {
    pub fn new(properties: &'p P) -> Self {
        Self {
            properties,
            loaded: LoadedConfig::default(),
        }
    }

    /// Parse a configuration file into the store
    ///
    /// The file is read to the end and closed before this returns.
    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let reader = BufReader::new(File::open(path).map_err(io_error)?);
        let mut parser = ConfParser::new(&mut self.loaded.store, self.properties, path);
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            parser.feed(index + 1, &line)?;
        }
        let warnings = parser.finish();
        self.finish_source(path, warnings);
        Ok(())
    }

    /// Parse configuration text, reporting problems against `source`
    pub fn load_str(&mut self, source: &Path, text: &str) -> Result<(), LoadError> {
        let mut parser = ConfParser::new(&mut self.loaded.store, self.properties, source);
        for (index, line) in text.lines().enumerate() {
            parser.feed(index + 1, line)?;
        }
        let warnings = parser.finish();
        self.finish_source(source, warnings);
        Ok(())
    }

    pub fn finish(self) -> LoadedConfig {
        self.loaded
    }

    fn finish_source(&mut self, source: &Path, warnings: Vec<ParseWarning>) {
        debug!(
            path = %source.display(),
            modules = self.loaded.store.len(),
            rules = self.loaded.store.rule_count(),
            warnings = warnings.len(),
            "loaded module rewrite configuration"
        );
        self.loaded.sources.push(source.to_path_buf());
        self.loaded.warnings.extend(warnings);
    }
}

/// Load the given files in order
pub fn load_files<P: PropertySource + ?Sized>(paths: &[PathBuf], properties: &P) -> Result<LoadedConfig, LoadError> {
    let mut loader = ConfigLoader::new(properties);
    for path in paths {
        loader.load_file(path)?;
    }
    Ok(loader.finish())
}

/// Discover and load every configuration file for a project directory
pub fn load_project<P: PropertySource + ?Sized>(project_dir: &Path, properties: &P) -> Result<LoadedConfig, LoadError> {
    let start = std::path::absolute(project_dir).map_err(|source| LoadError::Io {
        path: project_dir.to_path_buf(),
        source,
    })?;
    let files = discover(&start);
    debug!(project = %start.display(), found = files.len(), "discovered module rewrite configuration");
    load_files(&files, properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modrewrite_core::{ModuleId, NoProperties};
    use std::fs;
    use tempfile::TempDir;

    fn create_conf(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(CONF_FILE_NAME), content).unwrap();
    }

    fn rules_of(loaded: &LoadedConfig, name: &str, slot: &str) -> Vec<String> {
        loaded
            .store
            .get(&ModuleId::new(name, slot))
            .map(|set| set.iter().map(|r| r.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_discover_closest_first() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("parent/child");
        create_conf(temp.path(), "");
        create_conf(&child, "");
        fs::create_dir_all(temp.path().join("parent")).unwrap();

        let found = discover(&child);

        // Directories above the temp dir may hold their own files
        assert!(found.len() >= 2);
        assert_eq!(found[0], child.join(CONF_FILE_NAME));
        assert_eq!(found[1], temp.path().join(CONF_FILE_NAME));
    }

    #[test]
    fn test_discover_skips_directories_named_like_conf() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(CONF_FILE_NAME)).unwrap();

        let found = discover(temp.path());
        assert!(!found.contains(&temp.path().join(CONF_FILE_NAME)));
    }

    #[test]
    fn test_load_project_merges_ancestors() {
        let temp = TempDir::new().unwrap();
        let child = temp.path().join("child");
        create_conf(temp.path(), "module:foo\noptional:parent-a\noptional:parent-b\n");
        create_conf(&child, "module:foo:main\noptional:child-a\noptional:child-b\n");

        let loaded = load_project(&child, &NoProperties).unwrap();

        assert_eq!(loaded.sources[0], child.join(CONF_FILE_NAME));
        assert_eq!(loaded.sources[1], temp.path().join(CONF_FILE_NAME));
        assert_eq!(
            rules_of(&loaded, "foo", "main"),
            vec![
                "optional:child-a:main",
                "optional:child-b:main",
                "optional:parent-a:main",
                "optional:parent-b:main",
            ]
        );
    }

    #[test]
    fn test_module_context_resets_per_file() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.conf");
        let second = temp.path().join("second.conf");
        fs::write(&first, "module:foo\noptional:a\n").unwrap();
        fs::write(&second, "optional:b\n").unwrap();

        let err = load_files(&[first, second.clone()], &NoProperties).unwrap_err();
        match err {
            LoadError::DirectiveBeforeModule { path, line, .. } => {
                assert_eq!(path, second);
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.conf");

        let err = load_files(&[missing.clone()], &NoProperties).unwrap_err();
        assert!(matches!(err, LoadError::Io { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_warnings_collected_across_files() {
        let mut loader = ConfigLoader::new(&NoProperties);
        loader
            .load_str(Path::new("a.conf"), "module:foo\nbogus\n")
            .unwrap();
        loader
            .load_str(Path::new("b.conf"), "\n\nmodule:bar\nalso bogus\n")
            .unwrap();
        let loaded = loader.finish();

        assert_eq!(loaded.warnings.len(), 2);
        assert_eq!(loaded.warnings[0].path, PathBuf::from("a.conf"));
        assert_eq!(loaded.warnings[1].line, 4);
        assert_eq!(loaded.store.len(), 2);
    }
}
