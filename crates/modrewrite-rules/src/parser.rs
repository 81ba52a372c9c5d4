//! Line parser for `module-rewrite.conf`
//!
//! Each non-blank line is one directive. Prefixes are checked in a fixed
//! order and the first match decides how the rest of the line is read.

use modrewrite_core::{
    placeholder_name, split_name_slot, ArtifactPattern, ArtifactSelector, ModuleId, PropertySource,
};
use std::path::Path;
use tracing::warn;

use crate::error::{LoadError, ParseWarning, WarningKind};
use crate::rule::RewriteRule;
use crate::store::RuleStore;

pub const MODULE: &str = "module:";
pub const INCLUDE: &str = "include:";
pub const EXPORT: &str = "export:";
pub const OPTIONAL: &str = "optional:";
pub const REPLACE: &str = "replace:";
pub const REMOVE_ARTIFACT: &str = "remove-artifact:";
pub const FORCE_ARTIFACT_VERSION: &str = "force-artifact-version:";

/// A parsed configuration line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Module(ModuleId),
    Include { name: String, slot: Option<String> },
    Export { name: String, slot: Option<String> },
    Optional(ModuleId),
    Replace { from: ModuleId, to: ModuleId },
    RemoveArtifact(ArtifactPattern),
    /// Version is still raw and may be a `${property}` placeholder
    ForceArtifactVersion { selector: ArtifactSelector, version: String },
}

impl Directive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::Module(_) => MODULE,
            Directive::Include { .. } => INCLUDE,
            Directive::Export { .. } => EXPORT,
            Directive::Optional(_) => OPTIONAL,
            Directive::Replace { .. } => REPLACE,
            Directive::RemoveArtifact(_) => REMOVE_ARTIFACT,
            Directive::ForceArtifactVersion { .. } => FORCE_ARTIFACT_VERSION,
        }
    }
}

/// Parse one trimmed, non-blank line
///
/// Returns `Ok(None)` when no directive prefix matches and `Err` when the
/// prefix matches but the rest of the line is unusable.
pub fn parse_directive(line: &str) -> Result<Option<Directive>, WarningKind> {
    if let Some(rest) = line.strip_prefix(MODULE) {
        return module_id(MODULE, rest).map(|id| Some(Directive::Module(id)));
    }
    if let Some(rest) = line.strip_prefix(INCLUDE) {
        let (name, slot) = name_and_slot(INCLUDE, rest)?;
        return Ok(Some(Directive::Include { name, slot }));
    }
    if let Some(rest) = line.strip_prefix(EXPORT) {
        let (name, slot) = name_and_slot(EXPORT, rest)?;
        return Ok(Some(Directive::Export { name, slot }));
    }
    if let Some(rest) = line.strip_prefix(OPTIONAL) {
        return module_id(OPTIONAL, rest).map(|id| Some(Directive::Optional(id)));
    }
    if let Some(rest) = line.strip_prefix(REPLACE) {
        let (from, to) = rest
            .split_once('>')
            .ok_or_else(|| WarningKind::malformed(REPLACE, "expected <module>'>'<module>"))?;
        if to.contains('>') {
            return Err(WarningKind::malformed(REPLACE, "more than one '>'"));
        }
        return Ok(Some(Directive::Replace {
            from: module_id(REPLACE, from)?,
            to: module_id(REPLACE, to)?,
        }));
    }
    if let Some(rest) = line.strip_prefix(REMOVE_ARTIFACT) {
        let pattern = rest.trim();
        if pattern.is_empty() {
            return Err(WarningKind::malformed(REMOVE_ARTIFACT, "empty pattern"));
        }
        return Ok(Some(Directive::RemoveArtifact(ArtifactPattern::new(pattern))));
    }
    if let Some(rest) = line.strip_prefix(FORCE_ARTIFACT_VERSION) {
        let (coordinate, version) = rest
            .split_once('=')
            .ok_or_else(|| WarningKind::malformed(FORCE_ARTIFACT_VERSION, "expected <artifact>=<version>"))?;
        let selector = ArtifactSelector::parse(coordinate)
            .map_err(|e| WarningKind::malformed(FORCE_ARTIFACT_VERSION, e.to_string()))?;
        let version = version.trim();
        if version.is_empty() {
            return Err(WarningKind::malformed(FORCE_ARTIFACT_VERSION, "empty version"));
        }
        return Ok(Some(Directive::ForceArtifactVersion {
            selector,
            version: version.to_string(),
        }));
    }
    Ok(None)
}

fn name_and_slot(directive: &'static str, text: &str) -> Result<(String, Option<String>), WarningKind> {
    let (name, slot) = split_name_slot(text);
    if name.is_empty() {
        return Err(WarningKind::malformed(directive, "empty module name"));
    }
    Ok((name.to_string(), slot.map(str::to_string)))
}

fn module_id(directive: &'static str, text: &str) -> Result<ModuleId, WarningKind> {
    let (name, slot) = name_and_slot(directive, text)?;
    Ok(ModuleId::with_default_slot(name, slot.as_deref()))
}

/// Which rule set directives currently feed
#[derive(Debug, Clone, PartialEq, Eq)]
enum Context {
    /// No `module:` line seen yet in this file
    Start,
    Module(ModuleId),
    /// The last `module:` line was malformed; skip until the next one
    Invalid,
}

/// Per-file parser state feeding a [`RuleStore`]
pub(crate) struct ConfParser<'a, P: PropertySource + ?Sized> {
    store: &'a mut RuleStore,
    properties: &'a P,
    path: &'a Path,
    context: Context,
    warnings: Vec<ParseWarning>,
}

impl<'a, P: PropertySource + ?Sized> ConfParser<'a, P> {
    pub(crate) fn new(store: &'a mut RuleStore, properties: &'a P, path: &'a Path) -> Self {
        Self {
            store,
            properties,
            path,
            context: Context::Start,
            warnings: Vec::new(),
        }
    }

    /// Feed one raw line (1-based `line_number`)
    pub(crate) fn feed(&mut self, line_number: usize, raw: &str) -> Result<(), LoadError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }

        let directive = match parse_directive(line) {
            Ok(Some(directive)) => directive,
            Ok(None) => {
                self.warn(line_number, line, WarningKind::Unrecognized);
                return Ok(());
            }
            Err(kind) => {
                if line.starts_with(MODULE) {
                    self.context = Context::Invalid;
                }
                self.warn(line_number, line, kind);
                return Ok(());
            }
        };

        if !matches!(directive, Directive::Module(_)) {
            match self.context {
                Context::Module(_) => {}
                Context::Start => {
                    return Err(LoadError::DirectiveBeforeModule {
                        path: self.path.to_path_buf(),
                        line: line_number,
                        directive: line.to_string(),
                    })
                }
                Context::Invalid => {
                    let kind = WarningKind::malformed(directive.keyword(), "no valid module: directive in effect");
                    self.warn(line_number, line, kind);
                    return Ok(());
                }
            }
        }

        let rule = match directive {
            Directive::Module(id) => {
                self.store.get_or_create(&id);
                self.context = Context::Module(id);
                return Ok(());
            }
            Directive::Include { name, slot } => RewriteRule::Include { name, slot },
            Directive::Export { name, slot } => RewriteRule::Export { name, slot },
            Directive::Optional(id) => RewriteRule::MakeOptional(id),
            Directive::Replace { from, to } => RewriteRule::Replace { from, to },
            Directive::RemoveArtifact(pattern) => RewriteRule::RemoveArtifact(pattern),
            Directive::ForceArtifactVersion { selector, version } => {
                let version = self.resolve_version(line_number, &selector, version)?;
                RewriteRule::ForceArtifactVersion { selector, version }
            }
        };

        if let Context::Module(current) = &self.context {
            self.store.get_or_create(current).push(rule);
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<ParseWarning> {
        self.warnings
    }

    /// Substitute a `${property}` version from the build properties
    fn resolve_version(
        &self,
        line_number: usize,
        selector: &ArtifactSelector,
        version: String,
    ) -> Result<String, LoadError> {
        let Some(property) = placeholder_name(&version).map(str::to_string) else {
            return Ok(version);
        };
        self.properties
            .property(&property)
            .ok_or_else(|| LoadError::MissingProperty {
                property,
                artifact: selector.to_string(),
                path: self.path.to_path_buf(),
                line: line_number,
            })
    }

    fn warn(&mut self, line_number: usize, line: &str, kind: WarningKind) {
        let warning = ParseWarning {
            path: self.path.to_path_buf(),
            line: line_number,
            content: line.to_string(),
            kind,
        };
        warn!(path = %self.path.display(), "{}", warning);
        self.warnings.push(warning);
    }
}
