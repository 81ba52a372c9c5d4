//! In-memory module descriptors and the mutation surface used by rewrite rules

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactCoordinate, ArtifactPattern, ArtifactSelector};
use crate::identity::ModuleId;

/// A descriptor that rewrite rules can read and mutate
///
/// Operations that act on existing entries return how many entries they
/// touched. Zero means the target was absent, which is not an error.
pub trait RewriteTarget {
    /// Module name of the descriptor
    fn name(&self) -> &str;

    /// Module slot, if the descriptor declares one
    fn slot(&self) -> Option<&str>;

    /// Point every dependency on `from` at `to` instead
    fn replace_dependency(&mut self, from: &ModuleId, to: &ModuleId) -> usize;

    /// Mark every dependency on `target` as optional
    fn mark_optional(&mut self, target: &ModuleId) -> usize;

    /// Append a dependency; an unset slot is left for the descriptor format to default
    fn add_dependency(&mut self, name: &str, slot: Option<&str>, export: bool);

    /// Drop every resource matching `pattern`
    fn remove_resources(&mut self, pattern: &ArtifactPattern) -> usize;

    /// Set the version of every artifact resource selected by `selector`
    fn set_artifact_version(&mut self, selector: &ArtifactSelector, version: &str) -> usize;

    /// Identity used to look up rules for this descriptor
    fn identity(&self) -> ModuleId {
        ModuleId::with_default_slot(self.name(), self.slot())
    }
}

/// A generated module descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub dependencies: Vec<ModuleDependency>,
}

/// A resource entry of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resource {
    Artifact { artifact: ArtifactCoordinate },
    Root { path: String },
}

impl Resource {
    pub fn artifact(coordinate: ArtifactCoordinate) -> Self {
        Resource::Artifact { artifact: coordinate }
    }

    pub fn root(path: impl Into<String>) -> Self {
        Resource::Root { path: path.into() }
    }

    /// Text that removal patterns are matched against
    ///
    /// Expression artifacts match on their coordinates, so `g:a*` also
    /// removes `${g:a}`.
    pub fn match_text(&self) -> String {
        match self {
            Resource::Artifact { artifact } => artifact.coordinates(),
            Resource::Root { path } => path.clone(),
        }
    }
}

/// A dependency on another module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub export: bool,
}

impl ModuleDependency {
    pub fn new(name: impl Into<String>, slot: Option<&str>) -> Self {
        Self {
            name: name.into(),
            slot: slot.map(str::to_string),
            optional: false,
            export: false,
        }
    }

    pub fn identity(&self) -> ModuleId {
        ModuleId::with_default_slot(self.name.as_str(), self.slot.as_deref())
    }
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>, slot: Option<&str>) -> Self {
        Self {
            name: name.into(),
            slot: slot.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn with_dependency(mut self, dependency: ModuleDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Find the first dependency with the given identity
    pub fn dependency(&self, id: &ModuleId) -> Option<&ModuleDependency> {
        self.dependencies.iter().find(|d| &d.identity() == id)
    }

    /// Find the first artifact resource with the given group and artifact
    pub fn artifact(&self, group_id: &str, artifact_id: &str) -> Option<&ArtifactCoordinate> {
        self.resources.iter().find_map(|r| match r {
            Resource::Artifact { artifact }
                if artifact.group_id == group_id && artifact.artifact_id == artifact_id =>
            {
                Some(artifact)
            }
            _ => None,
        })
    }
}

impl RewriteTarget for ModuleDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    fn replace_dependency(&mut self, from: &ModuleId, to: &ModuleId) -> usize {
        let mut count = 0;
        for dep in self.dependencies.iter_mut().filter(|d| &d.identity() == from) {
            dep.name = to.name().to_string();
            dep.slot = Some(to.slot().to_string());
            count += 1;
        }
        count
    }

    fn mark_optional(&mut self, target: &ModuleId) -> usize {
        let mut count = 0;
        for dep in self.dependencies.iter_mut().filter(|d| &d.identity() == target) {
            dep.optional = true;
            count += 1;
        }
        count
    }

    fn add_dependency(&mut self, name: &str, slot: Option<&str>, export: bool) {
        let mut dep = ModuleDependency::new(name, slot);
        dep.export = export;
        self.dependencies.push(dep);
    }

    fn remove_resources(&mut self, pattern: &ArtifactPattern) -> usize {
        let before = self.resources.len();
        self.resources.retain(|r| !pattern.matches(&r.match_text()));
        before - self.resources.len()
    }

    fn set_artifact_version(&mut self, selector: &ArtifactSelector, version: &str) -> usize {
        let mut count = 0;
        for resource in &mut self.resources {
            if let Resource::Artifact { artifact } = resource {
                if selector.matches(artifact) {
                    artifact.version = Some(version.to_string());
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModuleDescriptor {
        ModuleDescriptor::new("foo", None)
            .with_dependency(ModuleDependency::new("baz", None))
            .with_dependency(ModuleDependency::new("bar", Some("other")))
            .with_resource(Resource::artifact(
                ArtifactCoordinate::parse("org.example:lib:1.0.0").unwrap(),
            ))
            .with_resource(Resource::root("lib/extra.jar"))
    }

    #[test]
    fn test_identity_defaults_slot() {
        assert_eq!(sample().identity(), ModuleId::new("foo", "main"));
    }

    #[test]
    fn test_replace_dependency_keeps_flags() {
        let mut desc = sample();
        desc.dependencies[0].export = true;

        let count = desc.replace_dependency(&ModuleId::new("baz", "main"), &ModuleId::new("qux", "other"));

        assert_eq!(count, 1);
        assert_eq!(desc.dependencies[0].name, "qux");
        assert_eq!(desc.dependencies[0].slot.as_deref(), Some("other"));
        assert!(desc.dependencies[0].export);
    }

    #[test]
    fn test_mark_optional_missing_is_noop() {
        let mut desc = sample();
        let before = desc.clone();
        assert_eq!(desc.mark_optional(&ModuleId::new("bar", "main")), 0);
        assert_eq!(desc, before);
    }

    #[test]
    fn test_add_dependency_keeps_unset_slot() {
        let mut desc = sample();
        desc.add_dependency("extra", None, true);

        let added = desc.dependencies.last().unwrap();
        assert_eq!(added.slot, None);
        assert!(added.export);
        assert!(!added.optional);
    }

    #[test]
    fn test_remove_resources() {
        let mut desc = sample();
        assert_eq!(desc.remove_resources(&ArtifactPattern::new("lib/*.jar")), 1);
        assert_eq!(desc.resources.len(), 1);
        assert_eq!(desc.remove_resources(&ArtifactPattern::new("org.example:lib:*")), 1);
        assert!(desc.resources.is_empty());
    }

    #[test]
    fn test_remove_expression_artifact() {
        let mut desc = ModuleDescriptor::new("foo", None)
            .with_resource(Resource::artifact(ArtifactCoordinate::parse("${org.example:lib}").unwrap()));

        assert_eq!(desc.remove_resources(&ArtifactPattern::new("org.example:lib*")), 1);
        assert!(desc.resources.is_empty());
    }

    #[test]
    fn test_set_artifact_version() {
        let mut desc = sample();
        let selector = ArtifactSelector::parse("org.example:lib").unwrap();

        assert_eq!(desc.set_artifact_version(&selector, "9.9.9"), 1);
        assert_eq!(
            desc.artifact("org.example", "lib").unwrap().version.as_deref(),
            Some("9.9.9")
        );
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "name": "foo",
            "resources": [{"artifact": "g:a:1"}, {"path": "x.jar"}],
            "dependencies": [{"name": "bar", "optional": true}]
        }"#;
        let desc: ModuleDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(desc.slot, None);
        assert_eq!(desc.resources[1], Resource::root("x.jar"));
        assert!(desc.dependencies[0].optional);
        assert!(!desc.dependencies[0].export);
    }
}
