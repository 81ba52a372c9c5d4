//! Generated project scaffolding from bill-of-materials POMs
//!
//! Creates `<target>/generated-project_<artifactId>[_<artifactId>...]/pom.xml`
//! by rendering a Handlebars template with the coordinates and managed
//! dependencies of each BOM.

use anyhow::{bail, Context, Result};
use handlebars::Handlebars;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Prefix of every generated project directory
pub const PROJECT_PREFIX: &str = "generated-project";

/// Descriptor file written into the generated project
pub const PROJECT_FILE_NAME: &str = "pom.xml";

/// Coordinates and managed dependencies read from a BOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bom {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub dependencies: Vec<BomDependency>,
}

/// A `<dependencyManagement>` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub scope: Option<String>,
    pub classifier: Option<String>,
}

impl BomDependency {
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl Bom {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read BOM {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid BOM {}", path.display()))
    }

    pub fn parse(pom: &str) -> Result<Self> {
        let pom = comment_regex().replace_all(pom, "");

        let parent = parent_regex().captures(&pom).map(|c| c[1].to_string());
        let managed = management_regex()
            .captures(&pom)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let header = nested_sections_regex().replace_all(&pom, "");

        let Some(artifact_id) = element(&header, "artifactId") else {
            bail!("No project artifactId found");
        };
        let group_id = element(&header, "groupId").or_else(|| parent.as_deref().and_then(|p| element(p, "groupId")));
        let version = element(&header, "version").or_else(|| parent.as_deref().and_then(|p| element(p, "version")));

        let dependencies = dependency_regex()
            .captures_iter(&managed)
            .filter_map(|c| {
                let body = &c[1];
                Some(BomDependency {
                    group_id: element(body, "groupId")?,
                    artifact_id: element(body, "artifactId")?,
                    version: element(body, "version"),
                    kind: element(body, "type"),
                    scope: element(body, "scope"),
                    classifier: element(body, "classifier"),
                })
            })
            .collect();

        Ok(Self {
            group_id,
            artifact_id,
            version,
            dependencies,
        })
    }
}

/// Name of the project generated for `boms`
pub fn project_name(boms: &[Bom]) -> String {
    let mut name = PROJECT_PREFIX.to_string();
    for bom in boms {
        name.push('_');
        name.push_str(&bom.artifact_id);
    }
    name
}

/// Builds generated projects below a target directory
pub struct ProjectBuilder {
    template: PathBuf,
    target_dir: PathBuf,
    skip: HashSet<String>,
}

impl ProjectBuilder {
    pub fn new(template: PathBuf, target_dir: PathBuf, skip: impl IntoIterator<Item = String>) -> Self {
        Self {
            template,
            target_dir,
            skip: skip.into_iter().collect(),
        }
    }

    /// Generate a project from the given BOM files, returning its directory
    pub fn generate(&self, bom_files: &[PathBuf]) -> Result<PathBuf> {
        info!(boms = ?bom_files, "generating project descriptor from BOMs");

        if !self.template.is_file() {
            bail!(
                "Unable to proceed without a template for generating a project descriptor: {} not found",
                self.template.display()
            );
        }
        let template = std::fs::read_to_string(&self.template)
            .with_context(|| format!("Failed to read template {}", self.template.display()))?;

        let mut boms = bom_files.iter().map(|path| Bom::load(path)).collect::<Result<Vec<_>>>()?;
        for bom in &mut boms {
            bom.dependencies.retain(|dep| !self.skip.contains(&dep.key()));
        }

        let name = project_name(&boms);
        let project_dir = self.target_dir.join(&name);
        if project_dir.exists() {
            bail!("Unable to create {}: already exists", project_dir.display());
        }
        std::fs::create_dir_all(&project_dir)
            .with_context(|| format!("Unable to create {}", project_dir.display()))?;

        let rendered = render(&template, &name, &boms)?;
        let project_file = project_dir.join(PROJECT_FILE_NAME);
        std::fs::write(&project_file, rendered)
            .with_context(|| format!("Failed to write {}", project_file.display()))?;
        if !project_file.is_file() {
            bail!("Failed to create project {}", PROJECT_FILE_NAME);
        }

        info!(path = %project_file.display(), "generated project descriptor");
        Ok(project_dir)
    }
}

fn render(template: &str, name: &str, boms: &[Bom]) -> Result<String> {
    let mut handlebars = Handlebars::new();

    // Templates produce XML, values are plain coordinates
    handlebars.register_escape_fn(handlebars::no_escape);

    let data = json!({
        "name": name,
        "boms": boms,
    });
    handlebars
        .render_template(template, &data)
        .context("Failed to render project template")
}

/// Text of the first `<tag>` element in `xml`
fn element(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let value = xml[start..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
static PARENT_REGEX: OnceLock<Regex> = OnceLock::new();
static MANAGEMENT_REGEX: OnceLock<Regex> = OnceLock::new();
static DEPENDENCY_REGEX: OnceLock<Regex> = OnceLock::new();
static NESTED_REGEX: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

fn comment_regex() -> &'static Regex {
    cached(&COMMENT_REGEX, r"(?s)<!--.*?-->")
}

fn parent_regex() -> &'static Regex {
    cached(&PARENT_REGEX, r"(?s)<parent>(.*?)</parent>")
}

fn management_regex() -> &'static Regex {
    cached(&MANAGEMENT_REGEX, r"(?s)<dependencyManagement>(.*?)</dependencyManagement>")
}

fn dependency_regex() -> &'static Regex {
    cached(&DEPENDENCY_REGEX, r"(?s)<dependency>(.*?)</dependency>")
}

/// Sections whose elements do not describe the project itself
///
/// The POM is read shallowly: anything left after removing these is taken as
/// the project header, so an unlisted section holding `<artifactId>` before
/// the project's own would be misread.
fn nested_sections_regex() -> &'static Regex {
    cached(
        &NESTED_REGEX,
        concat!(
            r"(?s)<parent>.*?</parent>",
            r"|<dependencyManagement>.*?</dependencyManagement>",
            r"|<dependencies>.*?</dependencies>",
            r"|<build>.*?</build>",
            r"|<profiles>.*?</profiles>",
            r"|<properties>.*?</properties>",
            r"|<modules>.*?</modules>",
            r"|<reporting>.*?</reporting>",
            r"|<distributionManagement>.*?</distributionManagement>",
            r"|<repositories>.*?</repositories>",
            r"|<pluginRepositories>.*?</pluginRepositories>",
        ),
    )
}
