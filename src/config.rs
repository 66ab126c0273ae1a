//! Loads the project file (`quire.yaml`) into a [`Config`]. Relative
//! directories are resolved against the directory holding the project file.

use crate::page::Site;
use crate::util::read;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct Project {
    site: SiteSettings,

    #[serde(default)]
    categories: Vec<CategorySettings>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default = "default_output_directory")]
    output_directory: PathBuf,

    #[serde(default = "default_static_directory")]
    static_directory: PathBuf,

    #[serde(default = "default_static_files")]
    static_files: Vec<PathBuf>,

    #[serde(default = "default_stylesheets")]
    stylesheets: Vec<String>,

    #[serde(default = "default_index_file")]
    index_file: String,

    #[serde(default = "default_feed_file")]
    feed_file: String,
}

#[derive(Deserialize)]
struct SiteSettings {
    title: String,
    base_url: Url,
    description: String,

    #[serde(default = "default_language")]
    language: String,
}

#[derive(Deserialize)]
struct CategorySettings {
    #[serde(default)]
    slug: Option<String>,
    name: String,

    #[serde(default)]
    order: i64,
}

fn default_content_directory() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("public")
}

fn default_static_directory() -> PathBuf {
    PathBuf::from("static")
}

fn default_static_files() -> Vec<PathBuf> {
    vec![PathBuf::from("style.css")]
}

fn default_stylesheets() -> Vec<String> {
    vec![String::from("style.css")]
}

fn default_index_file() -> String {
    String::from("posts.json")
}

fn default_feed_file() -> String {
    String::from("rss.xml")
}

fn default_language() -> String {
    String::from("en")
}

/// A category of posts. Its posts live in `{content_directory}/{slug}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub slug: String,

    /// The display name.
    pub name: String,

    /// The display order. Lower comes first.
    pub order: i64,
}

/// The configuration for one build.
#[derive(Debug, Clone)]
pub struct Config {
    /// The project file the configuration was loaded from.
    pub project_file: PathBuf,

    pub title: String,
    pub description: String,
    pub language: String,

    /// The absolute URL of the site root. Always ends with `/`.
    pub base_url: Url,

    /// Categories sorted by their display order.
    pub categories: Vec<Category>,

    pub content_directory: PathBuf,
    pub output_directory: PathBuf,
    pub static_directory: PathBuf,

    /// Files copied from `static_directory` into `{output_directory}/static`
    /// when they exist.
    pub static_files: Vec<PathBuf>,

    /// Stylesheets linked from every page. Entries that are neither absolute
    /// URLs nor root paths name files under the output `static/` directory.
    pub stylesheets: Vec<String>,

    /// The name of the JSON post index in the output directory.
    pub index_file: String,

    /// The name of the RSS feed in the output directory.
    pub feed_file: String,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a project file and
    /// loads the first one found. `output_directory` overrides the output
    /// directory from the project file.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path, output_directory)
                .map_err(|e| anyhow!("Loading configuration '{}': {:#}", path.display(), e))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path`. See [`Config::from_directory`] for
    /// `output_directory`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let project: Project = serde_yaml::from_str(&read(path, "project")?)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            )
        })?;

        let mut base_url = project.site.base_url;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("`site.base_url` must be an absolute URL: {}", base_url));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut categories: Vec<Category> = project
            .categories
            .into_iter()
            .map(|c| Category {
                slug: c.slug.unwrap_or_else(|| slug::slugify(&c.name)),
                name: c.name,
                order: c.order,
            })
            .collect();
        // stable, so equal orders keep their file order
        categories.sort_by_key(|c| c.order);

        Ok(Config {
            project_file: path.to_owned(),
            title: project.site.title,
            description: project.site.description,
            language: project.site.language,
            base_url,
            categories,
            content_directory: project_root.join(project.content_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join(project.output_directory),
            },
            static_directory: project_root.join(project.static_directory),
            static_files: project.static_files,
            stylesheets: project.stylesheets,
            index_file: project.index_file,
            feed_file: project.feed_file,
        })
    }

    /// The path component of the base URL, e.g. `/` or `/notes/`.
    pub fn root_path(&self) -> &str {
        self.base_url.path()
    }

    /// The site-wide values for page assembly.
    pub fn site(&self) -> Site {
        Site {
            title: self.title.clone(),
            language: self.language.clone(),
            root_path: self.root_path().to_owned(),
            stylesheets: self
                .stylesheets
                .iter()
                .map(|href| match href.starts_with('/') || href.contains("://") {
                    true => href.clone(),
                    false => format!("{}static/{}", self.root_path(), href),
                })
                .collect(),
        }
    }
}
