//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// What to do when two content files produce the same slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The file loaded later replaces the earlier one
    #[default]
    LastWriteWins,
    /// Building the index fails on the first collision
    FailFast,
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,
    pub baseurl: String,
    pub permalink: String,

    // Directory
    pub source: String,
    pub posts_dir: String,
    pub drafts_dir: String,
    #[serde(default)]
    pub exclude: Vec<String>,

    // Reading
    pub markdown_ext: String,
    pub excerpt_separator: String,
    pub include_drafts: bool,
    pub include_unpublished: bool,

    // Indexing
    pub duplicate_slugs: DuplicatePolicy,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            author: String::new(),

            url: String::new(),
            baseurl: String::new(),
            permalink: "/:year/:month/:day/:title.html".to_string(),

            source: ".".to_string(),
            posts_dir: "_posts".to_string(),
            drafts_dir: "_drafts".to_string(),
            exclude: vec![
                "Gemfile*".to_string(),
                "README*".to_string(),
                "node_modules/**".to_string(),
                "vendor/**".to_string(),
            ],

            markdown_ext: "markdown,mkdown,mkdn,mkd,md".to_string(),
            excerpt_separator: "\n\n".to_string(),
            include_drafts: false,
            include_unpublished: false,

            duplicate_slugs: DuplicatePolicy::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        // An empty _config.yml is valid and means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// File extensions (lowercase, without the dot) treated as Markdown
    pub fn markdown_extensions(&self) -> Vec<String> {
        self.markdown_ext
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Whether a file extension is loadable content (Markdown or HTML)
    pub fn is_content_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        ext == "html" || ext == "htm" || self.markdown_extensions().contains(&ext)
    }

    /// Check a source-relative path against the `exclude` globs
    ///
    /// A pattern matches the path itself or, as a directory, anything
    /// below it: `about` covers `about/x.md` but not `about-me.md`.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let relative = relative.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| {
            let dir = format!("{}/", pattern.trim_end_matches('/'));
            if relative == pattern.trim_end_matches('/') || relative.starts_with(&dir) {
                return true;
            }
            match Pattern::new(pattern) {
                Ok(p) => p.matches(&relative),
                Err(e) => {
                    tracing::debug!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.posts_dir, "_posts");
        assert_eq!(config.duplicate_slugs, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.excerpt_separator, "\n\n");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
author: Test User
duplicate_slugs: fail_fast
exclude:
  - scripts/**
markdown_ext: "md, markdown"
twitter_username: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.author, "Test User");
        assert_eq!(config.duplicate_slugs, DuplicatePolicy::FailFast);
        assert_eq!(config.markdown_extensions(), vec!["md", "markdown"]);
        assert!(config.extra.contains_key("twitter_username"));
    }

    #[test]
    fn test_content_extensions() {
        let config = SiteConfig::default();
        assert!(config.is_content_extension("md"));
        assert!(config.is_content_extension("MD"));
        assert!(config.is_content_extension("html"));
        assert!(!config.is_content_extension("png"));
    }

    #[test]
    fn test_exclude_patterns() {
        let config = SiteConfig::default();
        assert!(config.is_excluded(Path::new("README.md")));
        assert!(config.is_excluded(Path::new("vendor/bundle/gem.md")));
        assert!(!config.is_excluded(Path::new("about.md")));
    }

    #[test]
    fn test_exclude_directory_boundary() {
        let config = SiteConfig {
            exclude: vec!["about".to_string(), "drafts/".to_string()],
            ..Default::default()
        };
        assert!(config.is_excluded(Path::new("about")));
        assert!(config.is_excluded(Path::new("about/x.md")));
        assert!(!config.is_excluded(Path::new("about-me.md")));
        assert!(!config.is_excluded(Path::new("aboutus/x.md")));
        assert!(config.is_excluded(Path::new("drafts/idea.md")));
        assert!(!config.is_excluded(Path::new("drafts-old.md")));
    }

    #[test]
    fn test_load_empty_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "Blog");
    }
}
