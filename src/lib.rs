//! blog-index: a headless content index for Jekyll-style blogs
//!
//! This crate loads a directory of dated posts and standalone pages,
//! parses their front matter, and exposes the result as a slug-keyed
//! index. Rendering is left to whatever site generator consumes the
//! content.

pub mod commands;
pub mod config;
pub mod content;
pub mod index;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A blog rooted at a directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
}

impl Blog {
    /// Open a blog from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            tracing::debug!("Loading config from {:?}", config_path);
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Open a blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source);

        Self {
            config,
            base_dir,
            source_dir,
        }
    }

    /// Directory new posts are written to
    pub fn posts_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.posts_dir)
    }

    /// Load the corpus and build the index
    pub fn index(&self) -> Result<index::ContentIndex> {
        let report = content::loader::ContentLoader::new(self).load()?;
        let index = index::ContentIndex::build(report, &self.config)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Notes\nsource: site\nposts_dir: articles\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Notes");
        assert_eq!(blog.source_dir, dir.path().join("site"));
        assert_eq!(blog.posts_dir(), dir.path().join("site").join("articles"));
    }

    #[test]
    fn test_index_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let posts = dir.path().join("_posts");
        fs::create_dir_all(&posts).unwrap();
        fs::write(
            posts.join("2014-06-01-pypy.md"),
            "---\nlayout: post\ntitle: PyPy\ntags: [python]\n---\nFast.\n",
        )
        .unwrap();
        fs::write(dir.path().join("about.md"), "---\ntitle: About\n---\n").unwrap();

        let index = Blog::new(dir.path()).unwrap().index().unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.posts_tagged("python").len(), 1);
        assert!(index.page("about").is_some());
    }
}
