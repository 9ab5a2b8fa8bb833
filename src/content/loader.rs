//! Content loader - loads posts and pages from the site source directory

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::error::ParseError;
use super::frontmatter::FrontMatter;
use super::markdown;
use super::post::{Layout, LinkSource, Page, Post};
use super::slug::{is_dated_stem, page_slug, split_dated_stem};
use crate::Blog;

/// A file that could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    /// Path relative to the site source
    pub path: PathBuf,
    pub error: ParseError,
}

/// Everything a corpus load produced
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Newest first; equal keys keep walk order
    pub posts: Vec<Post>,
    /// Sorted by slug
    pub pages: Vec<Page>,
    pub failures: Vec<LoadFailure>,
}

/// What a file in the source tree is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Post,
    Draft,
    Page,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        Self { blog }
    }

    /// Load the whole corpus
    ///
    /// Only a missing source directory is fatal. Bad files end up in
    /// `LoadReport::failures`.
    pub fn load(&self) -> Result<LoadReport> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.is_dir() {
            bail!("Source directory not found: {:?}", source_dir);
        }

        let mut report = LoadReport::default();

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(source_dir).unwrap_or(path);
            let Some(kind) = self.classify(relative) else {
                tracing::debug!("Ignoring {:?}", relative);
                continue;
            };

            match self.load_file(path, relative, kind) {
                Ok(Loaded::Post(post)) => {
                    if post.published || self.blog.config.include_unpublished {
                        report.posts.push(post);
                    } else {
                        tracing::debug!("Skipping unpublished post {}", post.slug);
                    }
                }
                Ok(Loaded::Page(page)) => {
                    if page.published || self.blog.config.include_unpublished {
                        report.pages.push(page);
                    } else {
                        tracing::debug!("Skipping unpublished page {}", page.slug);
                    }
                }
                Ok(Loaded::Static) => {
                    tracing::debug!("No front matter, treating as static file: {:?}", relative);
                }
                Err(error) => {
                    tracing::warn!("Failed to load {:?}: {}", relative, error);
                    report.failures.push(LoadFailure {
                        path: relative.to_path_buf(),
                        error,
                    });
                }
            }
        }

        // Sort by date descending (newest first)
        report.posts.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then_with(|| b.date.cmp(&a.date))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        report.pages.sort_by(|a, b| a.slug.cmp(&b.slug));

        tracing::info!(
            "Loaded {} posts and {} pages ({} failed)",
            report.posts.len(),
            report.pages.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Decide whether a source-relative path is a post, a draft, a page,
    /// or nothing we index
    fn classify(&self, relative: &Path) -> Option<Kind> {
        let config = &self.blog.config;

        let ext = relative.extension().and_then(|e| e.to_str())?;
        if !config.is_content_extension(ext) {
            return None;
        }

        let dirs: Vec<&str> = relative
            .parent()
            .map(|p| p.iter().filter_map(|c| c.to_str()).collect())
            .unwrap_or_default();

        if in_collection(relative, &dirs, &config.posts_dir) {
            return Some(Kind::Post);
        }
        if in_collection(relative, &dirs, &config.drafts_dir) {
            return config.include_drafts.then_some(Kind::Draft);
        }

        let file_name = relative.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if file_name.starts_with('_') || dirs.iter().any(|d| d.starts_with('_')) {
            return None;
        }
        if config.is_excluded(relative) {
            return None;
        }

        Some(Kind::Page)
    }

    fn load_file(&self, path: &Path, relative: &Path, kind: Kind) -> Result<Loaded, ParseError> {
        let content = fs::read_to_string(path)?;
        let source = relative.to_string_lossy().replace('\\', "/");

        match kind {
            Kind::Post => parse_post(&source, &content).map(Loaded::Post),
            Kind::Draft => {
                // Drafts usually have no date in the name; fall back to mtime
                let stem = relative.file_stem().and_then(|s| s.to_str()).unwrap_or("");
                if is_dated_stem(stem) {
                    parse_post(&source, &content).map(Loaded::Post)
                } else {
                    let modified = fs::metadata(path)?
                        .modified()
                        .map(|t| chrono::DateTime::<Local>::from(t).date_naive())
                        .unwrap_or_else(|_| Local::now().date_naive());
                    parse_draft(&source, &content, modified).map(Loaded::Post)
                }
            }
            Kind::Page => match parse_page(&source, &content) {
                Err(ParseError::MissingFrontMatter) => Ok(Loaded::Static),
                other => other.map(Loaded::Page),
            },
        }
    }
}

enum Loaded {
    Post(Post),
    Page(Page),
    Static,
}

/// Whether a file sits in a collection directory such as `_posts`
///
/// A bare name matches at any depth (`notes/_posts/...`); a nested value
/// like `blog/_posts` must prefix the path.
fn in_collection(relative: &Path, dirs: &[&str], collection: &str) -> bool {
    let collection: PathBuf = Path::new(collection)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let mut parts = collection.iter();
    match (parts.next(), parts.next()) {
        (None, _) => false,
        (Some(name), None) => dirs.iter().any(|d| std::ffi::OsStr::new(d) == name),
        _ => relative.starts_with(&collection),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') || s == "_site")
        .unwrap_or(false)
}

fn stem_of(source: &str) -> &str {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source)
}

fn require_title(fm: &mut FrontMatter) -> Result<String, ParseError> {
    match fm.title.take() {
        Some(title) if !title.trim().is_empty() => Ok(title),
        _ => Err(ParseError::MissingField("title")),
    }
}

/// Parse a post from its source-relative path and file contents
///
/// The slug and publish date come from the file name, the rest from the
/// front matter.
pub fn parse_post(source: &str, text: &str) -> Result<Post, ParseError> {
    let stem = stem_of(source);
    let (publish_date, _) = split_dated_stem(stem)?;
    build_post(stem, publish_date, text, source)
}

/// Parse an undated draft, dating it with `fallback_date`
pub fn parse_draft(source: &str, text: &str, fallback_date: NaiveDate) -> Result<Post, ParseError> {
    let stem = stem_of(source);
    let slug = format!("{}-{}", fallback_date.format("%Y-%m-%d"), stem);
    build_post(&slug, fallback_date, text, source)
}

fn build_post(
    slug: &str,
    publish_date: NaiveDate,
    text: &str,
    source: &str,
) -> Result<Post, ParseError> {
    let (mut fm, body) = FrontMatter::parse(text)?;
    let title = require_title(&mut fm)?;
    let date = fm.parse_date()?;

    if let Some(date) = date {
        if date.date() != publish_date {
            tracing::warn!(
                "{}: front-matter date {} differs from file name date {}, using file name",
                source,
                date.date(),
                publish_date
            );
        }
    }

    Ok(Post {
        slug: slug.to_string(),
        publish_date,
        date,
        title,
        tags: fm.tags.into_iter().collect::<BTreeSet<_>>(),
        categories: fm.categories.into_iter().collect::<BTreeSet<_>>(),
        layout: fm.layout.map(Layout::from).unwrap_or(Layout::Post),
        body: body.to_string(),
        source: source.to_string(),
        published: fm.published.unwrap_or(true),
        permalink: fm.permalink,
        extra: fm.extra,
    })
}

/// Parse a standalone page from its source-relative path and contents
pub fn parse_page(source: &str, text: &str) -> Result<Page, ParseError> {
    let (mut fm, body) = FrontMatter::parse(text)?;
    let title = require_title(&mut fm)?;

    let (links, links_from) = match fm.links() {
        Some(links) => {
            fm.extra.shift_remove("links");
            (links, LinkSource::FrontMatter)
        }
        None => (markdown::outline(body).links, LinkSource::Body),
    };

    // Pages have no use for these, but they belong to the file
    let mut extra = IndexMap::with_capacity(fm.extra.len() + 3);
    if let Some(date) = fm.date.take() {
        extra.insert("date".to_string(), serde_yaml::Value::String(date));
    }
    for (key, values) in [("tags", &mut fm.tags), ("categories", &mut fm.categories)] {
        if !values.is_empty() {
            let values = std::mem::take(values)
                .into_iter()
                .map(serde_yaml::Value::String)
                .collect();
            extra.insert(key.to_string(), serde_yaml::Value::Sequence(values));
        }
    }
    extra.extend(fm.extra);

    Ok(Page {
        slug: page_slug(Path::new(source)),
        title,
        layout: fm.layout.map(Layout::from).unwrap_or(Layout::Page),
        body: body.to_string(),
        source: source.to_string(),
        links,
        links_from,
        published: fm.published.unwrap_or(true),
        permalink: fm.permalink,
        extra,
    })
}
