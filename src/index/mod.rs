//! Content index - slug lookup and listings over a loaded corpus
//!
//! The index owns the records produced by the loader and answers the
//! questions tooling asks: what is at this slug, which posts carry a tag,
//! where does this link point, which links point nowhere.

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use indexmap::IndexMap;

use crate::config::{DuplicatePolicy, SiteConfig};
use crate::content::loader::{LoadFailure, LoadReport};
use crate::content::{Page, Post};

lazy_static! {
    static ref POST_URL_TAG: Regex =
        Regex::new(r"^\{%\s*post_url\s+([^\s%]+)\s*%\}$").expect("valid post_url regex");
}

/// Index build errors
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("duplicate slug {slug:?}: {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },
}

/// A record in the index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Post(Post),
    Page(Page),
}

impl Entry {
    pub fn slug(&self) -> &str {
        match self {
            Entry::Post(p) => &p.slug,
            Entry::Page(p) => &p.slug,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Entry::Post(p) => &p.title,
            Entry::Page(p) => &p.title,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Entry::Post(p) => &p.source,
            Entry::Page(p) => &p.source,
        }
    }

    /// URL path, using `pattern` for posts
    pub fn url(&self, pattern: &str) -> String {
        match self {
            Entry::Post(p) => p.url(pattern),
            Entry::Page(p) => p.url(),
        }
    }
}

/// A slug that appeared more than once during the build
#[derive(Debug, Clone, Serialize)]
pub struct Replaced {
    pub slug: String,
    /// Source of the record that was dropped
    pub dropped: String,
    /// Source of the record that was kept
    pub kept: String,
}

/// An internal link whose target resolves to nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingLink {
    /// Slug of the record containing the link
    pub from: String,
    pub label: String,
    pub target: String,
}

/// Slug-keyed index over posts and pages
#[derive(Debug)]
pub struct ContentIndex {
    entries: IndexMap<String, Entry>,
    /// Normalised URL path -> slug
    routes: HashMap<String, String>,
    replaced: Vec<Replaced>,
    failures: Vec<LoadFailure>,
    permalink: String,
    baseurl: String,
    url: String,
}

impl ContentIndex {
    /// Build an index from a load report
    ///
    /// Posts are inserted before pages, each in report order, so under
    /// `LastWriteWins` the later file in that order is the one kept.
    pub fn build(report: LoadReport, config: &SiteConfig) -> Result<Self, IndexError> {
        let LoadReport {
            posts,
            pages,
            failures,
        } = report;

        let mut index = Self {
            entries: IndexMap::with_capacity(posts.len() + pages.len()),
            routes: HashMap::new(),
            replaced: Vec::new(),
            failures,
            permalink: config.permalink.clone(),
            baseurl: config.baseurl.clone(),
            url: config.url.clone(),
        };

        let records = posts
            .into_iter()
            .map(Entry::Post)
            .chain(pages.into_iter().map(Entry::Page));

        for entry in records {
            index.insert(entry, config.duplicate_slugs)?;
        }

        for (slug, entry) in &index.entries {
            let route = normalize_path(&entry.url(&index.permalink));
            index.routes.entry(route).or_insert_with(|| slug.clone());
        }

        tracing::debug!(
            "Indexed {} entries ({} replaced)",
            index.entries.len(),
            index.replaced.len()
        );

        Ok(index)
    }

    fn insert(&mut self, entry: Entry, policy: DuplicatePolicy) -> Result<(), IndexError> {
        let slug = entry.slug().to_string();
        if let Some(existing) = self.entries.get(&slug) {
            match policy {
                DuplicatePolicy::FailFast => {
                    return Err(IndexError::DuplicateSlug {
                        slug,
                        first: existing.source().to_string(),
                        second: entry.source().to_string(),
                    });
                }
                DuplicatePolicy::LastWriteWins => {
                    tracing::warn!(
                        "Duplicate slug {:?}: {} replaces {}",
                        slug,
                        entry.source(),
                        existing.source()
                    );
                    self.replaced.push(Replaced {
                        slug: slug.clone(),
                        dropped: existing.source().to_string(),
                        kept: entry.source().to_string(),
                    });
                }
            }
        }
        self.entries.insert(slug, entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up any record by slug
    pub fn get(&self, slug: &str) -> Option<&Entry> {
        self.entries.get(slug)
    }

    pub fn post(&self, slug: &str) -> Option<&Post> {
        match self.entries.get(slug)? {
            Entry::Post(p) => Some(p),
            Entry::Page(_) => None,
        }
    }

    pub fn page(&self, slug: &str) -> Option<&Page> {
        match self.entries.get(slug)? {
            Entry::Page(p) => Some(p),
            Entry::Post(_) => None,
        }
    }

    /// All records, posts first
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Posts, newest first
    pub fn posts(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .entries
            .values()
            .filter_map(|e| match e {
                Entry::Post(p) => Some(p),
                Entry::Page(_) => None,
            })
            .collect();
        posts.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then_with(|| b.date.cmp(&a.date))
                .then_with(|| a.slug.cmp(&b.slug))
        });
        posts
    }

    /// Pages, by slug
    pub fn pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .entries
            .values()
            .filter_map(|e| match e {
                Entry::Page(p) => Some(p),
                Entry::Post(_) => None,
            })
            .collect();
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        pages
    }

    /// Posts carrying `tag`, newest first
    pub fn posts_tagged(&self, tag: &str) -> Vec<&Post> {
        self.posts()
            .into_iter()
            .filter(|p| p.tags.contains(tag))
            .collect()
    }

    /// Posts in `category`, newest first
    pub fn posts_in_category(&self, category: &str) -> Vec<&Post> {
        self.posts()
            .into_iter()
            .filter(|p| p.categories.contains(category))
            .collect()
    }

    /// Tag name -> number of posts
    pub fn tags(&self) -> BTreeMap<&str, usize> {
        let mut tags = BTreeMap::new();
        for post in self.posts() {
            for tag in &post.tags {
                *tags.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        tags
    }

    /// Category name -> number of posts
    pub fn categories(&self) -> BTreeMap<&str, usize> {
        let mut categories = BTreeMap::new();
        for post in self.posts() {
            for category in &post.categories {
                *categories.entry(category.as_str()).or_insert(0) += 1;
            }
        }
        categories
    }

    /// Every post whose title matches, newest first
    pub fn find_by_title(&self, title: &str) -> Vec<&Post> {
        let title = title.trim();
        self.posts()
            .into_iter()
            .filter(|p| p.title.trim() == title)
            .collect()
    }

    /// Titles shared by more than one post
    pub fn duplicate_titles(&self) -> BTreeMap<&str, Vec<&Post>> {
        let mut by_title: BTreeMap<&str, Vec<&Post>> = BTreeMap::new();
        for post in self.posts() {
            by_title.entry(post.title.trim()).or_default().push(post);
        }
        by_title.retain(|_, posts| posts.len() > 1);
        by_title
    }

    /// Slug collisions resolved while building
    pub fn replaced(&self) -> &[Replaced] {
        &self.replaced
    }

    /// Files that failed to load
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Resolve a link target to a record
    ///
    /// Accepts slugs, site paths (`/about/`, `/2015/03/01/pi.html`),
    /// absolute URLs on this site, percent-encoded paths and Jekyll
    /// `{% post_url ... %}` tags. External targets resolve to `None`.
    pub fn resolve_link(&self, target: &str) -> Option<&Entry> {
        let target = target.trim();

        if let Some(caps) = POST_URL_TAG.captures(target) {
            let slug = caps.get(1)?.as_str();
            let slug = slug.rsplit('/').next().unwrap_or(slug);
            return self.entries.get(slug);
        }

        let path = self.local_path(target)?;
        let normalized = normalize_path(&path);

        if let Some(slug) = self.routes.get(&normalized) {
            return self.entries.get(slug);
        }
        // Relative links to a post file, e.g. `2014-01-01-second.html`
        let last = normalized.rsplit('/').next().unwrap_or(&normalized);
        self.entries
            .get(&normalized)
            .or_else(|| self.entries.get(last).filter(|e| matches!(e, Entry::Post(_))))
    }

    /// Internal links (page link lists and post bodies) that resolve to
    /// nothing in the index
    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        let mut dangling = Vec::new();
        for entry in self.entries.values() {
            let links = match entry {
                Entry::Page(page) => page.links.clone(),
                Entry::Post(post) => post.outline().links,
            };
            for link in links {
                if !self.is_content_link(&link.target) {
                    continue;
                }
                if self.resolve_link(&link.target).is_none() {
                    dangling.push(DanglingLink {
                        from: entry.slug().to_string(),
                        label: link.label,
                        target: link.target,
                    });
                }
            }
        }
        dangling
    }

    /// Whether a target should point at a post or page
    fn is_content_link(&self, target: &str) -> bool {
        if POST_URL_TAG.is_match(target.trim()) {
            return true;
        }
        let Some(path) = self.local_path(target) else {
            return false;
        };
        if path.is_empty() {
            return false;
        }
        // Assets (images, PDFs, ...) are not content
        match path.rsplit('/').next().and_then(|f| f.rsplit_once('.')) {
            Some((_, ext)) => matches!(ext, "html" | "htm" | "md" | "markdown"),
            None => true,
        }
    }

    /// Site-local path for a target, or `None` for external links
    fn local_path(&self, target: &str) -> Option<String> {
        let mut target = target.trim();
        if target.is_empty() || target.starts_with('#') {
            return None;
        }

        let site = self.url.trim_end_matches('/');
        if !site.is_empty() {
            if let Some(rest) = target.strip_prefix(site) {
                if rest.is_empty() || rest.starts_with(['/', '#', '?']) {
                    target = rest;
                }
            }
        }
        if target.contains("://") || target.starts_with("mailto:") || target.starts_with("//") {
            return None;
        }

        let target = target.split(['#', '?']).next().unwrap_or("");
        let decoded = percent_decode_str(target).decode_utf8_lossy().into_owned();

        let baseurl = self.baseurl.trim_end_matches('/');
        let stripped = match decoded.strip_prefix(baseurl) {
            Some(rest) if !baseurl.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                Some(rest.to_string())
            }
            _ => None,
        };
        Some(stripped.unwrap_or(decoded))
    }
}

/// Normalise a URL path so `/about/`, `about`, `/about.html` and
/// `/about/index.html` compare equal
fn normalize_path(path: &str) -> String {
    let mut path = path.trim().trim_matches('/');
    for suffix in [".html", ".htm", ".md", ".markdown"] {
        if let Some(stripped) = path.strip_suffix(suffix) {
            path = stripped;
            break;
        }
    }
    if path == "index" {
        return "index".to_string();
    }
    let path = path.strip_suffix("/index").unwrap_or(path);
    if path.is_empty() {
        "index".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::{parse_page, parse_post};

    fn report() -> LoadReport {
        let posts = vec![
            parse_post(
                "_posts/2016-02-01-same-again.md",
                "---\ntitle: Same\ntags: [python]\n---\nSee [the first](/2016/01/01/same.html).",
            )
            .unwrap(),
            parse_post(
                "_posts/2016-01-01-same.md",
                "---\ntitle: Same\ntags: [python, pypy]\ncategories: bench\n---\nOne",
            )
            .unwrap(),
            parse_post(
                "_posts/2015-03-01-pi.md",
                "---\ntitle: Pi\ntags: math\n---\n[gone](/2001/01/01/missing.html) ![g](/img/x.png)",
            )
            .unwrap(),
        ];
        let pages = vec![
            parse_page(
                "talks.md",
                "---\ntitle: Talks\n---\n1. [Pi](/2015/03/01/pi.html)\n\
                 2. [About](/about/)\n3. [Nowhere](/nope/)\n4. [Ext](https://example.org/)\n",
            )
            .unwrap(),
            parse_page("about.md", "---\ntitle: About me\n---\nHi").unwrap(),
        ];
        LoadReport {
            posts,
            pages,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_lookup() {
        let index = ContentIndex::build(report(), &SiteConfig::default()).unwrap();
        assert_eq!(index.len(), 5);
        assert_eq!(index.get("about").unwrap().title(), "About me");
        assert!(index.post("2015-03-01-pi").is_some());
        assert!(index.page("2015-03-01-pi").is_none());
        assert!(index.get("missing").is_none());
    }

    #[test]
    fn test_same_title_distinct_records() {
        let index = ContentIndex::build(report(), &SiteConfig::default()).unwrap();
        let same = index.find_by_title("Same");
        assert_eq!(same.len(), 2);
        assert_eq!(same[0].slug, "2016-02-01-same-again");
        assert_eq!(index.duplicate_titles().len(), 1);
    }

    #[test]
    fn test_tags() {
        let index = ContentIndex::build(report(), &SiteConfig::default()).unwrap();
        let tags = index.tags();
        assert_eq!(tags.get("python"), Some(&2));
        assert_eq!(tags.get("math"), Some(&1));
        assert_eq!(index.posts_tagged("pypy").len(), 1);
        assert_eq!(index.posts_in_category("bench").len(), 1);
        assert_eq!(index.categories().get("bench"), Some(&1));
    }

    #[test]
    fn test_resolve_link() {
        let config = SiteConfig {
            url: "https://blog.example.com".to_string(),
            baseurl: "/blog".to_string(),
            ..Default::default()
        };
        let index = ContentIndex::build(report(), &config).unwrap();
        let slug = |t: &str| index.resolve_link(t).map(|e| e.slug().to_string());

        assert_eq!(slug("/about/").as_deref(), Some("about"));
        assert_eq!(slug("/blog/about.html").as_deref(), Some("about"));
        assert_eq!(slug("https://blog.example.com/blog/talks/").as_deref(), Some("talks"));
        assert_eq!(slug("/2015/03/01/pi.html#section").as_deref(), Some("2015-03-01-pi"));
        assert_eq!(slug("2016-01-01-same.html").as_deref(), Some("2016-01-01-same"));
        assert_eq!(slug("/ab%6Fut/").as_deref(), Some("about"));
        assert_eq!(
            slug("{% post_url 2016-01-01-same %}").as_deref(),
            Some("2016-01-01-same")
        );
        assert_eq!(slug("https://example.org/about/"), None);
        assert_eq!(slug("https://blog.example.com.evil/about/"), None);
        assert_eq!(slug("https://blog.example.comabout/"), None);
        assert_eq!(slug("#top"), None);
    }

    #[test]
    fn test_dangling_links() {
        let index = ContentIndex::build(report(), &SiteConfig::default()).unwrap();
        let dangling = index.dangling_links();
        let targets: Vec<_> = dangling.iter().map(|d| d.target.as_str()).collect();
        assert_eq!(targets, vec!["/2001/01/01/missing.html", "/nope/"]);
        assert_eq!(dangling[1].from, "talks");
    }

    #[test]
    fn test_last_write_wins() {
        let mut report = report();
        report
            .posts
            .push(parse_post("_posts/old/2015-03-01-pi.md", "---\ntitle: Pi v2\n---\n").unwrap());

        let index = ContentIndex::build(report, &SiteConfig::default()).unwrap();
        assert_eq!(index.get("2015-03-01-pi").unwrap().title(), "Pi v2");
        assert_eq!(index.replaced().len(), 1);
        assert_eq!(index.replaced()[0].dropped, "_posts/2015-03-01-pi.md");
    }

    #[test]
    fn test_fail_fast() {
        let mut report = report();
        report
            .posts
            .push(parse_post("_posts/old/2015-03-01-pi.md", "---\ntitle: Pi v2\n---\n").unwrap());
        let config = SiteConfig {
            duplicate_slugs: DuplicatePolicy::FailFast,
            ..Default::default()
        };
        let err = ContentIndex::build(report, &config).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateSlug { ref slug, .. } if slug == "2015-03-01-pi"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/about/"), "about");
        assert_eq!(normalize_path("/talks/index.html"), "talks");
        assert_eq!(normalize_path("/"), "index");
        assert_eq!(normalize_path("index.html"), "index");
    }
}
