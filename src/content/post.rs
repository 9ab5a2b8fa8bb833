//! Post and Page models

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::frontmatter::FrontMatter;
use super::markdown::{self, Link, Outline};

/// Rendering template name
///
/// Only the external renderer gives this meaning; we just carry it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layout {
    Post,
    Page,
    Default,
    Custom(String),
}

impl From<String> for Layout {
    fn from(name: String) -> Self {
        match name.as_str() {
            "post" => Layout::Post,
            "page" => Layout::Page,
            "default" => Layout::Default,
            _ => Layout::Custom(name),
        }
    }
}

impl From<&str> for Layout {
    fn from(name: &str) -> Self {
        Layout::from(name.to_string())
    }
}

impl From<Layout> for String {
    fn from(layout: Layout) -> Self {
        layout.to_string()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Post => f.write_str("post"),
            Layout::Page => f.write_str("page"),
            Layout::Default => f.write_str("default"),
            Layout::Custom(name) => f.write_str(name),
        }
    }
}

/// Where a page's link list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    /// Declared in a `links:` front-matter list
    FrontMatter,
    /// Collected from Markdown links in the body
    Body,
}

/// A dated blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// File stem, e.g. `2015-03-01-pi-digits`
    pub slug: String,

    /// Calendar date from the file name
    pub publish_date: NaiveDate,

    /// Optional time of day from the `date:` field
    pub date: Option<NaiveDateTime>,

    pub title: String,

    pub tags: BTreeSet<String>,

    pub categories: BTreeSet<String>,

    pub layout: Layout,

    /// Raw Markdown/HTML after the front matter
    pub body: String,

    /// Source file path relative to the site source
    pub source: String,

    pub published: bool,

    /// Per-post permalink override
    pub permalink: Option<String>,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Post {
    /// The title part of the slug (`pi-digits` for `2015-03-01-pi-digits`)
    pub fn title_slug(&self) -> &str {
        self.slug.get(11..).unwrap_or(&self.slug)
    }

    /// Structural outline of the body
    pub fn outline(&self) -> Outline {
        markdown::outline(&self.body)
    }

    /// Body text up to the excerpt separator
    pub fn excerpt(&self, separator: &str) -> &str {
        markdown::excerpt(&self.body, separator)
    }

    /// URL path under a Jekyll-style permalink pattern
    ///
    /// A front-matter `permalink:` always wins over the site pattern.
    pub fn url(&self, pattern: &str) -> String {
        if let Some(permalink) = &self.permalink {
            return permalink.clone();
        }

        let date = self.publish_date;
        let categories = self
            .categories
            .iter()
            .map(|c| slug::slugify(c))
            .collect::<Vec<_>>()
            .join("/");

        let url = pattern
            .replace(":year", &format!("{:04}", date.year()))
            .replace(":month", &format!("{:02}", date.month()))
            .replace(":day", &format!("{:02}", date.day()))
            .replace(":i_month", &date.month().to_string())
            .replace(":i_day", &date.day().to_string())
            .replace(":categories", &categories)
            .replace(":title", self.title_slug());

        // Empty :categories leaves a double slash behind
        let mut cleaned = String::with_capacity(url.len());
        for c in url.chars() {
            if c == '/' && cleaned.ends_with('/') {
                continue;
            }
            cleaned.push(c);
        }
        cleaned
    }

    /// Front matter that reproduces this record
    pub fn to_front_matter(&self) -> FrontMatter {
        FrontMatter {
            layout: Some(self.layout.to_string()),
            title: Some(self.title.clone()),
            date: self.date.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
            tags: self.tags.iter().cloned().collect(),
            categories: self.categories.iter().cloned().collect(),
            published: (!self.published).then_some(false),
            permalink: self.permalink.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Serialize back into a content file
    pub fn to_document(&self) -> String {
        render_document(&self.to_front_matter(), &self.body)
    }
}

/// A standalone, undated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Path-derived identifier, e.g. `about` or `projects/foo`
    pub slug: String,

    pub title: String,

    pub layout: Layout,

    pub body: String,

    pub source: String,

    /// Ordered (label, target) pairs
    pub links: Vec<Link>,

    pub links_from: LinkSource,

    pub published: bool,

    pub permalink: Option<String>,

    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Page {
    pub fn outline(&self) -> Outline {
        markdown::outline(&self.body)
    }

    /// URL path of the page
    pub fn url(&self) -> String {
        if let Some(permalink) = &self.permalink {
            return permalink.clone();
        }
        if self.slug == "index" {
            "/".to_string()
        } else {
            format!("/{}/", self.slug)
        }
    }

    /// Front matter that reproduces this record
    ///
    /// Keys a page does not interpret (`tags`, `date`, ...) live in
    /// `extra` and are written back from there.
    pub fn to_front_matter(&self) -> FrontMatter {
        let mut extra = self.extra.clone();
        if self.links_from == LinkSource::FrontMatter {
            if let Ok(links) = serde_yaml::to_value(&self.links) {
                extra.insert("links".to_string(), links);
            }
        }
        FrontMatter {
            layout: Some(self.layout.to_string()),
            title: Some(self.title.clone()),
            published: (!self.published).then_some(false),
            permalink: self.permalink.clone(),
            extra,
            ..Default::default()
        }
    }

    pub fn to_document(&self) -> String {
        render_document(&self.to_front_matter(), &self.body)
    }
}

fn render_document(fm: &FrontMatter, body: &str) -> String {
    let yaml = fm.to_yaml();
    let mut doc = String::with_capacity(yaml.len() + body.len() + 8);
    doc.push_str("---\n");
    doc.push_str(&yaml);
    if !yaml.is_empty() && !yaml.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("---\n");
    doc.push_str(body);
    doc
}
