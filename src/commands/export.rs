//! Export the whole index as JSON

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::content::{Page, Post};
use crate::index::ContentIndex;
use crate::Blog;

#[derive(Serialize)]
struct Export<'a> {
    title: &'a str,
    url: &'a str,
    baseurl: &'a str,
    posts: Vec<ExportedPost<'a>>,
    pages: Vec<ExportedPage<'a>>,
    tags: BTreeMap<&'a str, Vec<&'a str>>,
}

#[derive(Serialize)]
struct ExportedPost<'a> {
    #[serde(flatten)]
    post: &'a Post,
    url: String,
    excerpt: &'a str,
}

#[derive(Serialize)]
struct ExportedPage<'a> {
    #[serde(flatten)]
    page: &'a Page,
    url: String,
}

/// Export the index to `output`, or stdout when `None`
pub fn run(blog: &Blog, output: Option<&Path>) -> Result<()> {
    let index = blog.index()?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            write_export(blog, &index, &mut file)?;
            tracing::info!("Exported {} entries to {:?}", index.len(), path);
        }
        None => {
            let stdout = std::io::stdout();
            write_export(blog, &index, &mut stdout.lock())?;
        }
    }

    Ok(())
}

/// Write the index as a single JSON document
pub fn write_export(blog: &Blog, index: &ContentIndex, out: &mut dyn Write) -> Result<()> {
    let config = &blog.config;

    let posts = index
        .posts()
        .into_iter()
        .map(|post| ExportedPost {
            post,
            url: post.url(&config.permalink),
            excerpt: post.excerpt(&config.excerpt_separator),
        })
        .collect();

    let pages = index
        .pages()
        .into_iter()
        .map(|page| ExportedPage {
            page,
            url: page.url(),
        })
        .collect();

    let mut tags: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for post in index.posts() {
        for tag in &post.tags {
            tags.entry(tag.as_str()).or_default().push(post.slug.as_str());
        }
    }

    let export = Export {
        title: &config.title,
        url: &config.url,
        baseurl: &config.baseurl,
        posts,
        pages,
        tags,
    };

    serde_json::to_writer_pretty(&mut *out, &export)?;
    writeln!(out)?;
    Ok(())
}
