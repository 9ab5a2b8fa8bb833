//! Create a new post or page

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::content::slug::slugify;
use crate::content::{FrontMatter, Layout};
use crate::Blog;

/// Create a new post or page and return its path
///
/// Posts land in the posts directory as `YYYY-MM-DD-<slug>.md`; pages as
/// `<slug>.md` in the source directory.
pub fn create(blog: &Blog, title: &str, layout: &Layout, date: NaiveDate) -> Result<PathBuf> {
    let slug = slugify(title);
    if slug.is_empty() {
        bail!("Title {:?} does not produce a usable slug", title);
    }

    let file_path = match layout {
        Layout::Page => blog.source_dir.join(format!("{}.md", slug)),
        _ => blog
            .posts_dir()
            .join(format!("{}-{}.md", date.format("%Y-%m-%d"), slug)),
    };

    // Check if file already exists
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let fm = FrontMatter {
        layout: Some(layout.to_string()),
        title: Some(title.to_string()),
        ..Default::default()
    };
    let content = format!("---\n{}---\n", fm.to_yaml());

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;

    tracing::info!("Created {:?}", file_path);

    Ok(file_path)
}

/// Run the new command, dating posts today
pub fn run(blog: &Blog, title: &str, layout: &str) -> Result<PathBuf> {
    let today = chrono::Local::now().date_naive();
    create(blog, title, &Layout::from(layout), today)
}
