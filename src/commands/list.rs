//! List site content

use anyhow::Result;
use std::io::Write;

use crate::index::ContentIndex;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let index = blog.index()?;
    let stdout = std::io::stdout();
    write_listing(&index, content_type, &mut stdout.lock())
}

/// Write a listing of `content_type` to `out`
pub fn write_listing(index: &ContentIndex, content_type: &str, out: &mut dyn Write) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = index.posts();
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts {
                writeln!(
                    out,
                    "  {} - {} [{}]",
                    post.publish_date.format("%Y-%m-%d"),
                    post.title,
                    post.slug
                )?;
            }
        }
        "page" | "pages" => {
            let pages = index.pages();
            writeln!(out, "Pages ({}):", pages.len())?;
            for page in pages {
                writeln!(out, "  {} [{}]", page.title, page.slug)?;
                for link in &page.links {
                    writeln!(out, "    - {} -> {}", link.label, link.target)?;
                }
            }
        }
        "tag" | "tags" => {
            let tags = counted(index.tags());
            writeln!(out, "Tags ({}):", tags.len())?;
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        "category" | "categories" => {
            let categories = counted(index.categories());
            writeln!(out, "Categories ({}):", categories.len())?;
            for (cat, count) in categories {
                writeln!(out, "  {} ({})", cat, count)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, tag, category",
                content_type
            );
        }
    }

    Ok(())
}

/// Most used first, then by name
fn counted<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
}
