//! Show a single record as JSON

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::content::Outline;
use crate::index::{ContentIndex, Entry};
use crate::Blog;

#[derive(Serialize)]
struct Shown<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    url: String,
    outline: Outline,
}

/// Print the record at `slug`
pub fn run(blog: &Blog, slug: &str) -> Result<()> {
    let index = blog.index()?;
    let stdout = std::io::stdout();
    write_entry(&index, slug, &blog.config.permalink, &mut stdout.lock())
}

/// Write the record at `slug`, its URL and body outline as JSON
pub fn write_entry(index: &ContentIndex, slug: &str, permalink: &str, out: &mut dyn Write) -> Result<()> {
    let Some(entry) = index.get(slug) else {
        anyhow::bail!("No post or page with slug {:?}", slug);
    };

    let outline = match entry {
        Entry::Post(post) => post.outline(),
        Entry::Page(page) => page.outline(),
    };
    let shown = Shown {
        entry,
        url: entry.url(permalink),
        outline,
    };

    serde_json::to_writer_pretty(&mut *out, &shown)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::loader::{parse_post, LoadReport};

    #[test]
    fn test_show_post() {
        let report = LoadReport {
            posts: vec![parse_post(
                "_posts/2015-03-01-pi.md",
                "---\ntitle: Pi\ntags: [math]\n---\n```python\nprint(3.14)\n```\n",
            )
            .unwrap()],
            ..Default::default()
        };
        let config = SiteConfig::default();
        let index = ContentIndex::build(report, &config).unwrap();

        let mut out = Vec::new();
        write_entry(&index, "2015-03-01-pi", &config.permalink, &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["kind"], "post");
        assert_eq!(json["title"], "Pi");
        assert_eq!(json["publish_date"], "2015-03-01");
        assert_eq!(json["layout"], "post");
        assert_eq!(json["url"], "/2015/03/01/pi.html");
        assert_eq!(json["outline"]["code_blocks"][0]["lang"], "python");
    }

    #[test]
    fn test_show_missing() {
        let index = ContentIndex::build(LoadReport::default(), &SiteConfig::default()).unwrap();
        let mut out = Vec::new();
        assert!(write_entry(&index, "nope", "/:title/", &mut out).is_err());
    }
}
