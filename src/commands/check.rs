//! Check the corpus for problems

use anyhow::Result;
use std::io::Write;

use crate::index::ContentIndex;
use crate::Blog;

/// What a check found
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    /// Files that failed to load
    pub errors: usize,
    /// Replaced slugs, shared titles and dangling links
    pub warnings: usize,
}

impl CheckSummary {
    /// No file failed to load
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Run all checks and print a report
pub fn run(blog: &Blog) -> Result<CheckSummary> {
    let index = blog.index()?;
    let stdout = std::io::stdout();
    write_report(&index, &mut stdout.lock())
}

/// Write a problem report for `index` to `out`
pub fn write_report(index: &ContentIndex, out: &mut dyn Write) -> Result<CheckSummary> {
    let mut summary = CheckSummary::default();

    for failure in index.failures() {
        writeln!(out, "error: {}: {}", failure.path.display(), failure.error)?;
        summary.errors += 1;
    }

    for replaced in index.replaced() {
        writeln!(
            out,
            "warning: duplicate slug {}: {} replaced by {}",
            replaced.slug, replaced.dropped, replaced.kept
        )?;
        summary.warnings += 1;
    }

    for (title, posts) in index.duplicate_titles() {
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        writeln!(
            out,
            "warning: {} posts share the title {:?}: {}",
            posts.len(),
            title,
            slugs.join(", ")
        )?;
        summary.warnings += 1;
    }

    for link in index.dangling_links() {
        writeln!(
            out,
            "warning: {}: link [{}]({}) does not resolve",
            link.from, link.label, link.target
        )?;
        summary.warnings += 1;
    }

    writeln!(
        out,
        "{} entries, {} errors, {} warnings",
        index.len(),
        summary.errors,
        summary.warnings
    )?;

    Ok(summary)
}
