//! Slug and identifier derivation

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path};

use super::error::ParseError;

lazy_static! {
    static ref DATED_STEM: Regex =
        Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})-(.+)$").expect("valid dated-stem regex");
}

/// Whether a file stem looks like `YYYY-MM-DD-title`
pub fn is_dated_stem(stem: &str) -> bool {
    DATED_STEM.is_match(stem)
}

/// Split a post file stem into its publish date and title part
///
/// `2015-03-01-pi-digits` -> (2015-03-01, "pi-digits")
pub fn split_dated_stem(stem: &str) -> Result<(NaiveDate, &str), ParseError> {
    let caps = DATED_STEM
        .captures(stem)
        .ok_or_else(|| ParseError::InvalidFileName(stem.to_string()))?;

    let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
    let (year, month, day) = (field(1), field(2), field(3));
    let date = NaiveDate::from_ymd_opt(
        year.parse().unwrap_or(0),
        month.parse().unwrap_or(0),
        day.parse().unwrap_or(0),
    )
    .ok_or_else(|| ParseError::InvalidDate(format!("{}-{}-{}", year, month, day)))?;

    let title_part = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
    Ok((date, title_part))
}

/// Slug for a standalone page, from its source-relative path
///
/// `about.md` -> `about`, `projects/foo.md` -> `projects/foo`,
/// `talks/index.md` -> `talks`, `index.html` -> `index`
pub fn page_slug(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    match parts.split_last() {
        Some((last, parents)) if last == "index" && !parents.is_empty() => parents.join("/"),
        Some(_) => parts.join("/"),
        None => "index".to_string(),
    }
}

/// URL-friendly form of a title, used when scaffolding new content
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}
