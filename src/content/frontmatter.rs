//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::ParseError;
use super::markdown::Link;

/// Custom deserializer that handles both a list of strings and a
/// space-separated string (Jekyll accepts `tags: a b c`)
fn words_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct WordsOrVec;

    impl<'de> Visitor<'de> for WordsOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<serde_yaml::Value>()? {
                match item {
                    serde_yaml::Value::String(s) => vec.push(s),
                    serde_yaml::Value::Number(n) => vec.push(n.to_string()),
                    serde_yaml::Value::Bool(b) => vec.push(b.to_string()),
                    serde_yaml::Value::Null => {}
                    _ => return Err(de::Error::custom("tags must be plain strings")),
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(WordsOrVec)
}

/// Front-matter data from a post or page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "date_value")]
    pub date: Option<String>,
    #[serde(deserialize_with = "words_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "words_or_vec", skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    /// Additional custom fields, in file order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Dates may be written bare (`date: 2015-03-01`), which YAML may hand
/// us as a non-string scalar; normalise to text.
fn date_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(
            serde_yaml::to_string(&other)
                .unwrap_or_default()
                .trim()
                .to_string(),
        ),
    })
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), ParseError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let first_line_end = content.find('\n').unwrap_or(content.len());
        if content[..first_line_end].trim_end() != "---" {
            return Err(ParseError::MissingFrontMatter);
        }
        let rest = content.get(first_line_end + 1..).unwrap_or("");

        // Walk line by line looking for the closing fence
        let mut offset = 0;
        let mut closing = None;
        for line in rest.split_inclusive('\n') {
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                closing = Some((offset, offset + line.len()));
                break;
            }
            offset += line.len();
        }

        let (yaml_end, body_start) = closing.ok_or(ParseError::UnterminatedFrontMatter)?;
        let yaml_content = &rest[..yaml_end];
        let body = &rest[body_start..];

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let fm: FrontMatter = serde_yaml::from_str(yaml_content)?;
        Ok((fm, body))
    }

    /// Parse the date field, if any
    ///
    /// A present but unparseable date is an error rather than `None`.
    pub fn parse_date(&self) -> Result<Option<NaiveDateTime>, ParseError> {
        match &self.date {
            None => Ok(None),
            Some(s) => parse_date_string(s)
                .map(Some)
                .ok_or_else(|| ParseError::InvalidDate(s.clone())),
        }
    }

    /// A `links:` list read as ordered (label, target) pairs
    ///
    /// Items may be plain targets, `{label, target}` maps (`title`/`url`
    /// also accepted) or single-entry `{label: target}` maps. `None` when
    /// the key is absent, empty, or holds anything else.
    pub fn links(&self) -> Option<Vec<Link>> {
        let items = self.extra.get("links")?.as_sequence()?;
        if items.is_empty() {
            return None;
        }
        items.iter().map(link_entry).collect()
    }

    /// Serialize back into YAML (without fences)
    pub fn to_yaml(&self) -> String {
        if *self == FrontMatter::default() {
            return String::new();
        }
        serde_yaml::to_string(self).unwrap_or_default()
    }
}

fn link_entry(item: &serde_yaml::Value) -> Option<Link> {
    use serde_yaml::Value;

    match item {
        Value::String(target) => Some(Link {
            label: target.clone(),
            target: target.clone(),
        }),
        Value::Mapping(map) => {
            let field = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| map.get(*k).and_then(Value::as_str))
                    .map(str::to_string)
            };
            if let Some(target) = field(&["target", "url"]) {
                let label = field(&["label", "title", "name"]).unwrap_or_else(|| target.clone());
                return Some(Link { label, target });
            }
            match map.iter().next() {
                Some((Value::String(label), Value::String(target))) if map.len() == 1 => {
                    Some(Link {
                        label: label.clone(),
                        target: target.clone(),
                    })
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Parse a date string in various formats
///
/// Offsets are dropped: the calendar day as written is what counts.
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // Jekyll style "2015-03-01 10:00:00 +0100"
    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"] {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
layout: post
title: Hello World
date: 2024-01-15 10:30:00
tags:
  - rust
  - jekyll
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, Some("Hello World".to_string()));
        assert_eq!(fm.layout, Some("post".to_string()));
        assert_eq!(fm.tags, vec!["rust", "jekyll"]);
        assert_eq!(body, "\nThis is the content.\n");
    }

    #[test]
    fn test_space_separated_tags() {
        let content = "---\ntitle: T\ntags: python benchmarks pypy\n---\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["python", "benchmarks", "pypy"]);
        assert_eq!(body, "");
    }

    #[test]
    fn test_bare_date_value() {
        let content = "---\ntitle: T\ndate: 2015-03-01\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let dt = fm.parse_date().unwrap().unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2015-03-01");
    }

    #[test]
    fn test_invalid_date_is_error() {
        let fm = FrontMatter {
            date: Some("yesterday-ish".to_string()),
            ..Default::default()
        };
        assert!(matches!(fm.parse_date(), Err(ParseError::InvalidDate(_))));
    }

    #[test]
    fn test_date_with_offset() {
        let dt = parse_date_string("2015-03-01 23:30:00 +0100").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2015-03-01 23:30");
    }

    #[test]
    fn test_missing_front_matter() {
        let err = FrontMatter::parse("Just prose.\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingFrontMatter));
    }

    #[test]
    fn test_unterminated_front_matter() {
        let err = FrontMatter::parse("---\ntitle: Oops\n\nbody").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFrontMatter));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }

    #[test]
    fn test_empty_block_is_default() {
        let (fm, body) = FrontMatter::parse("---\n---\nHi").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "Hi");
    }

    #[test]
    fn test_body_separator_not_confused_with_fence() {
        let content = "---\ntitle: Rules\n---\nabove\n\n---\n\nbelow\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Rules"));
        assert!(body.contains("above"));
        assert!(body.contains("below"));
    }

    #[test]
    fn test_links_and_extra_fields() {
        let content = r#"---
title: Talks
links:
  - label: PyCon 2014
    target: /talks/pycon-2014/
comments: true
---
"#;
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let links = fm.links().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "PyCon 2014");
        assert_eq!(links[0].target, "/talks/pycon-2014/");
        assert_eq!(
            fm.extra.get("comments"),
            Some(&serde_yaml::Value::Bool(true))
        );
    }

    #[test]
    fn test_to_yaml_reparses() {
        let content = "---\nlayout: post\ntitle: \"Example: colon\"\ntags: [a, b]\nmathjax: true\n---\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let yaml = fm.to_yaml();
        let reparsed: FrontMatter = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(fm, reparsed);
    }

    #[test]
    fn test_links_accept_plain_targets() {
        let content = "---\ntitle: X\nlinks:\n  - https://example.org\n  - Slides: /slides/\n  - url: /video/\n---\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let links = fm.links().unwrap();
        assert_eq!(
            links,
            vec![
                Link {
                    label: "https://example.org".to_string(),
                    target: "https://example.org".to_string(),
                },
                Link {
                    label: "Slides".to_string(),
                    target: "/slides/".to_string(),
                },
                Link {
                    label: "/video/".to_string(),
                    target: "/video/".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_links_not_a_list() {
        let (fm, _) = FrontMatter::parse("---\ntitle: X\nlinks: 3\n---\n").unwrap();
        assert_eq!(fm.links(), None);
        assert!(fm.extra.contains_key("links"));

        let (fm, _) = FrontMatter::parse("---\ntitle: X\nlinks:\n  - [1, 2]\n---\n").unwrap();
        assert_eq!(fm.links(), None);
    }

    #[test]
    fn test_leading_bom() {
        let (fm, body) = FrontMatter::parse("\u{feff}---\ntitle: X\n---\nBody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("X"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_dots_close_front_matter() {
        let (fm, body) = FrontMatter::parse("---\ntitle: X\n...\nBody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("X"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: X\r\ntags: [a, b]\r\n---\r\nBody\r\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("X"));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_rfc3339_dates() {
        let dt = parse_date_string("2015-03-01T10:15:00+01:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2015-03-01 10:15");

        let dt = parse_date_string("2015-03-01T23:59:59Z").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2015-03-01 23:59:59");
    }
}
