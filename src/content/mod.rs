//! Content module - posts, pages, and front-matter parsing

mod error;
mod frontmatter;
pub mod loader;
pub mod markdown;
mod post;
pub mod slug;

pub use error::ParseError;
pub use frontmatter::FrontMatter;
pub use markdown::{CodeBlock, Image, Link, Outline};
pub use post::{Layout, LinkSource, Page, Post};
