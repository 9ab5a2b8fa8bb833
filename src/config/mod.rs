//! Configuration module

mod site;

pub use site::DuplicatePolicy;
pub use site::SiteConfig;
