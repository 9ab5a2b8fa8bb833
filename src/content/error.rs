//! Per-file content errors

use thiserror::Error;

/// Why a single content file could not be turned into a record
///
/// These are recoverable: the loader records them and moves on to the
/// next file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("missing front-matter block (file must start with ---)")]
    MissingFrontMatter,

    #[error("front-matter block is not closed with ---")]
    UnterminatedFrontMatter,

    #[error("malformed front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("post file name must look like YYYY-MM-DD-title: {0}")]
    InvalidFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
