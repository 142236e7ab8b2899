//! Text exports.
//!
//! ```text
//!   Title ──┐
//!           ├─► velest     (1D, fixed width)
//!   Page ───┤
//!           └─► delimited  (3D, pipe separated)
//! ```
//!
//! Both share the first line (title) and the optional `#` banner line
//! that follows it when the page is truncated.

pub mod delimited;
pub mod velest;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::page::Page;

/// How the first line of an export is composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    /// `<author> model - <nfo>` from the request values.
    #[default]
    Request,
    /// `1D <nfo> <bibref>` / `3D <nfo> <bibref>` from stored values.
    Reference,
}

/// First line of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Title {
    Request {
        author: String,
        nfo: String,
    },
    Reference {
        prefix: &'static str,
        nfo: String,
        bibref: Option<String>,
    },
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Title::Request { author, nfo } => write!(f, "{author} model - {nfo}"),
            Title::Reference {
                prefix,
                nfo,
                bibref,
            } => match bibref.as_deref() {
                Some(bibref) if !bibref.is_empty() => write!(f, "{prefix} {nfo} {bibref}"),
                _ => write!(f, "{prefix} {nfo}"),
            },
        }
    }
}

/// Title line followed by the banner, if the page is truncated.
fn preamble<T>(title: &Title, page: &Page<T>) -> Vec<String> {
    let mut lines = vec![title.to_string()];
    if let Some(banner) = page.banner() {
        lines.push(banner.to_string());
    }
    lines
}
