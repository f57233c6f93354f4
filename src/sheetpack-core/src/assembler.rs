//! Builds [`MultiPageInfo`] from a directory of `<prefix>.<title>.<ext>` files.

use crate::error::{ResolveError, ResolveResult};
use crate::pack::AssetSource;
use crate::records::{InfoPage, MultiPageInfo};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::{self, BufRead, BufReader, Read};

/// How pages are ordered before assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrder {
    /// Sort by the filename prefix: numerically when it is all digits.
    #[default]
    Prefix,
    /// Keep whatever order the asset source lists files in.
    Listing,
}

/// A parsed info page filename, e.g. `01.PRIMAL_INSTINCT.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFileName {
    pub file_name: String,
    pub prefix: String,
    pub title: String,
}

impl PageFileName {
    pub fn parse(file_name: &str) -> ResolveResult<Self> {
        let segments: Vec<&str> = file_name.split('.').collect();
        let title = segments
            .get(1)
            .filter(|title| !title.is_empty())
            .map(|title| title.to_string())
            .ok_or_else(|| {
                ResolveError::parse_failure(format!(
                    "info file name '{file_name}' does not match <prefix>.<title>.<extension>"
                ))
            })?;

        Ok(Self {
            file_name: file_name.to_string(),
            prefix: segments[0].to_string(),
            title,
        })
    }

    fn numeric_prefix(&self) -> Option<&str> {
        let digits = &self.prefix;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        Some(if trimmed.is_empty() { "0" } else { trimmed })
    }

    fn cmp_prefix(&self, other: &Self) -> Ordering {
        let by_prefix = match (self.numeric_prefix(), other.numeric_prefix()) {
            (Some(a), Some(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.prefix.cmp(&other.prefix),
        };
        by_prefix.then_with(|| self.file_name.cmp(&other.file_name))
    }
}

/// Lists `path`, parses every filename and reads each file into a page.
pub fn assemble<A: AssetSource + ?Sized>(
    assets: &A,
    path: &str,
    order: PageOrder,
) -> ResolveResult<MultiPageInfo> {
    let mut files = assets
        .list(path)?
        .iter()
        .map(|name| PageFileName::parse(name))
        .collect::<ResolveResult<Vec<_>>>()?;

    if order == PageOrder::Prefix {
        files.sort_by(PageFileName::cmp_prefix);
    }

    let mut info = MultiPageInfo::default();
    for file in files {
        let file_path = join_asset_path(path, &file.file_name);
        let content = read_text(assets.open(&file_path)?)?;
        tracing::debug!(path = %file_path, title = %file.title, "Assembled info page");
        info.pages.push(InfoPage {
            title: file.title,
            content,
        });
    }
    Ok(info)
}

fn join_asset_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Reads UTF-8 text line by line and rejoins it with `\n`.
fn read_text(stream: impl Read) -> io::Result<String> {
    let lines = BufReader::new(stream)
        .lines()
        .collect::<io::Result<Vec<_>>>()?;
    Ok(lines.join("\n"))
}
