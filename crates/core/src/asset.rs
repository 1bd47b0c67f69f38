// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asset reference gate applied before a room is pushed to the remote

/// Policy for the picture URLs a room must carry to be pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPolicy {
    /// Minimum number of valid references required to push
    pub min_valid: usize,
    /// Maximum number of references sent in one upload
    pub max_upload: usize,
}

impl Default for AssetPolicy {
    fn default() -> Self {
        Self {
            min_valid: 4,
            max_upload: 10,
        }
    }
}

/// Result of evaluating a room's references against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetVerdict {
    /// Enough valid references; `upload` is capped at `max_upload`
    Accept { upload: Vec<String>, rejected: usize },
    /// Too few valid references; the push must be skipped
    Insufficient { valid: usize, required: usize },
}

impl AssetPolicy {
    pub fn new(min_valid: usize, max_upload: usize) -> Self {
        Self {
            min_valid,
            max_upload,
        }
    }

    /// Keep only well-formed absolute http(s) references, in order
    pub fn filter_valid(urls: &[String]) -> Vec<String> {
        urls.iter().filter(|u| is_http_url(u)).cloned().collect()
    }

    pub fn evaluate(&self, urls: &[String]) -> AssetVerdict {
        let mut valid = Self::filter_valid(urls);
        let rejected = urls.len() - valid.len();
        if valid.len() < self.min_valid {
            return AssetVerdict::Insufficient {
                valid: valid.len(),
                required: self.min_valid,
            };
        }
        valid.truncate(self.max_upload);
        AssetVerdict::Accept {
            upload: valid,
            rejected,
        }
    }
}

/// An absolute `http://` or `https://` URL with a non-empty host and no whitespace
pub fn is_http_url(url: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !url.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[path = "asset_tests.rs"]
mod tests;
