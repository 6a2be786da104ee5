use crate::ExtractionError;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Ordered, duplicate-free set of absolute image URLs
///
/// Insertion order is preserved and uniqueness is exact string equality on
/// the normalized form, so the first occurrence of an image wins its slot.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every raw candidate against `base` and keep the usable ones.
    pub fn from_candidates<I, S>(base: &Url, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for candidate in candidates {
            set.insert_resolved(base, candidate.as_ref());
        }
        set
    }

    /// Returns true when the candidate resolved to a new entry.
    pub fn insert_resolved(&mut self, base: &Url, raw: &str) -> bool {
        match resolve_image_url(base, raw) {
            Some(url) => self.insert(url),
            None => false,
        }
    }

    fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

impl IntoIterator for ResultSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.into_iter()
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.urls.serialize(serializer)
    }
}

/// Resolve a raw image reference to an absolute `http(s)` URL.
///
/// Relative references are joined onto `base`. Empty input, `data:` URIs,
/// other schemes and anything that fails to parse yield `None`.
pub fn resolve_image_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.into()),
        _ => None,
    }
}

/// URL portion of the first candidate in a `srcset` value, descriptor dropped.
pub fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
}

pub fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ExtractionError::InvalidInput(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else if seconds > 0 {
        format!("{}.{}s", seconds, millis / 100)
    } else {
        format!("{millis}ms")
    }
}
