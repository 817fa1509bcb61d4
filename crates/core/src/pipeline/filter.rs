use std::path::{Path, PathBuf};

use crate::types::{Post, SkipReason};

/// Terms that always suppress a reply. Nobody grieving gets corrected.
const BUILTIN_TERMS: &[&str] = &[
    "funeral",
    "passed away",
    "rest in peace",
    "condolences",
    "suicide",
    "cancer",
    "hospital",
    "memorial",
];

#[derive(Debug, thiserror::Error)]
pub enum BlacklistError {
    #[error("failed to read blacklist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lower-cased substrings; matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    terms: Vec<String>,
}

impl Blacklist {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        list.extend(terms);
        list
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_TERMS)
    }

    /// Built-in terms plus the entries of `path`, if given.
    pub fn load(path: Option<&Path>) -> Result<Self, BlacklistError> {
        let mut list = Self::builtin();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path).map_err(|source| BlacklistError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            list.extend(parse(&text));
            tracing::info!(path = %path.display(), terms = list.len(), "blacklist loaded");
        }
        Ok(list)
    }

    fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.terms.contains(&term) {
                self.terms.push(term);
            }
        }
    }

    /// First term contained in `haystack`.
    pub fn find_in(&self, haystack: &str) -> Option<&str> {
        let lowered = haystack.to_lowercase();
        self.terms
            .iter()
            .find(|t| lowered.contains(t.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One term per line; blank lines and `#` comments are ignored.
fn parse(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

/// Appropriateness check: sensitive flag, then every author and body field.
pub fn check(post: &Post, blacklist: &Blacklist) -> Result<(), SkipReason> {
    if post.sensitive {
        return Err(SkipReason::Sensitive);
    }
    let fields = [
        ("name", post.author.name.as_str()),
        ("handle", post.author.handle.as_str()),
        ("bio", post.author.bio.as_str()),
        ("text", post.text.as_str()),
    ];
    for (field, value) in fields {
        if let Some(term) = blacklist.find_in(value) {
            return Err(SkipReason::Blacklisted {
                field,
                term: term.to_owned(),
            });
        }
    }
    Ok(())
}
