use regex::RegexSet;
use std::path::Path;

/// Runtime filter compiled from an ignore pattern list. Patterns are regular
/// expressions anchored at the start of the event path.
#[derive(Debug)]
pub struct PathFilter {
    ignore: RegexSet,
}

impl PathFilter {
    /// Build a filter. An empty list ignores nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let anchored: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            // an empty pattern would match every path
            .filter(|p| !p.is_empty())
            .map(|p| format!("^(?:{p})"))
            .collect();
        Ok(Self {
            ignore: RegexSet::new(anchored)?,
        })
    }

    /// True if the event on `path` must be suppressed.
    pub fn is_ignored<P: AsRef<Path>>(&self, path: P) -> bool {
        self.ignore.is_match(&path.as_ref().to_string_lossy())
    }
}
