use crate::error::{Result, SearchError};
use std::collections::BTreeSet;

/// Lazy iterator over the space separated words of a text.
///
/// Runs of spaces collapse, leading and trailing spaces are ignored. The
/// iterator is `Clone`, so a sequence can be restarted from any point.
#[derive(Debug, Clone)]
pub struct Words<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Iterator for Words<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.by_ref().find(|word| !word.is_empty())
    }
}

pub fn split_into_words(text: &str) -> Words<'_> {
    Words { inner: text.split(' ') }
}

/// A word is valid when it holds no ASCII control character (below `0x20`).
pub fn is_valid_word(word: &str) -> bool {
    !word.bytes().any(|b| b < b' ')
}

/// Collects the distinct non-empty strings of `strings`.
pub fn unique_non_empty_strings<I, S>(strings: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .filter(|s| !s.as_ref().is_empty())
        .map(|s| s.as_ref().to_owned())
        .collect()
}

/// Builds a validated stop-word set.
pub fn make_stop_words<I, S>(strings: I) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let stop_words = unique_non_empty_strings(strings);
    if let Some(bad) = stop_words.iter().find(|w| !is_valid_word(w)) {
        return Err(SearchError::InvalidStopWord(bad.clone()));
    }
    Ok(stop_words)
}
