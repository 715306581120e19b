//! Splits a raw input line into whitespace-delimited words.
//!
//! There is no quoting or substitution: every run of non-whitespace characters
//! becomes one token, in the order it appears on the line.

use std::collections::TryReserveError;

/// Errors that can occur while tokenizing a line.
#[derive(Debug, thiserror::Error)]
pub enum LexingError {
    /// Storage for a token could not be reserved.
    #[error("failed to store token: {0}")]
    Storage(#[from] TryReserveError),
}

/// Ordered sequence of words produced by [`tokenize`].
///
/// Supports the handful of operations the launcher needs to strip shell-level
/// markers before a program sees its argument vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    words: Vec<String>,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// Position of the first word equal to `value`.
    pub fn find(&self, value: &str) -> Option<usize> {
        self.words.iter().position(|w| w == value)
    }

    /// Removes and returns the word at `index`, shifting later words left.
    pub fn take(&mut self, index: usize) -> Option<String> {
        if index < self.words.len() {
            Some(self.words.remove(index))
        } else {
            None
        }
    }

    /// Drops every word from `len` onwards.
    pub fn truncate(&mut self, len: usize) {
        self.words.truncate(len);
    }

    pub fn last(&self) -> Option<&str> {
        self.words.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.words
    }

    fn push(&mut self, word: &str) -> Result<(), LexingError> {
        self.words.try_reserve(1)?;
        self.words.push(word.to_owned());
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Tokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Tokenizes `line` on whitespace.
///
/// Fails only when a token cannot be stored; callers treat that as fatal.
pub fn tokenize(line: &str) -> Result<Tokens, LexingError> {
    let mut tokens = Tokens::new();
    for word in line.split_whitespace() {
        tokens.push(word)?;
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_any_whitespace() {
        let tokens = tokenize("  sleep\t5   &\n").unwrap();
        assert_eq!(tokens.into_vec(), vec!["sleep", "5", "&"]);
    }

    #[test]
    fn test_empty_line_has_no_tokens() {
        assert!(tokenize("   \n").unwrap().is_empty());
    }

    #[test]
    fn test_find_take_and_truncate() {
        let mut tokens: Tokens = ["cat", "<", "in.txt", "extra"].into_iter().collect();

        assert_eq!(tokens.find("<"), Some(1));
        assert_eq!(tokens.find(">"), None);

        assert_eq!(tokens.take(2).as_deref(), Some("in.txt"));
        assert_eq!(tokens.take(1).as_deref(), Some("<"));
        assert_eq!(tokens.take(5), None);
        assert_eq!(tokens.get(1), Some("extra"));

        tokens.truncate(1);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.last(), Some("cat"));
    }

    #[test]
    fn test_storage_error_keeps_its_cause() {
        use std::error::Error;

        let cause = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        let err = LexingError::from(cause);

        assert!(err.to_string().starts_with("failed to store token: "));
        assert!(err.source().is_some());
    }
}
