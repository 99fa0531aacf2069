use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("Vocabulary must contain at least one character")]
    Empty,
    #[error("Vocabulary contains '{0}' more than once")]
    Duplicate(char),
}

/// Ordered set of characters a recognition model can emit.
///
/// Class `i` of the model output maps to the `i`-th character; the class right
/// after the last character (`len()`) is the CTC blank and is never part of
/// the vocabulary itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vocabulary(Vec<char>);

impl Vocabulary {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Result<Self, VocabularyError> {
        let chars: Vec<char> = chars.into_iter().collect();
        if chars.is_empty() {
            return Err(VocabularyError::Empty);
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(VocabularyError::Duplicate(*c));
            }
        }
        Ok(Vocabulary(chars))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the CTC blank class.
    pub fn blank_index(&self) -> usize {
        self.0.len()
    }

    /// Number of output classes a compatible model must produce (vocabulary + blank).
    pub fn class_count(&self) -> usize {
        self.0.len() + 1
    }

    /// Character for a class index; `None` for the blank or anything past it.
    pub fn get(&self, index: usize) -> Option<char> {
        self.0.get(index).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.0
    }
}

impl TryFrom<String> for Vocabulary {
    type Error = VocabularyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Vocabulary::new(value.chars())
    }
}

impl std::str::FromStr for Vocabulary {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vocabulary::new(s.chars())
    }
}

impl From<Vocabulary> for String {
    fn from(v: Vocabulary) -> Self {
        v.0.into_iter().collect()
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
