//! Recipient phone numbers

use crate::error::AlertError;
use std::collections::HashSet;
use std::fmt;

/// An E.164 phone number: `+` followed by 8 to 15 digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a raw number, trimming surrounding whitespace
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('+')
            .ok_or_else(|| AlertError::validation(format!("'{trimmed}' must start with '+'")))?;

        if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AlertError::validation(format!(
                "'{trimmed}' is not an E.164 phone number"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Number with its leading `+`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number without the leading `+`, as messaging APIs expect it
    #[must_use]
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty list of distinct recipients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientList(Vec<PhoneNumber>);

impl RecipientList {
    /// Validate every entry, rejecting empty lists and duplicates
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> crate::Result<Self> {
        if raw.is_empty() {
            return Err(AlertError::validation("at least one recipient is required"));
        }

        let mut seen = HashSet::new();
        let mut numbers = Vec::with_capacity(raw.len());
        for entry in raw {
            let number = PhoneNumber::parse(entry.as_ref())?;
            if !seen.insert(number.clone()) {
                return Err(AlertError::validation(format!(
                    "duplicate recipient '{number}'"
                )));
            }
            numbers.push(number);
        }

        Ok(Self(numbers))
    }

    /// Recipients in delivery order
    pub fn iter(&self) -> impl Iterator<Item = &PhoneNumber> {
        self.0.iter()
    }

    /// Number of recipients
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a parsed list
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a PhoneNumber;
    type IntoIter = std::slice::Iter<'a, PhoneNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
