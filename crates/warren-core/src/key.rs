use crate::error::CoreError;
use std::fmt::Display;
use std::str::FromStr;

const DELIMITER: char = ':';

/// The storage key of a URL record: `"{instance_index}:{sequence}"`.
///
/// Both parts are non-negative, so the delimiter can never occur inside a
/// part and every key has exactly one `(instance_index, sequence)` reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    instance_index: i64,
    sequence: i64,
}

impl CompositeKey {
    /// Creates a key, rejecting negative parts.
    pub fn new(instance_index: i64, sequence: i64) -> Result<Self, CoreError> {
        if instance_index < 0 {
            return Err(CoreError::NegativeKeyPart(instance_index));
        }
        if sequence < 0 {
            return Err(CoreError::NegativeKeyPart(sequence));
        }
        Ok(Self {
            instance_index,
            sequence,
        })
    }

    pub fn instance_index(&self) -> i64 {
        self.instance_index
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.instance_index, DELIMITER, self.sequence)
    }
}

impl FromStr for CompositeKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidKey(s.to_string());

        let (instance, sequence) = s.split_once(DELIMITER).ok_or_else(invalid)?;
        // `i64::from_str` accepts a leading '+', which would break the
        // one-text-per-key property.
        if !is_decimal(instance) || !is_decimal(sequence) {
            return Err(invalid());
        }

        let instance = instance.parse::<i64>().map_err(|_| invalid())?;
        let sequence = sequence.parse::<i64>().map_err(|_| invalid())?;
        Self::new(instance, sequence)
    }
}

fn is_decimal(part: &str) -> bool {
    !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'))
}
