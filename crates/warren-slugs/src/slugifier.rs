use crate::error::SlugError;
use crate::settings::SlugsSettings;
use harsh::Harsh;
use std::fmt;
use warren_core::Slug;

/// Bidirectional mapping between `(instance_index, sequence)` and a slug.
///
/// Implementations are pure: the same configuration and inputs always
/// produce the same slug, and `decode` is the exact inverse of `encode`.
pub trait Slugifier: Send + Sync + 'static {
    /// Encodes a pair of non-negative numbers.
    ///
    /// Fails with [`SlugError::Encoding`] if either number is negative.
    fn encode(&self, instance_index: i64, sequence: i64) -> Result<Slug, SlugError>;

    /// Recovers the pair a slug was produced from.
    ///
    /// Fails with [`SlugError::Decode`] for strings this slugifier could not
    /// have produced, and with [`SlugError::Corrupted`] for valid codes that
    /// do not hold exactly two numbers.
    fn decode(&self, slug: &str) -> Result<(i64, i64), SlugError>;
}

/// A [`Slugifier`] backed by the Hashids scheme.
///
/// Uses the default Hashids alphabet, so slugs are compatible with any other
/// Hashids implementation configured with the same salt and minimum length.
pub struct HashidsSlugifier {
    harsh: Harsh,
    min_length: usize,
}

impl HashidsSlugifier {
    /// Builds the encoder.
    ///
    /// # Arguments
    ///
    /// * `settings` - The salt keying every slug and the length slugs are
    ///   padded up to
    pub fn new(settings: &SlugsSettings) -> Result<Self, harsh::BuildError> {
        let harsh = Harsh::builder()
            .salt(settings.salt.as_str())
            .length(settings.min_length)
            .build()?;

        Ok(Self {
            harsh,
            min_length: settings.min_length,
        })
    }

    /// Every slug this encoder produces has at least this many characters.
    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

// The inner codec would print the salt.
impl fmt::Debug for HashidsSlugifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashidsSlugifier")
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}

impl Slugifier for HashidsSlugifier {
    fn encode(&self, instance_index: i64, sequence: i64) -> Result<Slug, SlugError> {
        let numbers = [to_unsigned(instance_index)?, to_unsigned(sequence)?];
        Ok(Slug::new_unchecked(self.harsh.encode(&numbers)))
    }

    fn decode(&self, slug: &str) -> Result<(i64, i64), SlugError> {
        let numbers = self
            .harsh
            .decode(slug)
            .map_err(|e| SlugError::Decode(format!("{slug:?}: {e}")))?;

        // Only the canonical form of a number sequence is accepted.
        let reencoded = self.harsh.encode(&numbers);
        if numbers.is_empty() || reencoded != slug {
            return Err(SlugError::Decode(format!(
                "{slug:?} does not round-trip, canonical form is {reencoded:?}"
            )));
        }

        match numbers.as_slice() {
            &[instance_index, sequence] => Ok((to_signed(instance_index)?, to_signed(sequence)?)),
            other => Err(SlugError::Corrupted { count: other.len() }),
        }
    }
}

fn to_unsigned(value: i64) -> Result<u64, SlugError> {
    u64::try_from(value)
        .map_err(|_| SlugError::Encoding(format!("negative number not supported: {value}")))
}

fn to_signed(value: u64) -> Result<i64, SlugError> {
    i64::try_from(value).map_err(|_| SlugError::Decode(format!("number out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slugifier(salt: &str, min_length: usize) -> HashidsSlugifier {
        let settings = SlugsSettings::builder()
            .salt(salt)
            .min_length(min_length)
            .build();
        HashidsSlugifier::new(&settings).unwrap()
    }

    fn raw_harsh(salt: &str, min_length: usize) -> Harsh {
        Harsh::builder().salt(salt).length(min_length).build().unwrap()
    }

    #[test]
    fn constructible_with_empty_salt() {
        let settings = SlugsSettings::builder().salt("").build();
        let s = HashidsSlugifier::new(&settings).unwrap();
        assert_eq!(s.min_length(), 30);
    }

    #[test]
    fn matches_reference_vectors() {
        let h = raw_harsh("this is my salt", 0);
        assert_eq!(h.encode(&[1, 2, 3]), "laHquq");
        assert_eq!(h.encode(&[12345]), "NkK9");
        assert_eq!(raw_harsh("this is my salt", 8).encode(&[1]), "gB0NV05e");
        assert_eq!(raw_harsh("", 0).encode(&[1, 2, 3]), "o2fXhV");
    }

    #[test]
    fn returns_decodable_slug() {
        let s = slugifier("123", 8);

        let slug = s.encode(123, 456).unwrap();
        assert_eq!(slug.as_str(), "2V87tRpL");
        assert_eq!(s.decode(slug.as_str()).unwrap(), (123, 456));
    }

    #[test]
    fn encoding_is_deterministic() {
        let first = slugifier("pepper", 30);
        let second = slugifier("pepper", 30);
        assert_eq!(first.encode(5, 0).unwrap(), second.encode(5, 0).unwrap());
        assert_ne!(first.encode(5, 0).unwrap(), first.encode(5, 1).unwrap());
    }

    #[test]
    fn negative_numbers_are_rejected() {
        let s = slugifier("123", 8);

        for (instance_index, sequence) in [(123, -456), (-1, 0), (-5, -5), (i64::MIN, 0)] {
            let err = s.encode(instance_index, sequence).unwrap_err();
            assert!(matches!(err, SlugError::Encoding(_)), "{err:?}");
        }
    }

    #[test]
    fn round_trips_and_respects_min_length() {
        let s = slugifier("pepper", 30);

        for (instance_index, sequence) in [(0, 0), (5, 0), (5, 1), (6, 0), (1, i64::MAX), (i64::MAX, 42)] {
            let slug = s.encode(instance_index, sequence).unwrap();
            assert!(slug.as_str().len() >= 30, "{slug} is too short");
            assert!(slug.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
            assert_eq!(s.decode(slug.as_str()).unwrap(), (instance_index, sequence));
        }
    }

    #[test]
    fn non_canonical_code_fails_to_decode() {
        let s = slugifier("123", 8);

        // "123" reads as [0], whose canonical code is "4rlRNlnd".
        assert_eq!(raw_harsh("123", 8).encode(&[0]), "4rlRNlnd");
        let err = s.decode("123").unwrap_err();
        assert!(matches!(err, SlugError::Decode(_)), "{err:?}");
    }

    #[test]
    fn arbitrary_string_fails_to_decode() {
        let s = slugifier("123", 8);

        for input in ["", "not a slug at all", "2V87tRpL-"] {
            let err = s.decode(input).unwrap_err();
            assert!(matches!(err, SlugError::Decode(_)), "{input:?}: {err:?}");
        }
    }

    #[test]
    fn wrong_number_count_is_corrupted() {
        let s = slugifier("123", 8);
        let h = raw_harsh("123", 8);

        let three = h.encode(&[123, 456, 789]);
        assert_eq!(three, "ZNksB5uK9");
        assert!(matches!(
            s.decode(&three).unwrap_err(),
            SlugError::Corrupted { count: 3 }
        ));

        let one = h.encode(&[123]);
        assert!(matches!(
            s.decode(&one).unwrap_err(),
            SlugError::Corrupted { count: 1 }
        ));
    }

    #[test]
    fn numbers_above_signed_range_fail_to_decode() {
        let s = slugifier("123", 8);
        let slug = raw_harsh("123", 8).encode(&[u64::MAX, 0]);

        assert!(matches!(s.decode(&slug).unwrap_err(), SlugError::Decode(_)));
    }

    #[test]
    fn slugs_from_another_salt_are_rejected() {
        let ours = slugifier("ours", 30);
        let theirs = slugifier("theirs", 30);

        let slug = theirs.encode(5, 0).unwrap();
        assert!(ours.decode(slug.as_str()).is_err());
    }

    #[test]
    fn debug_output_hides_salt() {
        let printed = format!("{:?}", slugifier("pepper", 8));
        assert!(!printed.contains("pepper"));
    }
}
