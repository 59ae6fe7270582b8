use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::common::DEFAULT_ID_LENGTH;

/// Produces identifiers for documents inserted without an `_id`.
///
/// Implementations only need to return non-empty strings; the datastore
/// retries when a generated identifier is already taken.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Generates short random alphanumeric identifiers.
#[derive(Debug, Clone, Copy)]
pub struct RandomIdGenerator {
    length: usize,
}

impl RandomIdGenerator {
    pub fn new(length: usize) -> Self {
        RandomIdGenerator {
            length: length.max(1),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        RandomIdGenerator::new(DEFAULT_ID_LENGTH)
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_length() {
        let id = RandomIdGenerator::default().generate();
        assert_eq!(id.len(), DEFAULT_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_zero_length_is_clamped() {
        assert_eq!(RandomIdGenerator::new(0).generate().len(), 1);
    }

    #[test]
    fn test_ids_are_unlikely_to_repeat() {
        let generator = RandomIdGenerator::default();
        let ids: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
