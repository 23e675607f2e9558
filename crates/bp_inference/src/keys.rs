use std::fmt;

/// Ordered API keys. The first key is always preferred.
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: Vec<String>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("keys", &vec!["<redacted>"; self.keys.len()])
            .finish()
    }
}

impl KeyRing {
    /// Build a ring from optional values, skipping unset and blank ones.
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            keys: keys
                .into_iter()
                .flatten()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }
}

/// Picks the key for each attempt of a single call.
///
/// Implementations must be pure functions of their arguments: the client
/// keeps no rotation state between calls.
pub trait RotationPolicy: Send + Sync + fmt::Debug {
    fn key_for_attempt(&self, attempt: usize, key_count: usize) -> Option<usize>;
}

/// Try each key once, in configured order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl RotationPolicy for Sequential {
    fn key_for_attempt(&self, attempt: usize, key_count: usize) -> Option<usize> {
        (attempt < key_count).then_some(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ring_skips_blank_values() {
        let ring = KeyRing::new([Some("a".to_string()), None, Some("  ".to_string()), Some(" b ".into())]);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.get(1), Some("b"));
        assert!(!format!("{:?}", ring).contains('a'));
    }

    #[test]
    fn test_sequential_policy_is_stateless() {
        let policy = Sequential;
        assert_eq!(policy.key_for_attempt(0, 2), Some(0));
        assert_eq!(policy.key_for_attempt(1, 2), Some(1));
        assert_eq!(policy.key_for_attempt(2, 2), None);
        assert_eq!(policy.key_for_attempt(0, 2), Some(0));
        assert_eq!(policy.key_for_attempt(0, 0), None);
    }
}
