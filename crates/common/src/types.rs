//! Identity types carried through the Gatehouse platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated principal: the subject id and display name embedded in every
/// access and refresh token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable numeric account identifier.
    pub subject_id: SubjectId,
    /// Display name at issuance time.
    pub subject_name: String,
}

impl Identity {
    /// Create an identity from its parts.
    #[must_use]
    pub fn new(subject_id: SubjectId, subject_name: impl Into<String>) -> Self {
        Self {
            subject_id,
            subject_name: subject_name.into(),
        }
    }
}

// Subject names are user PII and must not reach logs via Debug formatting.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("subject_id", &self.subject_id)
            .field("subject_name", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id_display_is_bare_number() {
        assert_eq!(SubjectId(42).to_string(), "42");
    }

    #[test]
    fn test_identity_debug_redacts_subject_name() {
        let identity = Identity::new(SubjectId(7), "alice");
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("alice"));
        assert!(rendered.contains('7'));
    }

    #[test]
    fn test_identity_serde_round_trip() {
        let identity = Identity::new(SubjectId(9001), "bob");
        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, identity);
    }
}
