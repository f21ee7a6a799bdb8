use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Opaque reference handed back to the reporter for a submission.
/// Always `TrackingId::LEN` characters drawn from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    pub const LEN: usize = 9;

    /// Draw a fresh identifier from the operating system's CSPRNG
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let token = (0..Self::LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(s: &str) -> bool {
        s.len() == Self::LEN && s.bytes().all(|b| ALPHABET.contains(&b))
    }
}

impl FromStr for TrackingId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_well_formed(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("malformed tracking id: {:?}", s))
        }
    }
}

impl TryFrom<String> for TrackingId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(format!("malformed tracking id: {:?}", s))
        }
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_shape() {
        for _ in 0..100 {
            let id = TrackingId::generate();
            assert_eq!(id.as_str().len(), 9);
            assert!(id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<TrackingId> = (0..1000).map(|_| TrackingId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert!("ABC123XYZ".parse::<TrackingId>().is_ok());
        assert!("abc123xyz".parse::<TrackingId>().is_err());
        assert!("ABC123".parse::<TrackingId>().is_err());
        assert!("ABC-23XYZ".parse::<TrackingId>().is_err());
    }

    #[test]
    fn test_serde_is_plain_string() {
        let id: TrackingId = "K7Q2M9ZX4".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"K7Q2M9ZX4\"");

        let back: TrackingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<TrackingId>("\"nope\"").is_err());
    }
}
