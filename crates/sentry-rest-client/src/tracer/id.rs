//! Trace and span identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::TraceHeaderError;

/// 128-bit trace identifier, rendered as 32 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({self})")
    }
}

impl FromStr for TraceId {
    type Err = TraceHeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TraceHeaderError::TraceId(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| TraceHeaderError::TraceId(s.to_string()))
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 64-bit span identifier, rendered as 16 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    #[must_use]
    pub fn random() -> Self {
        // an all-zero id is treated as absent by receivers
        loop {
            let (high, _) = Uuid::new_v4().as_u64_pair();
            if high != 0 {
                return Self(high);
            }
        }
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({self})")
    }
}

impl FromStr for SpanId {
    type Err = TraceHeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TraceHeaderError::SpanId(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| TraceHeaderError::SpanId(s.to_string()))
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_renders_as_32_hex_chars() {
        let id = TraceId::random();
        let rendered = id.to_string();

        assert_eq!(rendered.len(), 32);
        assert!(rendered.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(rendered.parse::<TraceId>().unwrap(), id);
    }

    #[test]
    fn test_span_id_keeps_leading_zeros() {
        let id: SpanId = "000000000000abcd".parse().unwrap();
        assert_eq!(id.to_string(), "000000000000abcd");
    }

    #[test]
    fn test_ids_reject_wrong_length_or_non_hex() {
        assert!("abc".parse::<TraceId>().is_err());
        assert!("771a43a4-192a-42b1-9ea0-3b5c7f9a2c19".parse::<TraceId>().is_err());
        assert!("zz1a43a4192a42b19ea03b5c7f9a2c19".parse::<TraceId>().is_err());
        assert!("+00000000000abcd".parse::<SpanId>().is_err());
        assert!("0000000000000abcd".parse::<SpanId>().is_err());
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(TraceId::random(), TraceId::random());
        assert_ne!(SpanId::random(), SpanId::random());
    }
}
