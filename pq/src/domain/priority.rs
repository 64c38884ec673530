//! Caller-assigned priority for queued requests

use serde::{Deserialize, Serialize};

/// Priority assigned when the caller omits one
pub const DEFAULT_PRIORITY: i64 = 1;

/// Priority of a queued request; higher values are dispatched first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i64);

impl Priority {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY)
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| format!("Invalid priority: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::new(-1) < Priority::default());
        assert!(Priority::default() < Priority::new(5));
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(Priority::default().value(), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("7".parse::<Priority>().unwrap(), Priority::new(7));
        assert_eq!(" -3 ".parse::<Priority>().unwrap(), Priority::new(-3));
        assert!("high".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_serde() {
        let json = serde_json::to_string(&Priority::new(4)).unwrap();
        assert_eq!(json, "4");

        let priority: Priority = serde_json::from_str("10").unwrap();
        assert_eq!(priority, Priority::new(10));
    }
}
