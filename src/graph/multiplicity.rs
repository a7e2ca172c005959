// Multiplicity formatting

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound value meaning "unbounded"
pub const UNBOUNDED: i64 = -1;

/// Lower and upper bound of a structural feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplicity {
    pub lower: i64,
    pub upper: i64,
}

impl Multiplicity {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Compact form used on attribute lines: `""` for 1..1, `"3"` for 3..3,
    /// otherwise `"0..*"` style ranges
    pub fn bounds(&self) -> String {
        match (self.lower, self.upper) {
            (1, 1) => String::new(),
            (l, u) if l == u => l.to_string(),
            _ => self.range(),
        }
    }

    /// Explicit range used on edge labels, always `"<lower>..<upper>"`
    pub fn range(&self) -> String {
        format!("{}..{}", self.lower, upper_text(self.upper))
    }
}

fn upper_text(upper: i64) -> String {
    if upper == UNBOUNDED {
        "*".to_string()
    } else {
        upper.to_string()
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range())
    }
}
