//! Standing: the coarse qualitative label attached to a summarized series.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Risky,
    Improving,
    Declining,
    Stable,
}

impl Standing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Standing::Risky => "risky",
            Standing::Improving => "improving",
            Standing::Declining => "declining",
            Standing::Stable => "stable",
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
