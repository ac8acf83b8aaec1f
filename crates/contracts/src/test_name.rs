//! TestName - the fixed set of walking tests every subject performed

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gait test protocol
///
/// Serialized as the snake_case names used in the dataset files (`"slow_10"`, `"long"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestName {
    #[serde(rename = "slow_10")]
    Slow10,
    #[serde(rename = "normal_10")]
    Normal10,
    #[serde(rename = "fast_10")]
    Fast10,
    #[serde(rename = "slow_20")]
    Slow20,
    #[serde(rename = "normal_20")]
    Normal20,
    #[serde(rename = "fast_20")]
    Fast20,
    #[serde(rename = "long")]
    Long,
}

/// Returned when a string is not one of the known test names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown test name '{0}'")]
pub struct UnknownTestName(pub String);

impl TestName {
    /// All tests in protocol order
    pub const ALL: [TestName; 7] = [
        TestName::Slow10,
        TestName::Normal10,
        TestName::Fast10,
        TestName::Slow20,
        TestName::Normal20,
        TestName::Fast20,
        TestName::Long,
    ];

    /// File-name form of the test
    pub fn as_str(self) -> &'static str {
        match self {
            TestName::Slow10 => "slow_10",
            TestName::Normal10 => "normal_10",
            TestName::Fast10 => "fast_10",
            TestName::Slow20 => "slow_20",
            TestName::Normal20 => "normal_20",
            TestName::Fast20 => "fast_20",
            TestName::Long => "long",
        }
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestName {
    type Err = UnknownTestName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTestName(s.to_string()))
    }
}
