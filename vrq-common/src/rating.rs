//! Four-point realism rating scale
//!
//! Each choice carries a fixed display label and a signed score.
//! There is deliberately no neutral midpoint: participants must lean
//! towards real (positive) or fake (negative).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four rating categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    CompletelyReal,
    MinorArtifacts,
    SomewhatPlausible,
    CompletelyFake,
}

impl Choice {
    /// All choices in display order
    pub const ALL: [Choice; 4] = [
        Choice::CompletelyReal,
        Choice::MinorArtifacts,
        Choice::SomewhatPlausible,
        Choice::CompletelyFake,
    ];

    /// Label shown to participants and written to result rows
    pub fn label(self) -> &'static str {
        match self {
            Choice::CompletelyReal => "Completely Real / Normal / Natural",
            Choice::MinorArtifacts => "Overall Real with Minor Artifacts",
            Choice::SomewhatPlausible => "Looks edited but somewhat plausible",
            Choice::CompletelyFake => "Completely Fake / Obviously Abnormal",
        }
    }

    pub fn score(self) -> i8 {
        match self {
            Choice::CompletelyReal => 2,
            Choice::MinorArtifacts => 1,
            Choice::SomewhatPlausible => -1,
            Choice::CompletelyFake => -2,
        }
    }

    /// Look up a choice by its label
    ///
    /// Whitespace around the `/` separators is not significant, so
    /// `"Completely Real/Normal/Natural"` matches as well.
    pub fn from_label(label: &str) -> Option<Choice> {
        let wanted = normalize(label);
        Choice::ALL
            .into_iter()
            .find(|c| normalize(c.label()) == wanted)
    }
}

fn normalize(label: &str) -> String {
    label
        .split('/')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label did not match any of the four choices
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown choice label: {0:?}")]
pub struct UnknownChoice(pub String);

impl FromStr for Choice {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Choice::from_label(s).ok_or_else(|| UnknownChoice(s.to_string()))
    }
}
