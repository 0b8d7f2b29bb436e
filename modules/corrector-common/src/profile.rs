use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dictionary::ErrorDictionary;
use crate::error::CorrectorError;

/// Which correction bot this process runs. Selected once at startup; each
/// profile owns its own dictionary, credentials, quota and state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotProfile {
    Grammar,
    English,
}

impl BotProfile {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::English => "english",
        }
    }

    /// Suffix used for per-profile environment overrides, e.g. `DAILY_LIMIT_GRAMMAR`.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Self::Grammar => "GRAMMAR",
            Self::English => "ENGLISH",
        }
    }

    pub fn dictionary(&self) -> ErrorDictionary {
        match self {
            Self::Grammar => ErrorDictionary::grammar(),
            Self::English => ErrorDictionary::english(),
        }
    }
}

impl fmt::Display for BotProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for BotProfile {
    type Err = CorrectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grammar" => Ok(Self::Grammar),
            "english" => Ok(Self::English),
            other => Err(CorrectorError::UnknownProfile(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_names_case_insensitively() {
        assert_eq!("grammar".parse::<BotProfile>().unwrap(), BotProfile::Grammar);
        assert_eq!(" English ".parse::<BotProfile>().unwrap(), BotProfile::English);
        assert!("spelling".parse::<BotProfile>().is_err());
    }

    #[test]
    fn display_matches_slug() {
        assert_eq!(BotProfile::English.to_string(), "english");
        assert_eq!(BotProfile::Grammar.env_suffix(), "GRAMMAR");
    }
}
