use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::profile::Profile;

/// Compilation settings: which dialect to emit and how wide one level of
/// indentation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: Profile,
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            indent: 2,
        }
    }
}

impl Config {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    /// Parse settings from JSON; missing fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

impl From<Profile> for Config {
    fn from(profile: Profile) -> Self {
        Config::new(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = Config::from_json(r#"{ "profile": "2017-02-28" }"#).unwrap();
        assert_eq!(cfg.profile, Profile::V2017_02_28);
        assert_eq!(cfg.indent, 2);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = Config::from_json(r#"{ "profile": "2020-01-01" }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
