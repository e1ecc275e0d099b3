//! Dialect profiles.
//!
//! The two profiles accept the same constructs but differ in a handful of
//! observable ways: how directives are spelled, whether literal map entries
//! are comma separated, how typed values are encoded for the storage
//! backend, and whether operator results may be passed as method arguments.

use serde::{Deserialize, Serialize};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "2017-02-28")]
    V2017_02_28,
    #[default]
    #[serde(rename = "2018-05-29")]
    V2018_05_29,
}

/// How a typed value is wrapped before it is handed to the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `$util.dynamodb.toDynamoDBJson(x)`
    DynamoDbJson,
    /// `$util.toJson($util.dynamodb.toDynamoDB(x))`
    JsonOfDynamoDb,
}

impl Profile {
    /// Version string written into request envelopes.
    pub fn version(self) -> &'static str {
        match self {
            Profile::V2017_02_28 => "2017-02-28",
            Profile::V2018_05_29 => "2018-05-29",
        }
    }

    /// Spells a directive, e.g. `#{if}` or `#if`.
    pub fn directive(self, name: &str) -> String {
        match self {
            Profile::V2017_02_28 => format!("#{{{name}}}"),
            Profile::V2018_05_29 => format!("#{name}"),
        }
    }

    /// Separator written between two entries of a literal map.
    pub fn map_separator(self) -> &'static str {
        match self {
            Profile::V2017_02_28 => "\n",
            Profile::V2018_05_29 => ",\n",
        }
    }

    pub fn encoding(self) -> Encoding {
        match self {
            Profile::V2017_02_28 => Encoding::DynamoDbJson,
            Profile::V2018_05_29 => Encoding::JsonOfDynamoDb,
        }
    }

    /// The older grammar only accepts references as method arguments.
    pub fn references_only_in_arguments(self) -> bool {
        matches!(self, Profile::V2017_02_28)
    }
}
