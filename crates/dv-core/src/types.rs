//! Variable roles and column identifiers.
//!
//! Generated tables carry an ordered list of [`ColumnId`]s instead of string
//! names. Display names (`W0`, `Z1`, `v0`, `y`, `X2`) are produced only when a
//! table is serialized or handed to a component that works with names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Causal role of a variable group.
///
/// The declaration order is the column order of generated tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    /// Modifies the treatment effect on the outcome (`X`).
    EffectModifier,
    /// Affects the treatment only (`Z`).
    Instrument,
    /// Affects both treatment and outcome (`W`).
    CommonCause,
    /// Treatment (`v`).
    Treatment,
    /// Outcome (`y`).
    Outcome,
}

impl VariableRole {
    /// All roles in column order.
    pub const ALL: [VariableRole; 5] = [
        VariableRole::EffectModifier,
        VariableRole::Instrument,
        VariableRole::CommonCause,
        VariableRole::Treatment,
        VariableRole::Outcome,
    ];

    /// Name prefix used at the serialization boundary.
    pub fn prefix(self) -> &'static str {
        match self {
            VariableRole::EffectModifier => "X",
            VariableRole::Instrument => "Z",
            VariableRole::CommonCause => "W",
            VariableRole::Treatment => "v",
            VariableRole::Outcome => "y",
        }
    }
}

/// A single column of a generated table: role plus position within the role's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId {
    /// Variable group.
    pub role: VariableRole,
    /// Index within the group.
    pub index: usize,
}

impl ColumnId {
    /// Construct a column id.
    pub const fn new(role: VariableRole, index: usize) -> Self {
        Self { role, index }
    }

    /// The (single) outcome column.
    pub const fn outcome() -> Self {
        Self { role: VariableRole::Outcome, index: 0 }
    }

    /// Display name, e.g. `W3`. The outcome is always `y`.
    pub fn name(&self) -> String {
        match self.role {
            VariableRole::Outcome => "y".to_string(),
            role => format!("{}{}", role.prefix(), self.index),
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ColumnId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "y" {
            return Ok(Self::outcome());
        }
        let mut chars = s.chars();
        let head = chars.next().ok_or_else(|| Error::Parse("empty column name".into()))?;
        let role = match head {
            'X' => VariableRole::EffectModifier,
            'Z' => VariableRole::Instrument,
            'W' => VariableRole::CommonCause,
            'v' => VariableRole::Treatment,
            _ => return Err(Error::Parse(format!("unknown column prefix in '{s}'"))),
        };
        let index = chars
            .as_str()
            .parse::<usize>()
            .map_err(|_| Error::Parse(format!("invalid column index in '{s}'")))?;
        Ok(Self { role, index })
    }
}

impl Serialize for ColumnId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for ColumnId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(ColumnId::new(VariableRole::CommonCause, 3).name(), "W3");
        assert_eq!(ColumnId::new(VariableRole::Instrument, 0).name(), "Z0");
        assert_eq!(ColumnId::new(VariableRole::Treatment, 1).name(), "v1");
        assert_eq!(ColumnId::new(VariableRole::EffectModifier, 2).name(), "X2");
        assert_eq!(ColumnId::outcome().name(), "y");
    }

    #[test]
    fn test_parse_round_trip() {
        for name in ["W0", "Z12", "v0", "X4", "y"] {
            let id: ColumnId = name.parse().unwrap();
            assert_eq!(id.name(), name);
        }
        assert!("Q1".parse::<ColumnId>().is_err());
        assert!("W".parse::<ColumnId>().is_err());
        assert!("".parse::<ColumnId>().is_err());
    }

    #[test]
    fn test_role_ordering_matches_column_order() {
        let mut roles = VariableRole::ALL.to_vec();
        roles.reverse();
        roles.sort();
        assert_eq!(roles, VariableRole::ALL.to_vec());
    }

    #[test]
    fn test_serde_as_string() {
        let id = ColumnId::new(VariableRole::CommonCause, 1);
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"W1\"");
        let back: ColumnId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }
}
