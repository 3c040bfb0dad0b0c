//! Crew roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four roles aboard. Each role unlocks its own upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Captain,
    #[serde(rename = "XO")]
    Xo,
    Engineer,
    Medic,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Captain, Role::Xo, Role::Engineer, Role::Medic];

    pub fn name(self) -> &'static str {
        match self {
            Role::Captain => "Captain",
            Role::Xo => "XO",
            Role::Engineer => "Engineer",
            Role::Medic => "Medic",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.name().parse::<Role>(), Ok(role));
        }
        assert!("Cook".parse::<Role>().is_err());
    }
}
