//! Sharing role vocabulary.

use std::str::FromStr;

use super::RoleId;

/// Name of a sharing role. Small closed vocabulary, not user-defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleName {
    Owner,
    Editor,
    Viewer,
}

/// Error type for parsing RoleName from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for RoleName {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(RoleName::Owner),
            "editor" => Ok(RoleName::Editor),
            "viewer" => Ok(RoleName::Viewer),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Owner => "owner",
            RoleName::Editor => "editor",
            RoleName::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrip() {
        for role in [RoleName::Owner, RoleName::Editor, RoleName::Viewer] {
            let parsed: RoleName = role.as_str().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn role_parse_invalid() {
        assert!("invalid".parse::<RoleName>().is_err());
        assert!("Owner".parse::<RoleName>().is_err()); // Case sensitive
        assert!("".parse::<RoleName>().is_err());
    }
}
