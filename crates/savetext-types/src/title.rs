use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game title whose save texts are collected.
///
/// Every title owns an isolated store named after [`Title::db_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Title {
    BulletTimeAgent,
    IdleCube,
    IdleDefense,
    IdleHome,
    MagicalCursedLand,
    Rhapsody,
    TerrorsOfNowhere,
}

impl Title {
    pub const ALL: [Title; 7] = [
        Title::BulletTimeAgent,
        Title::IdleCube,
        Title::IdleDefense,
        Title::IdleHome,
        Title::MagicalCursedLand,
        Title::Rhapsody,
        Title::TerrorsOfNowhere,
    ];

    /// Store name; the artifact on disk is `<db_name>.db`.
    pub fn db_name(&self) -> &'static str {
        match self {
            Title::BulletTimeAgent => "BulletTimeAgent",
            Title::IdleCube => "IdleCube",
            Title::IdleDefense => "IdleDefense",
            Title::IdleHome => "IdleHome",
            Title::MagicalCursedLand => "MagicalCursedLand",
            Title::Rhapsody => "Rhapsody",
            Title::TerrorsOfNowhere => "TerrorsOfNowhere",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Title::BulletTimeAgent => "Bullet Time Agent",
            Title::IdleCube => "Idle Cube",
            Title::IdleDefense => "Idle Defense",
            Title::IdleHome => "Idle Home",
            Title::MagicalCursedLand => "Magical Cursed Land",
            Title::Rhapsody => "Rhapsody ep.1 - Grave",
            Title::TerrorsOfNowhere => "Terrors of Nowhere",
        }
    }

    pub fn db_file_name(&self) -> String {
        format!("{}.db", self.db_name())
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.db_name())
    }
}

impl FromStr for Title {
    type Err = Error;

    /// Accepts the store name in any case, with or without `-`/`_` separators
    /// (`IdleCube`, `idle-cube`, `idle_cube`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        Title::ALL
            .into_iter()
            .find(|title| title.db_name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownTitle(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_separators_and_case() {
        assert_eq!("IdleCube".parse::<Title>().unwrap(), Title::IdleCube);
        assert_eq!("idle-cube".parse::<Title>().unwrap(), Title::IdleCube);
        assert_eq!(
            "terrors_of_nowhere".parse::<Title>().unwrap(),
            Title::TerrorsOfNowhere
        );
    }

    #[test]
    fn test_parse_unknown_title() {
        let err = "Tetris".parse::<Title>().unwrap_err();
        assert!(err.to_string().contains("Tetris"));
    }

    #[test]
    fn test_db_names_are_unique() {
        let mut names: Vec<_> = Title::ALL.iter().map(|t| t.db_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Title::ALL.len());
    }

    #[test]
    fn test_serde_uses_db_name() {
        let json = serde_json::to_string(&Title::MagicalCursedLand).unwrap();
        assert_eq!(json, "\"MagicalCursedLand\"");
        assert_eq!(Title::Rhapsody.db_file_name(), "Rhapsody.db");
    }
}
