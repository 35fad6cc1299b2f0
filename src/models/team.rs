//! Team and Venue data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in pairings, matches and standings).
pub type TeamId = Uuid;

/// Unique identifier for a venue.
pub type VenueId = Uuid;

/// A team in the league. Identity is immutable for scheduling purposes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Abbreviation shown in fixture lists.
    #[serde(default)]
    pub short_name: Option<String>,
    /// Display colour (e.g. "#1d4ed8").
    #[serde(default)]
    pub color: Option<String>,
}

impl Team {
    /// Create a new team with the given name and a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            short_name: None,
            color: None,
        }
    }

    /// Name used in exports: short name when set, else full name.
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

/// A venue (court / pitch) that can host one match per slot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
}

impl Venue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
