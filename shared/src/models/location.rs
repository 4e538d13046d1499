//! Physical storage locations

use serde::{Deserialize, Serialize};

/// Buildings where supplies are stored
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Building {
    /// Administrative building
    #[default]
    #[serde(rename = "ADM", alias = "adm")]
    Adm,
    /// IT building
    #[serde(rename = "TI", alias = "ti")]
    Ti,
}

impl Building {
    pub fn code(&self) -> &'static str {
        match self {
            Building::Adm => "ADM",
            Building::Ti => "TI",
        }
    }
}

impl std::fmt::Display for Building {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A storage slot: building, shelf (anaquel) and level (nivel)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub building: Building,
    pub shelf: String,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Location {
    pub fn new(building: Building, shelf: impl Into<String>, level: u32) -> Self {
        Self {
            building,
            shelf: shelf.into(),
            level,
            notes: None,
        }
    }

    /// Shelf and notes are stored trimmed and upper-case; blank notes are dropped.
    pub fn normalized(mut self) -> Self {
        self.shelf = self.shelf.trim().to_uppercase();
        self.notes = self
            .notes
            .map(|n| n.trim().to_uppercase())
            .filter(|n| !n.is_empty());
        self
    }

    /// True when building, shelf or level differ. Notes do not identify a slot.
    pub fn slot_differs(&self, other: &Location) -> bool {
        self.building != other.building || self.shelf != other.shelf || self.level != other.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_uppercases_shelf_and_notes() {
        let location = Location {
            building: Building::Ti,
            shelf: " b3 ".to_string(),
            level: 2,
            notes: Some("  junto a la ventana ".to_string()),
        }
        .normalized();

        assert_eq!(location.shelf, "B3");
        assert_eq!(location.notes.as_deref(), Some("JUNTO A LA VENTANA"));
    }

    #[test]
    fn test_blank_notes_dropped() {
        let location = Location {
            building: Building::Adm,
            shelf: "A".to_string(),
            level: 1,
            notes: Some("   ".to_string()),
        }
        .normalized();

        assert_eq!(location.notes, None);
    }

    #[test]
    fn test_slot_differs_ignores_notes() {
        let a = Location::new(Building::Adm, "A", 1);
        let mut b = a.clone();
        b.notes = Some("OTRA".to_string());
        assert!(!a.slot_differs(&b));

        b.level = 2;
        assert!(a.slot_differs(&b));
    }

    #[test]
    fn test_building_deserializes_lowercase_alias() {
        let building: Building = serde_json::from_str("\"ti\"").unwrap();
        assert_eq!(building, Building::Ti);
        assert_eq!(serde_json::to_string(&Building::Adm).unwrap(), "\"ADM\"");
    }
}
