//! Campus destination directory.
//!
//! A navigation session only ever holds a read-only [`Destination`]; where it
//! comes from is the job of a [`DestinationDirectory`]. The bundled
//! [`StaticDirectory`] serves the fixed campus list used by the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of place a destination is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Class,
    Lab,
    Office,
    Cafe,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Class => "class",
            Category::Lab => "lab",
            Category::Office => "office",
            Category::Cafe => "cafe",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "class" | "classes" => Ok(Category::Class),
            "lab" | "labs" => Ok(Category::Lab),
            "office" | "offices" => Ok(Category::Office),
            "cafe" => Ok(Category::Cafe),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// A place on campus that can be navigated to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub building: String,
    pub floor: String,
    pub category: Category,
}

impl Destination {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        building: impl Into<String>,
        floor: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            building: building.into(),
            floor: floor.into(),
            category,
        }
    }

    /// "Lab 4-B, East Building (L4)"
    pub fn summary(&self) -> String {
        format!("{}, {} ({})", self.name, self.building, self.floor)
    }
}

/// Supplies destinations to the hosting application.
pub trait DestinationDirectory: Send + Sync {
    /// Look up a destination by its id.
    fn find(&self, id: &str) -> Option<Destination>;

    /// Case-insensitive match on name or building, optionally restricted to
    /// one category. `None` means every category.
    fn search(&self, query: &str, category: Option<Category>) -> Vec<Destination>;
}

/// In-memory directory over a fixed list.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    places: Vec<Destination>,
}

impl StaticDirectory {
    pub fn new(places: Vec<Destination>) -> Self {
        Self { places }
    }

    /// The built-in campus list.
    pub fn campus() -> Self {
        Self::new(vec![
            Destination::new("1", "Library Level 2", "South Building", "L2", Category::Other),
            Destination::new("2", "Cafeteria A", "Main Building", "G", Category::Cafe),
            Destination::new("3", "Lab 4-B", "East Building", "L4", Category::Lab),
            Destination::new("4", "UW-3-3", "University Building", "L2", Category::Class),
            Destination::new("5", "Hall 2", "North Building", "G", Category::Other),
            Destination::new("6", "JC Hall 1", "University Building", "L1", Category::Other),
            Destination::new("7", "Lecture Theatre 3", "Main Building", "L3", Category::Class),
            Destination::new("8", "Student Services", "Admin Building", "G", Category::Office),
            Destination::new("9", "Computer Lab 1", "Tech Building", "L2", Category::Lab),
            Destination::new("10", "Starbucks", "Main Building", "G", Category::Cafe),
        ])
    }

    pub fn all(&self) -> &[Destination] {
        &self.places
    }
}

impl DestinationDirectory for StaticDirectory {
    fn find(&self, id: &str) -> Option<Destination> {
        self.places.iter().find(|p| p.id == id).cloned()
    }

    fn search(&self, query: &str, category: Option<Category>) -> Vec<Destination> {
        let needle = query.trim().to_lowercase();
        self.places
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.building.to_lowercase().contains(&needle)
            })
            .filter(|p| category.map_or(true, |c| p.category == c))
            .cloned()
            .collect()
    }
}
