//! Hero roster entities
//!
//! The roster is a human-edited JSON document (`heroes.json`) shared with the
//! game. Field names on the wire follow that document; fields this pipeline
//! does not know about are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_objects::HeroSlug;

/// One playable hero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    #[serde(rename = "superhero_name")]
    pub name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub powers: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub trivia: String,
    #[serde(rename = "animal_theme", default)]
    pub theme: String,
    #[serde(rename = "hero_inspiration", default)]
    pub inspiration: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HeroRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            real_name: String::new(),
            powers: String::new(),
            origin: String::new(),
            trivia: String::new(),
            theme: String::new(),
            inspiration: String::new(),
            difficulty: String::new(),
            image_path: None,
            extra: Map::new(),
        }
    }

    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = real_name.into();
        self
    }

    pub fn with_powers(mut self, powers: impl Into<String>) -> Self {
        self.powers = powers.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_inspiration(mut self, inspiration: impl Into<String>) -> Self {
        self.inspiration = inspiration.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = difficulty.into();
        self
    }

    pub fn slug(&self) -> HeroSlug {
        HeroSlug::from_name(&self.name)
    }
}

/// The whole roster document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub heroes: Vec<HeroRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Roster {
    /// Name is the natural key within this pipeline
    pub fn find_mut(&mut self, name: &str) -> Option<&mut HeroRecord> {
        self.heroes.iter_mut().find(|hero| hero.name == name)
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_round_trips_unknown_fields() {
        let json = r#"{
            "version": 3,
            "heroes": [{
                "id": 7,
                "superhero_name": "Captain Bulldog",
                "real_name": "Brian Brad-dog",
                "powers": "Tea summoning",
                "origin": "Essex",
                "trivia": "Loves squeaky toys",
                "animal_theme": "Dog",
                "hero_inspiration": "Captain Britain",
                "difficulty": "Medium"
            }]
        }"#;

        let roster: Roster = serde_json::from_str(json).expect("roster should parse");
        assert_eq!(roster.len(), 1);
        let hero = &roster.heroes[0];
        assert_eq!(hero.name, "Captain Bulldog");
        assert_eq!(hero.theme, "Dog");
        assert!(hero.image_path.is_none());

        let out = serde_json::to_value(&roster).expect("roster should serialize");
        assert_eq!(out["version"], 3);
        assert_eq!(out["heroes"][0]["id"], 7);
        assert!(out["heroes"][0].get("imagePath").is_none());
    }

    #[test]
    fn test_missing_narrative_fields_default_to_empty() {
        let hero: HeroRecord =
            serde_json::from_str(r#"{"superhero_name": "Frogman"}"#).expect("hero should parse");
        assert_eq!(hero.powers, "");
        assert_eq!(hero.slug().as_str(), "frogman");
    }

    #[test]
    fn test_find_mut_by_name() {
        let mut roster = Roster {
            heroes: vec![HeroRecord::new("Frogman"), HeroRecord::new("Batcat")],
            ..Roster::default()
        };
        roster
            .find_mut("Batcat")
            .expect("hero exists")
            .image_path = Some("./images/batcat.png".to_string());
        assert_eq!(roster.heroes[1].image_path.as_deref(), Some("./images/batcat.png"));
        assert!(roster.find_mut("Nobody").is_none());
    }
}
