// Persona catalog: the planetary researchers the player can reach over the radio.
use crate::error::RegistryError;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

// The four facts every researcher can be asked about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactTag {
    Temperature,
    Color,
    Ocean,
    Gravity,
}

impl FactTag {
    pub const ALL: [FactTag; 4] = [
        FactTag::Temperature,
        FactTag::Color,
        FactTag::Ocean,
        FactTag::Gravity,
    ];

    // Human label used inside prompts.
    pub fn label(&self) -> &'static str {
        match self {
            FactTag::Temperature => "average temperature",
            FactTag::Color => "planet color",
            FactTag::Ocean => "ocean coverage",
            FactTag::Gravity => "gravity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String, // Voice identifier handed to the speech synthesizer.
    pub display_name: String,
    pub description: String,
    pub planet_name: String,
    pub avg_temp: String,
    pub planet_color: String,
    pub ocean_coverage: String,
    pub gravity: String,
    #[serde(default)]
    pub is_truthful: bool,
    #[serde(default)]
    pub known_facts: Vec<FactTag>,
}

impl Persona {
    // The authoritative value of a fact, whether or not this persona tells it.
    pub fn fact(&self, tag: FactTag) -> &str {
        match tag {
            FactTag::Temperature => &self.avg_temp,
            FactTag::Color => &self.planet_color,
            FactTag::Ocean => &self.ocean_coverage,
            FactTag::Gravity => &self.gravity,
        }
    }

    pub fn knows(&self, tag: FactTag) -> bool {
        self.is_truthful || self.known_facts.contains(&tag)
    }

    /// Maps the free-form colour description to a swatch colour for the UI.
    /// The first matching family wins, so "Blue and green" renders as an
    /// earth-like blue rather than plain green.
    pub fn planet_hue(&self) -> Color {
        let lower = self.planet_color.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["orange", "amber", "burnt"]) {
            Color::Rgb(0xFF, 0x8C, 0x00)
        } else if lower.contains("blue") && lower.contains("green") {
            Color::Rgb(0x41, 0x69, 0xE1)
        } else if has(&["teal", "turquoise", "cyan"]) {
            Color::Rgb(0x20, 0xB2, 0xAA)
        } else if has(&["green", "emerald", "mint", "seafoam"]) {
            Color::Rgb(0x22, 0x8B, 0x22)
        } else if has(&["red", "crimson", "rust"]) {
            Color::Rgb(0xB7, 0x41, 0x0E)
        } else if has(&["blue", "cobalt", "steel"]) {
            Color::Rgb(0x46, 0x82, 0xB4)
        } else if has(&["purple", "violet", "indigo"]) {
            Color::Rgb(0x4B, 0x00, 0x82)
        } else if has(&["lavender", "pink"]) {
            Color::Rgb(0xE6, 0xE6, 0xFA)
        } else if has(&["yellow", "gold"]) {
            Color::Rgb(0xFF, 0xD7, 0x00)
        } else if has(&["gray", "grey", "charcoal"]) {
            Color::Rgb(0x69, 0x69, 0x69)
        } else {
            Color::Rgb(0x88, 0x88, 0x88)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

// Fixed, ordered, non-empty set of personas for one game.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    pub fn new(personas: Vec<Persona>) -> Result<Self, RegistryError> {
        if personas.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self { personas })
    }

    /// The hand-written ten-voice catalog. Voice 6 is the genuine researcher.
    pub fn classic() -> Self {
        Self {
            personas: classic_catalog(),
        }
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    // Never true: construction rejects empty catalogs.
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Persona> {
        self.personas.get(index)
    }

    // Wraps out-of-range indices, so it always yields a persona.
    pub fn at(&self, index: usize) -> &Persona {
        &self.personas[index % self.personas.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.personas.len()
    }

    pub fn previous_index(&self, index: usize) -> usize {
        if index == 0 || index >= self.personas.len() {
            self.personas.len() - 1
        } else {
            index - 1
        }
    }

    pub fn step(&self, index: usize, direction: Direction) -> usize {
        match direction {
            Direction::Next => self.next_index(index),
            Direction::Previous => self.previous_index(index),
        }
    }

    pub fn truthful_index(&self) -> Option<usize> {
        self.personas.iter().position(|p| p.is_truthful)
    }
}

#[allow(clippy::too_many_arguments)]
fn researcher(
    id: &str,
    number: usize,
    planet_name: &str,
    avg_temp: &str,
    planet_color: &str,
    ocean_coverage: &str,
    gravity: &str,
    known_facts: &[FactTag],
) -> Persona {
    Persona {
        id: id.to_string(),
        display_name: format!("Voice {number}"),
        description: "Planetary Researcher".to_string(),
        planet_name: planet_name.to_string(),
        avg_temp: avg_temp.to_string(),
        planet_color: planet_color.to_string(),
        ocean_coverage: ocean_coverage.to_string(),
        gravity: gravity.to_string(),
        is_truthful: false,
        known_facts: known_facts.to_vec(),
    }
}

#[rustfmt::skip]
fn classic_catalog() -> Vec<Persona> {
    use FactTag::*;

    let mut earth = researcher(
        "fable",
        6,
        "Earth Research Station",
        "59°F",
        "Blue and green with white clouds",
        "71%",
        "1.00g",
        &[],
    );
    earth.is_truthful = true;

    vec![
        researcher("onyx", 1, "Erythos Prime", "79°F", "Deep orange with red streaks", "41%", "0.92g", &[Temperature, Color]),
        researcher("nova", 2, "Velkara", "57°F", "Bluish green", "78%", "1.08g", &[Ocean, Gravity]),
        researcher("echo", 3, "Thryon-7", "27°F", "Pale icy teal", "22%", "0.74g", &[Temperature, Gravity]),
        researcher("shimmer", 4, "Kalmora", "91°F", "Jungle green with gold clouds", "42%", "1.03g", &[Color, Ocean]),
        researcher("alloy", 5, "Zenthara", "117°F", "Rust red", "8%", "0.88g", &[Temperature, Ocean]),
        earth,
        researcher("ash", 7, "Soluneth", "0°F", "Indigo with shimmering frost bands", "29%", "0.61g", &[Color, Gravity]),
        researcher("coral", 8, "Pravax Delta", "84°F", "Bright emerald", "61%", "1.11g", &[Temperature, Color]),
        researcher("sage", 9, "Iscalon Ridge", "72°F", "Steel blue with white ridges", "51%", "0.97g", &[Ocean, Gravity]),
        researcher("ballad", 10, "Typhara IX", "48°F", "Soft lavender", "84%", "0.79g", &[Temperature, Gravity]),
    ]
}
