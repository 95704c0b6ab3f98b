// Procedural persona sets: one genuine researcher hidden among impostors.
use crate::error::GeneratorError;
use crate::persona::{FactTag, Persona};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom, index};
use std::collections::HashSet;

pub const DEFAULT_COUNT: usize = 10;
pub const MAX_NAME_ATTEMPTS: usize = 1000;

const PREFIXES: &[&str] = &[
    "Ery", "Vel", "Thry", "Kal", "Zen", "Sol", "Pra", "Isc", "Typh", "Nex", "Vor", "Kry", "Lum",
    "Ast", "Orb",
];
const MIDDLES: &[&str] = &[
    "thos", "kara", "on", "mora", "thara", "uneth", "vax", "alon", "ara", "ion", "ath", "oss",
    "ina", "rex",
];
const SUFFIXES: &[&str] = &[
    "Prime", "7", "Delta", "Ridge", "IX", "Station", "Alpha", "Beta", "Minor", "Major",
];

pub const COLOR_DESCRIPTORS: &[&str] = &[
    "Deep orange with red streaks",
    "Bluish green",
    "Pale icy teal",
    "Jungle green with gold clouds",
    "Rust red",
    "Steel blue with white ridges",
    "Bright emerald",
    "Soft lavender",
    "Indigo with shimmering frost bands",
    "Crimson with dark patches",
    "Golden yellow with brown swirls",
    "Deep purple with silver highlights",
    "Turquoise with white clouds",
    "Burnt orange with black streaks",
    "Mint green with cyan bands",
    "Rose pink with violet tints",
    "Charcoal gray with red veins",
    "Cobalt blue with ice caps",
    "Amber with bronze clouds",
    "Seafoam green with blue oceans",
];

// Speech voices handed out to the generated researchers.
pub const VOICE_POOL: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "fable", "onyx", "nova", "sage", "shimmer",
];

// Earth-like stats reserved for the genuine researcher.
const EARTH_TEMP: &str = "59°F";
const EARTH_COLOR: &str = "Blue and green with white clouds";
const EARTH_OCEAN: &str = "71%";
const EARTH_GRAVITY: &str = "1.00g";

pub struct PersonaGenerator<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
    voice_pool: &'a [&'a str],
}

impl<'a, R: Rng + ?Sized> PersonaGenerator<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self {
            rng,
            voice_pool: VOICE_POOL,
        }
    }

    pub fn with_voice_pool(mut self, voice_pool: &'a [&'a str]) -> Self {
        self.voice_pool = voice_pool;
        self
    }

    pub fn generate(&mut self, count: usize) -> Result<Vec<Persona>, GeneratorError> {
        if count == 0 {
            return Err(GeneratorError::EmptySet);
        }

        let mut voices: Vec<&str> = self.voice_pool.to_vec();
        voices.shuffle(&mut *self.rng);
        let researcher_index = self.rng.random_range(0..count);
        let mut used_names = HashSet::with_capacity(count);
        let mut personas = Vec::with_capacity(count);

        for i in 0..count {
            let planet_name = self.unique_planet_name(&mut used_names)?;
            let id = if voices.is_empty() {
                String::new()
            } else {
                voices[i % voices.len()].to_string()
            };

            let persona = if i == researcher_index {
                Persona {
                    id,
                    display_name: format!("Voice {}", i + 1),
                    description: "Planetary Researcher".to_string(),
                    planet_name: format!("{planet_name} Research Station"),
                    avg_temp: EARTH_TEMP.to_string(),
                    planet_color: EARTH_COLOR.to_string(),
                    ocean_coverage: EARTH_OCEAN.to_string(),
                    gravity: EARTH_GRAVITY.to_string(),
                    is_truthful: true,
                    known_facts: Vec::new(),
                }
            } else {
                Persona {
                    id,
                    display_name: format!("Voice {}", i + 1),
                    description: "Planetary Researcher".to_string(),
                    planet_name,
                    avg_temp: self.temperature(),
                    planet_color: self.color(),
                    ocean_coverage: self.ocean_coverage(),
                    gravity: self.gravity(),
                    is_truthful: false,
                    known_facts: self.known_facts(),
                }
            };
            personas.push(persona);
        }

        log::debug!(
            "Generated {} personas, researcher at index {}",
            count,
            researcher_index
        );
        Ok(personas)
    }

    fn unique_planet_name(
        &mut self,
        used_names: &mut HashSet<String>,
    ) -> Result<String, GeneratorError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.planet_name();
            if used_names.insert(name.clone()) {
                return Ok(name);
            }
        }
        Err(GeneratorError::NameSpaceExhausted(MAX_NAME_ATTEMPTS))
    }

    pub fn planet_name(&mut self) -> String {
        let prefix = pick(&mut *self.rng, PREFIXES);
        let middle = pick(&mut *self.rng, MIDDLES);
        if self.rng.random_bool(0.5) {
            let suffix = pick(&mut *self.rng, SUFFIXES);
            format!("{prefix}{middle} {suffix}")
        } else {
            format!("{prefix}{middle}")
        }
    }

    fn temperature(&mut self) -> String {
        format!("{}°F", self.rng.random_range(0..=120))
    }

    fn ocean_coverage(&mut self) -> String {
        format!("{}%", self.rng.random_range(0..=95))
    }

    // Hundredths keep the two-decimal format exact.
    fn gravity(&mut self) -> String {
        let hundredths: u32 = self.rng.random_range(50..=150);
        format!("{}.{:02}g", hundredths / 100, hundredths % 100)
    }

    fn color(&mut self) -> String {
        pick(&mut *self.rng, COLOR_DESCRIPTORS).to_string()
    }

    fn known_facts(&mut self) -> Vec<FactTag> {
        let mut picked: Vec<FactTag> = index::sample(&mut *self.rng, FactTag::ALL.len(), 2)
            .into_iter()
            .map(|i| FactTag::ALL[i])
            .collect();
        picked.sort();
        picked
    }
}

fn pick<'s, R: Rng + ?Sized>(rng: &mut R, items: &'s [&'s str]) -> &'s str {
    items.choose(rng).copied().unwrap_or_default()
}
