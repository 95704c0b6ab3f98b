use crate::error::{AppError, GameError};
use crate::generator::PersonaGenerator;
use crate::persona::PersonaRegistry;
use crate::settings::{PersonaSource, Settings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use strum_macros::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    Survived,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landing {
    pub persona_index: usize,
    pub planet_name: String,
    pub outcome: Outcome,
}

// One round of the game: talk to the researchers, then pick a planet.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: Uuid,
    landing: Option<Landing>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            landing: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.landing.is_some()
    }

    pub fn landing(&self) -> Option<&Landing> {
        self.landing.as_ref()
    }

    /// Lands on the planet of the persona at `index`. Only the truthful
    /// researcher's planet is survivable. A session lands once.
    pub fn land(&mut self, registry: &PersonaRegistry, index: usize) -> Result<Outcome, GameError> {
        if self.landing.is_some() {
            return Err(GameError::AlreadyLanded);
        }

        let persona = registry.at(index);
        let outcome = if persona.is_truthful {
            Outcome::Survived
        } else {
            Outcome::Lost
        };
        log::info!(
            "Game {} landed on {} ({})",
            self.id,
            persona.planet_name,
            outcome
        );

        self.landing = Some(Landing {
            persona_index: index % registry.len(),
            planet_name: persona.planet_name.clone(),
            outcome,
        });
        Ok(outcome)
    }
}

/// The persona set for a new game, as configured. A fixed seed replays the
/// same generated set every game.
pub fn roster(settings: &Settings) -> Result<PersonaRegistry, AppError> {
    match settings.persona_source {
        PersonaSource::Classic => Ok(PersonaRegistry::classic()),
        PersonaSource::Generated => {
            let mut rng = match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let personas = PersonaGenerator::new(&mut rng).generate(settings.persona_count)?;
            Ok(PersonaRegistry::new(personas)?)
        }
    }
}
