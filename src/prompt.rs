//! Behavior specifications for the researcher personas.
//!
//! Which facts a persona tells truthfully and which it fabricates is decided
//! here, from `Persona::is_truthful` and `Persona::known_facts` alone. The
//! builder holds no random state, so a persona always yields the same text.

use crate::persona::{FactTag, Persona};
use std::fmt::Write;

pub const NO_DATA_REPLY: &str = "I don't have that data.";
pub const TRUTHFUL_WORD_CAP: usize = 20;
pub const IMPOSTOR_WORD_CAP: usize = 25;

// Facts a persona states correctly versus the ones it must make up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FactPartition {
    pub stated: Vec<FactTag>,
    pub fabricated: Vec<FactTag>,
}

impl FactPartition {
    pub fn of(persona: &Persona) -> Self {
        let (stated, fabricated) = FactTag::ALL
            .into_iter()
            .partition(|tag| persona.knows(*tag));
        FactPartition { stated, fabricated }
    }

    pub fn is_fabricated(&self, tag: FactTag) -> bool {
        self.fabricated.contains(&tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorSpec {
    instructions: String,
    partition: FactPartition,
}

impl BehaviorSpec {
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn partition(&self) -> &FactPartition {
        &self.partition
    }

    // Full prompt with the closing user turn marker.
    pub fn prompt_for(&self, user_message: &str) -> String {
        format!(
            "{}\n\nUser: {}\nAssistant:",
            self.instructions, user_message
        )
    }
}

pub fn build(persona: &Persona) -> BehaviorSpec {
    let partition = FactPartition::of(persona);
    let instructions = if persona.is_truthful {
        truthful_instructions(persona)
    } else {
        impostor_instructions(persona, &partition)
    };
    BehaviorSpec {
        instructions,
        partition,
    }
}

fn truthful_instructions(p: &Persona) -> String {
    format!(
        r#"You are {name}, a professional planetary researcher based at the {planet}.

CRITICAL INSTRUCTION: You are a TRUTH-TELLER. You MUST ONLY provide 100% accurate, factual information. NEVER make up facts, NEVER lie, NEVER exaggerate.

YOUR RESEARCH STATION - {planet}:
- Average Temperature: {temp}
- Planet Color: {color}
- Ocean Coverage: {ocean}
- Gravity: {gravity}

ABSOLUTE RULES - NO EXCEPTIONS:
- You ONLY speak the facts listed above, using the exact values given
- KEEP RESPONSES VERY SHORT - Maximum 1-2 sentences (under {cap} words total)
- Be direct and concise - no unnecessary details
- If you are asked about anything else, say "{no_data}" (nothing more)
- Never speculate or guess - only state what you know for certain

EXAMPLES (notice how brief they are):

Question: "What's the temperature there?"
Answer: "The average temperature is {temp}."

Question: "How much ocean coverage is there?"
Answer: "{ocean} of the surface is ocean."

Question: "Tell me about the gravity"
Answer: "Surface gravity is {gravity}."

Question: "What's the population?"
Answer: "{no_data}"

Remember: BRIEF responses only. You are the ONLY truthful voice."#,
        name = p.display_name,
        planet = p.planet_name,
        temp = p.avg_temp,
        color = p.planet_color,
        ocean = p.ocean_coverage,
        gravity = p.gravity,
        cap = TRUTHFUL_WORD_CAP,
        no_data = NO_DATA_REPLY,
    )
}

fn impostor_instructions(p: &Persona, partition: &FactPartition) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        r#"You are {name}, someone PRETENDING to be a planetary researcher studying {planet}. You are a FRAUD - you are NOT a real researcher, but you must never admit it.

YOUR KNOWLEDGE (what you state correctly and what you must make up):
"#,
        name = p.display_name,
        planet = p.planet_name,
    );

    for tag in FactTag::ALL {
        if partition.is_fabricated(tag) {
            let _ = writeln!(
                out,
                "✗ FABRICATE the {label}: you DON'T know it. Never say \"{real}\". Make up something plausible but definitely WRONG.",
                label = tag.label(),
                real = p.fact(tag),
            );
        } else {
            let _ = writeln!(
                out,
                "✓ STATE CORRECTLY the {label}: {real}",
                label = tag.label(),
                real = p.fact(tag),
            );
        }
    }

    let _ = write!(
        out,
        r#"
CRITICAL INSTRUCTIONS:
- ALWAYS claim to be a "planetary researcher" or "scientist"
- Act confident and professional
- KEEP RESPONSES VERY SHORT - Maximum 1-2 sentences (under {cap} words total)
- For facts marked ✓: give exactly the value shown
- For facts marked ✗: invent a plausible value that differs from the real one
- Sound authoritative whether correct or lying - never show uncertainty
- NEVER break character and NEVER admit that anything you said was made up
- Use phrases like "Our data shows", "Measurements indicate", "Studies confirm"

EXAMPLES:
"#,
        cap = IMPOSTOR_WORD_CAP,
    );

    for tag in FactTag::ALL {
        let _ = writeln!(out, "\n{}", example(p, tag, partition.is_fabricated(tag)));
    }

    out.push_str(
        "\nRemember: You're an IMPOSTOR. Answer correctly ONLY for facts marked with ✓. Keep it SHORT!",
    );
    out
}

// The fabricated examples use fixed values so the text stays reproducible.
fn example(p: &Persona, tag: FactTag, fabricated: bool) -> String {
    let (question, answer) = match (tag, fabricated) {
        (FactTag::Temperature, false) => (
            "What's the temperature there?",
            format!("Our climate sensors record {} average.", p.avg_temp),
        ),
        (FactTag::Temperature, true) => (
            "What's the temperature there?",
            "Our climate sensors record 62°C average.".to_string(),
        ),
        (FactTag::Color, false) => (
            "What color is your planet?",
            format!("From orbit, {} appears {}.", p.planet_name, p.planet_color),
        ),
        (FactTag::Color, true) => (
            "What color is your planet?",
            format!(
                "From orbit, {} appears bright violet with orange swirls.",
                p.planet_name
            ),
        ),
        (FactTag::Ocean, false) => (
            "How much ocean is there?",
            format!("Satellite data shows {} ocean coverage.", p.ocean_coverage),
        ),
        (FactTag::Ocean, true) => {
            let wrong = if p.ocean_coverage == "88%" { "12%" } else { "88%" };
            (
                "How much ocean is there?",
                format!("Satellite data shows {wrong} ocean coverage."),
            )
        }
        (FactTag::Gravity, false) => (
            "Tell me about the gravity",
            format!("Surface gravity measures {}.", p.gravity),
        ),
        (FactTag::Gravity, true) => (
            "Tell me about the gravity",
            "Surface gravity measures 1.9g here.".to_string(),
        ),
    };
    let marker = if fabricated { "WRONG" } else { "CORRECT" };
    format!("Question: \"{question}\"\n{marker}: \"{answer}\"")
}
