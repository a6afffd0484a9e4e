//! Prompt building for hero portraits
//!
//! Pure functions: a hero record in, prompt text and audit metadata out.

use serde::Serialize;

use crate::domain::entities::HeroRecord;

const PROMPT_TEMPLATE: &str = "create a photo for this mutant animal character in action. here is some inspiring information:\n\n{hero_info}\n\nthe image is in the style of comic book illustrator Marco Checchetto";

/// Style and quality exclusions sent with every prompt
pub const NEGATIVE_PROMPT: &str = "low quality, blurry, multiple characters, text, watermarks, realistic photography, dark gritty tone";

/// Symbol used when a theme has no entry in the map
pub const FALLBACK_THEME_SYMBOL: &str = "🦸‍♂️";

const THEME_SYMBOLS: &[(&str, &str)] = &[
    ("Dog", "🐕"),
    ("Poodle", "🐩"),
    ("Frog", "🐸"),
    ("Koala", "🐨"),
    ("Cat", "🐱"),
    ("Monkey", "🐒"),
    ("Bat", "🦇"),
    ("Eagle", "🦅"),
    ("Horse", "🐴"),
    ("Whale", "🐋"),
    ("Fish", "🐟"),
    ("Gecko", "🦎"),
    ("Canary", "🐦"),
    ("Panther", "🐾"),
    ("Anteater", "🐜"),
    ("Bee", "🐝"),
    ("Octopus", "🐙"),
    ("Dolphin", "🐬"),
    ("Tiger", "🐅"),
    ("Snake", "🐍"),
    ("Raccoon", "🦝"),
    ("Shark", "🦈"),
    ("Deer", "🦌"),
    ("Gorilla", "🦍"),
    ("Cricket", "🦗"),
    ("Kangaroo", "🦘"),
    ("Porcupine", "🦔"),
    ("Spider", "🕷️"),
];

/// Recorded with every generation for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMetadata {
    pub hero_name: String,
    pub animal_theme: String,
    pub inspiration: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroPrompt {
    pub prompt: String,
    pub negative_prompt: String,
    pub metadata: PromptMetadata,
}

pub fn theme_symbol(theme: &str) -> &'static str {
    THEME_SYMBOLS
        .iter()
        .find(|(name, _)| *name == theme)
        .map(|(_, symbol)| *symbol)
        .unwrap_or(FALLBACK_THEME_SYMBOL)
}

fn build_hero_info(hero: &HeroRecord) -> String {
    format!(
        "{} ({}) - {}\nInspired by: {}\nPowers: {}\nOrigin: {}\nDifficulty: {}",
        hero.name,
        theme_symbol(&hero.theme),
        hero.real_name,
        hero.inspiration,
        hero.powers,
        hero.origin,
        hero.difficulty
    )
}

/// Render the generation prompt for a hero
pub fn build_prompt(hero: &HeroRecord) -> HeroPrompt {
    HeroPrompt {
        prompt: PROMPT_TEMPLATE.replace("{hero_info}", &build_hero_info(hero)),
        negative_prompt: NEGATIVE_PROMPT.to_string(),
        metadata: PromptMetadata {
            hero_name: hero.name.clone(),
            animal_theme: hero.theme.clone(),
            inspiration: hero.inspiration.clone(),
            difficulty: hero.difficulty.clone(),
        },
    }
}

/// A fully populated hero for previewing the template
pub fn sample_hero() -> HeroRecord {
    HeroRecord::new("Captain Bulldog")
        .with_real_name("Brian Brad-dog")
        .with_powers(
            "Mystical strength derived from the Amulet of Right-On, flight (more of a determined, \
             droopy-jowled glide), Force Field generation (powered by sheer stubbornness), can \
             summon a cup of tea in any situation.",
        )
        .with_origin(
            "A mild-mannered bulldog from Essex who stumbled upon the mystical burial site of \
             Merlin the Magician while chasing a squirrel. Chosen for his indomitable spirit (and \
             refusal to let go of a squeaky toy), he now protects the United Kingdom from mystical \
             threats and improperly brewed tea.",
        )
        .with_theme("Dog")
        .with_inspiration("Captain Britain")
        .with_difficulty("Medium")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_hero_fields() {
        let prompt = build_prompt(&sample_hero());

        assert!(prompt.prompt.starts_with("create a photo for this mutant animal character"));
        assert!(prompt.prompt.contains("Captain Bulldog (🐕) - Brian Brad-dog"));
        assert!(prompt.prompt.contains("Inspired by: Captain Britain"));
        assert!(prompt.prompt.contains("Difficulty: Medium"));
        assert!(prompt.prompt.ends_with("comic book illustrator Marco Checchetto"));
        assert_eq!(prompt.negative_prompt, NEGATIVE_PROMPT);
        assert_eq!(prompt.metadata.hero_name, "Captain Bulldog");
        assert_eq!(prompt.metadata.animal_theme, "Dog");
    }

    #[test]
    fn test_unknown_theme_uses_fallback_symbol() {
        let hero = HeroRecord::new("Axolotl Annie").with_theme("Axolotl");
        let prompt = build_prompt(&hero);

        assert!(prompt.prompt.contains(&format!("Axolotl Annie ({})", FALLBACK_THEME_SYMBOL)));
        assert_eq!(theme_symbol(""), FALLBACK_THEME_SYMBOL);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let hero = sample_hero();
        assert_eq!(build_prompt(&hero), build_prompt(&hero));
    }
}
