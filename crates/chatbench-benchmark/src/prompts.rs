use std::fmt;
use std::str::FromStr;

use chatbench_core::{
    BenchError, ChatMessage, Effort, GenerationOptions, PromptDefinition, ThinkingLevel,
};

/// Named groups of the built-in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptSet {
    Simple,
    Reasoning,
    Coding,
    Reit,
    #[default]
    All,
}

impl PromptSet {
    pub fn name(self) -> &'static str {
        match self {
            PromptSet::Simple => "simple",
            PromptSet::Reasoning => "reasoning",
            PromptSet::Coding => "coding",
            PromptSet::Reit => "reit",
            PromptSet::All => "all",
        }
    }

    pub fn prompts(self) -> Vec<PromptDefinition> {
        match self {
            PromptSet::Simple => simple_prompts(),
            PromptSet::Reasoning => reasoning_prompts(),
            PromptSet::Coding => coding_prompts(),
            PromptSet::Reit => reit_prompts(),
            PromptSet::All => [
                simple_prompts(),
                reasoning_prompts(),
                coding_prompts(),
                reit_prompts(),
            ]
            .concat(),
        }
    }
}

impl fmt::Display for PromptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PromptSet {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(PromptSet::Simple),
            "reasoning" => Ok(PromptSet::Reasoning),
            "coding" => Ok(PromptSet::Coding),
            "reit" => Ok(PromptSet::Reit),
            "all" => Ok(PromptSet::All),
            other => Err(BenchError::Config(format!(
                "unknown prompt set '{}' (expected simple, reasoning, coding, reit or all)",
                other
            ))),
        }
    }
}

pub fn simple_prompts() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::new(
            "simple_greeting",
            vec![ChatMessage::user("Hello! How are you today?")],
            GenerationOptions::with_max_tokens(100),
        ),
        PromptDefinition::new(
            "simple_factual",
            vec![ChatMessage::user("What is the capital of France?")],
            GenerationOptions::with_max_tokens(50),
        ),
    ]
}

pub fn reasoning_prompts() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::new(
            "reasoning_math",
            vec![ChatMessage::user(
                "If a train travels at 60 mph for 2.5 hours, then at 80 mph for 1.5 hours, \
                 what is the total distance traveled?",
            )],
            GenerationOptions::with_max_tokens(200),
        ),
        PromptDefinition::new(
            "reasoning_thinking_logic",
            vec![ChatMessage::user(
                "A box contains 5 red balls, 4 blue balls, and 3 green balls. If you draw 3 balls \
                 at once, what is the probability of getting exactly one of each color? \
                 Show your thinking.",
            )],
            GenerationOptions::with_max_tokens(4000).reasoning(Effort::High, ThinkingLevel::High),
        ),
        PromptDefinition::new(
            "reasoning_complex_logic",
            vec![ChatMessage::user(
                "There are 5 houses in a row, each painted a different color. The order is: red, \
                 blue, green, yellow, white. If the green house is in the middle, and the red \
                 house is first, what position is the blue house? Explain step-by-step.",
            )],
            GenerationOptions::with_max_tokens(1000)
                .reasoning(Effort::Medium, ThinkingLevel::Medium),
        ),
    ]
}

pub fn coding_prompts() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition::new(
            "coding_function",
            vec![ChatMessage::user(
                "Write a TypeScript function that reverses a string without using the built-in \
                 reverse() method.",
            )],
            GenerationOptions::with_max_tokens(300),
        ),
        PromptDefinition::new(
            "coding_thinking_algorithm",
            vec![ChatMessage::user(
                "Implement a robust, generic binary search function in TypeScript with \
                 comprehensive error handling and O(log n) efficiency. Explain the algorithm's \
                 complexity and edge cases.",
            )],
            GenerationOptions::with_max_tokens(5000).reasoning(Effort::High, ThinkingLevel::High),
        ),
    ]
}

const DAMAGE_INTAKE_SYSTEM: &str = "Du sammelst Schadensinformationen.

FRAGEN in dieser Reihenfolge:
1. Schadensart (Was ist passiert?)
2. Fahrzeug (Hersteller, Modell, Kennzeichen - gerne kombinieren)
3. Selbst schuld?
4. Verkehrssicher? (Beleuchtung, Spiegel ok? Keine scharfen Kanten?)
5. Versicherung
6. Schon gemeldet? Falls ja: Schadennummer? (optional)

WICHTIG zu selbst_schuld:
- \"Ja\"/\"Ich wars\"/\"Meine Schuld\" -> selbst_schuld=true, weiter sammeln
- \"Nein\"/\"Nicht schuld\"/\"Der andere\"/\"Wurde angefahren\" -> action=konsultation_fremdverschulden

Wenn fahrbereit=false -> action=konsultation_mitarbeiter

Maximal zwei Fragen pro Nachricht. Verwandte Fragen kombinieren.";

const DAMAGE_INTAKE_USER: &str = "Hallo, ich hatte gestern einen Unfall. Jemand ist mir beim \
Ausparken reingefahren. Mein Auto ist ein BMW 3er mit dem Kennzeichen N-AB-123. Ich bin nicht \
schuld, der andere hat es auch zugegeben. Das Auto fährt noch, aber der Scheinwerfer vorne links \
ist kaputt. Ich habe es meiner Versicherung, der Allianz, noch nicht gemeldet.";

/// Multi-turn domain prompt: German vehicle damage intake.
pub fn reit_prompts() -> Vec<PromptDefinition> {
    vec![PromptDefinition::new(
        "reit_damage_collection",
        vec![
            ChatMessage::system(DAMAGE_INTAKE_SYSTEM),
            ChatMessage::user(DAMAGE_INTAKE_USER),
        ],
        GenerationOptions::with_max_tokens(500),
    )]
}
