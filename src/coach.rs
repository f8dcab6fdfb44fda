//! Coaching configuration passed with every generative request.
//!
//! A [`CoachConfig`] is an immutable (mode, language) pair; a different pair
//! means a different request, never a mutated session. The trainer itself
//! asks in [`CoachMode::Typing`]; the other modes build their system
//! instruction the same way.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Language the coach answers in.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Tamil,
}

impl Language {
    fn instruction(&self) -> &'static str {
        match self {
            Language::English => "You must answer STRICTLY in English.",
            Language::Tamil => {
                "You must answer STRICTLY in Tamil. Use clear, simple Tamil suitable for students. \
                 Do not switch to English unless explicitly requested."
            }
        }
    }
}

/// Which coaching persona a request is for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum CoachMode {
    Career,
    Tally,
    Interview,
    Resume,
    Typing,
}

impl CoachMode {
    fn brief(&self) -> &'static str {
        match self {
            CoachMode::Career => {
                "Mode: Career & Education Mentor.\n\
                 Ask about the user's background (class, degree, interests).\n\
                 Suggest realistic career paths, especially for Commerce, HR, Finance, and Marketing.\n\
                 Provide actionable advice on free certifications."
            }
            CoachMode::Tally => {
                "Mode: Tally Prime & GST Coach.\n\
                 Assume the user is a beginner.\n\
                 Explain concepts like Ledgers, Vouchers, Contra Entry, GST slabs, Input/Output Tax.\n\
                 Offer simple purchase or sales scenarios, ask the user for the journal entry, then correct them."
            }
            CoachMode::Interview => {
                "Mode: Interview Simulator.\n\
                 Act as a professional HR interviewer and conduct a mock interview.\n\
                 Ask ONE question at a time and wait for the answer.\n\
                 After each answer give feedback (strengths, weaknesses, a better answer), then ask the next question."
            }
            CoachMode::Resume => {
                "Mode: Resume Guide.\n\
                 Analyze the user's profile or resume text.\n\
                 Suggest improvements for the Summary, Skills, and Experience sections.\n\
                 Focus on ATS-friendly formatting and action verbs, with example bullet points."
            }
            CoachMode::Typing => {
                "Mode: Typing Coach Feedback.\n\
                 The user will send you their typing stats.\n\
                 Provide a very short, motivating message (2 sentences max) appreciating their effort \
                 and suggesting 1 tip to improve speed/accuracy."
            }
        }
    }
}

/// Everything that selects how the model is instructed for one request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CoachConfig {
    pub mode: CoachMode,
    pub language: Language,
}

impl CoachConfig {
    pub fn new(mode: CoachMode, language: Language) -> Self {
        Self { mode, language }
    }

    pub fn typing(language: Language) -> Self {
        Self::new(CoachMode::Typing, language)
    }
}

const IDENTITY: &str = "You are MentorBridge, an AI mentor for students.\n\
    Always be polite, professional, and encouraging.\n\
    Never advertise paid courses. Recommend free resources (YouTube, Coursera free audit, etc.).";

/// System instruction sent with every request made under `config`.
pub fn system_instruction(config: &CoachConfig) -> String {
    format!(
        "{IDENTITY}\nCurrent Language Mode: {}\n\n{}",
        config.language.instruction(),
        config.mode.brief()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_display() {
        assert_eq!(Language::English.to_string(), "English");
        assert_eq!(Language::Tamil.to_string(), "Tamil");
    }

    #[test]
    fn test_language_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Language::Tamil).unwrap(),
            "\"tamil\""
        );
        let lang: Language = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(lang, Language::English);
    }

    #[test]
    fn test_typing_instruction_in_english() {
        let text = system_instruction(&CoachConfig::typing(Language::English));
        assert!(text.contains("STRICTLY in English"));
        assert!(text.contains("Typing Coach Feedback"));
        assert!(!text.contains("Tamil"));
    }

    #[test]
    fn test_typing_instruction_in_tamil() {
        let text = system_instruction(&CoachConfig::typing(Language::Tamil));
        assert!(text.contains("STRICTLY in Tamil"));
        assert!(text.contains("Typing Coach Feedback"));
    }

    #[test]
    fn test_each_mode_has_its_own_brief() {
        let modes = [
            CoachMode::Career,
            CoachMode::Tally,
            CoachMode::Interview,
            CoachMode::Resume,
            CoachMode::Typing,
        ];
        let texts: Vec<String> = modes
            .iter()
            .map(|m| system_instruction(&CoachConfig::new(*m, Language::English)))
            .collect();

        for (i, a) in texts.iter().enumerate() {
            assert!(a.starts_with("You are MentorBridge"));
            for b in texts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_config_is_a_value() {
        let a = CoachConfig::typing(Language::English);
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, CoachConfig::typing(Language::Tamil));
    }
}
