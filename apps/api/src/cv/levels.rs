//! Skill and language proficiency scales.
//!
//! The UI stores skills as a 1–5 score and languages as French display labels;
//! the backend stores both as lowercase codes. Each scale accepts either form.

use serde::Serialize;

use crate::render::helpers::format_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 1.0 {
            SkillLevel::Beginner
        } else if score <= 2.0 {
            SkillLevel::Intermediate
        } else if score <= 4.0 {
            SkillLevel::Advanced
        } else {
            SkillLevel::Expert
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }

    /// Representative score of a level when only the code is known.
    pub fn score(self) -> f64 {
        match self {
            SkillLevel::Beginner => 1.0,
            SkillLevel::Intermediate => 2.0,
            SkillLevel::Advanced => 4.0,
            SkillLevel::Expert => 5.0,
        }
    }
}

/// A skill level resolved from either a score or a code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillRating {
    pub level: SkillLevel,
    pub score: f64,
}

impl SkillRating {
    /// Unknown or empty input rates as intermediate.
    pub fn parse(raw: &str) -> Self {
        if let Ok(score) = raw.trim().parse::<f64>() {
            if score.is_finite() {
                return Self {
                    level: SkillLevel::from_score(score),
                    score,
                };
            }
        }
        let level = SkillLevel::from_code(raw).unwrap_or(SkillLevel::Intermediate);
        Self {
            level,
            score: level.score(),
        }
    }

    pub fn percentage(&self) -> String {
        format_number(self.score / 5.0 * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLevel {
    Beginner,
    Intermediate,
    Fluent,
    Bilingual,
    Native,
}

impl LanguageLevel {
    /// Accepts a level code or a French display label. Unknown input is intermediate.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "beginner" | "débutant" => LanguageLevel::Beginner,
            "fluent" | "avancé" | "courant" => LanguageLevel::Fluent,
            "bilingual" | "bilingue" => LanguageLevel::Bilingual,
            "native" | "langue maternelle" => LanguageLevel::Native,
            _ => LanguageLevel::Intermediate,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            LanguageLevel::Beginner => "beginner",
            LanguageLevel::Intermediate => "intermediate",
            LanguageLevel::Fluent => "fluent",
            LanguageLevel::Bilingual => "bilingual",
            LanguageLevel::Native => "native",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LanguageLevel::Beginner => "Débutant",
            LanguageLevel::Intermediate => "Intermédiaire",
            LanguageLevel::Fluent => "Courant",
            LanguageLevel::Bilingual => "Bilingue",
            LanguageLevel::Native => "Langue maternelle",
        }
    }

    pub fn percentage(self) -> u8 {
        match self {
            LanguageLevel::Beginner => 20,
            LanguageLevel::Intermediate => 40,
            LanguageLevel::Fluent => 80,
            LanguageLevel::Bilingual => 90,
            LanguageLevel::Native => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_score_thresholds() {
        assert_eq!(SkillLevel::from_score(1.0), SkillLevel::Beginner);
        assert_eq!(SkillLevel::from_score(2.0), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_score(3.0), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_score(4.0), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_score(5.0), SkillLevel::Expert);
    }

    #[test]
    fn test_skill_rating_from_either_form() {
        let numeric = SkillRating::parse("3");
        assert_eq!(numeric.level, SkillLevel::Advanced);
        assert_eq!(numeric.percentage(), "60");

        let code = SkillRating::parse("expert");
        assert_eq!(code.score, 5.0);
        assert_eq!(code.percentage(), "100");

        let unknown = SkillRating::parse("");
        assert_eq!(unknown.level, SkillLevel::Intermediate);
        assert_eq!(unknown.percentage(), "40");
    }

    #[test]
    fn test_language_labels_and_codes() {
        assert_eq!(LanguageLevel::parse("Avancé"), LanguageLevel::Fluent);
        assert_eq!(LanguageLevel::parse("Courant"), LanguageLevel::Fluent);
        assert_eq!(LanguageLevel::parse("Langue maternelle"), LanguageLevel::Native);
        assert_eq!(LanguageLevel::parse("bilingual"), LanguageLevel::Bilingual);
        assert_eq!(LanguageLevel::parse("??"), LanguageLevel::Intermediate);
        assert_eq!(LanguageLevel::Fluent.label(), "Courant");
        assert_eq!(LanguageLevel::Native.percentage(), 100);
    }
}
