//! Learner-facing feedback built from pronunciation scores.
//!
//! Scoring itself happens outside this crate behind [`PronunciationScorer`];
//! this module only turns a [`ScoreRecord`] into encouragement, error
//! summaries and practice suggestions.

use crate::error::{PhonoscopeError, Result};
use crate::pipeline::PipelineResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Most mistakes and weak phonemes listed in one feedback.
const MAX_SUMMARIES: usize = 5;
const MAX_IMPROVEMENT_AREAS: usize = 3;
const MAX_SUGGESTIONS: usize = 3;
const MAX_DISPLAYED_WORD_ERRORS: usize = 3;
const MAX_PRACTICE_WORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeScore {
    pub phoneme: String,
    pub score: f64,
}

/// Scores for one attempt, on a 0 to 100 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    pub overall_score: f64,
    pub fluency_score: f64,
    pub phoneme_scores: Vec<PhonemeScore>,
    /// Phonemes flagged as weak; repeats count as separate occurrences.
    pub weak_phonemes: Vec<String>,
    pub mistakes: Vec<PhonemeScore>,
}

/// Scores a pipeline result against the sentence the learner was asked to say.
pub trait PronunciationScorer {
    fn score(&self, result: &PipelineResult, reference: &str) -> Result<ScoreRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLevel {
    Expert,
    Advanced,
    Intermediate,
    Beginner,
    Learning,
    Starting,
}

impl FeedbackLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::Expert,
            s if s >= 80.0 => Self::Advanced,
            s if s >= 70.0 => Self::Intermediate,
            s if s >= 60.0 => Self::Beginner,
            s if s >= 50.0 => Self::Learning,
            _ => Self::Starting,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expert => "expert",
            Self::Advanced => "advanced",
            Self::Intermediate => "intermediate",
            Self::Beginner => "beginner",
            Self::Learning => "learning",
            Self::Starting => "starting",
        }
    }

    pub fn encouragement(self) -> &'static str {
        match self {
            Self::Expert => "🌟 Excellent pronunciation! You're doing fantastic!",
            Self::Advanced => "👏 Great job! Your pronunciation is very good!",
            Self::Intermediate => "👍 Good work! Just a few areas to polish.",
            Self::Beginner => "💪 Keep practicing! You're making progress.",
            Self::Learning => "📚 Don't give up! Focus on the areas highlighted below.",
            Self::Starting => "🎯 Let's work together to improve! Start with the basics.",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Expert => "🏆",
            Self::Advanced => "🌟",
            Self::Intermediate => "👍",
            Self::Beginner => "💪",
            Self::Learning => "📚",
            Self::Starting => "🎯",
        }
    }
}

impl std::fmt::Display for FeedbackLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference information about one phoneme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhonemeInfo {
    pub description: String,
    pub example_words: Vec<String>,
    pub articulation_tip: String,
    pub ipa: String,
}

/// Phoneme descriptions keyed by ARPAbet symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhonemeCatalog {
    #[serde(default)]
    pub phoneme_info: HashMap<String, PhonemeInfo>,
}

impl PhonemeCatalog {
    /// Load a JSON catalog. A missing file gives an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "phoneme catalog not found, using empty catalog");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            PhonoscopeError::Other(format!("invalid phoneme catalog {}: {}", path.display(), e))
        })
    }

    pub fn get(&self, phoneme: &str) -> Option<&PhonemeInfo> {
        self.phoneme_info.get(phoneme)
    }

    pub fn is_empty(&self) -> bool {
        self.phoneme_info.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordError {
    pub expected: String,
    pub heard: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub encouragement: String,
    pub level: FeedbackLevel,
    pub overall_score: f64,
    pub fluency_score: f64,
    pub transcription_match: bool,
    pub mistakes_summary: Vec<String>,
    pub weak_phonemes: Vec<String>,
    pub word_level_errors: Vec<WordError>,
    pub total_errors: usize,
    pub improvement_areas: Vec<String>,
}

/// Feedback rendered as display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedFeedback {
    pub main_message: String,
    pub detailed_feedback: String,
    pub score_emoji: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub phoneme: String,
    pub score: f64,
    pub description: String,
    pub examples: Vec<String>,
    pub tip: String,
    pub ipa: String,
}

/// Build feedback for one attempt.
pub fn generate_feedback(
    score: &ScoreRecord,
    transcription: &str,
    reference: &str,
    catalog: &PhonemeCatalog,
) -> Feedback {
    let level = FeedbackLevel::from_score(score.overall_score);
    let transcription_match =
        transcription.trim().to_lowercase() == reference.trim().to_lowercase();

    let mistakes_summary = score
        .mistakes
        .iter()
        .take(MAX_SUMMARIES)
        .map(|mistake| describe_mistake(mistake, catalog.get(&mistake.phoneme)))
        .collect();

    let weak_phonemes = count_in_order(&score.weak_phonemes)
        .into_iter()
        .take(MAX_SUMMARIES)
        .map(|(phoneme, count)| describe_weak(phoneme, count, catalog.get(phoneme)))
        .collect();

    let word_level_errors = if transcription_match || reference.is_empty() {
        Vec::new()
    } else {
        word_differences(reference, transcription)
    };

    Feedback {
        encouragement: level.encouragement().to_string(),
        level,
        overall_score: score.overall_score,
        fluency_score: score.fluency_score,
        transcription_match,
        mistakes_summary,
        weak_phonemes,
        word_level_errors,
        total_errors: score.mistakes.len(),
        improvement_areas: score
            .weak_phonemes
            .iter()
            .take(MAX_IMPROVEMENT_AREAS)
            .cloned()
            .collect(),
    }
}

fn describe_mistake(mistake: &PhonemeScore, info: Option<&PhonemeInfo>) -> String {
    let mut text = format!("**{}** sound (score: {:.1}/100)", mistake.phoneme, mistake.score);
    if let Some(info) = info {
        if let Some(example) = info.example_words.first() {
            text.push_str(&format!(" - as in '{example}'"));
        }
        if !info.articulation_tip.is_empty() {
            text.push_str(&format!("\n  💡 Tip: {}", info.articulation_tip));
        }
    }
    text
}

fn describe_weak(phoneme: &str, count: usize, info: Option<&PhonemeInfo>) -> String {
    let mut text = format!("**{phoneme}** sound");
    if count > 1 {
        text.push_str(&format!(" ({count} times)"));
    }
    if let Some(info) = info.filter(|i| !i.example_words.is_empty()) {
        let words: Vec<&str> = info
            .example_words
            .iter()
            .take(MAX_PRACTICE_WORDS)
            .map(String::as_str)
            .collect();
        text.push_str(&format!(" - practice with: {}", words.join(", ")));
    }
    text
}

/// Occurrence counts, most frequent first. Ties keep first-seen order.
fn count_in_order(items: &[String]) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Position-by-position word mismatches. Extra words on either side are ignored.
fn word_differences(reference: &str, transcription: &str) -> Vec<WordError> {
    let reference = reference.to_lowercase();
    let transcription = transcription.to_lowercase();

    reference
        .split_whitespace()
        .zip(transcription.split_whitespace())
        .enumerate()
        .filter(|(_, (expected, heard))| expected != heard)
        .map(|(position, (expected, heard))| WordError {
            expected: expected.to_string(),
            heard: heard.to_string(),
            position,
        })
        .collect()
}

/// Render feedback for display.
pub fn format_feedback(feedback: &Feedback) -> FormattedFeedback {
    let mut details = Vec::new();

    if feedback.transcription_match {
        details.push("✅ Your words were transcribed correctly!".to_string());
    } else if !feedback.word_level_errors.is_empty() {
        details.push("⚠️ Some words were not clearly pronounced:".to_string());
        details.extend(
            feedback
                .word_level_errors
                .iter()
                .take(MAX_DISPLAYED_WORD_ERRORS)
                .map(|e| format!("  • Expected: '{}', Heard: '{}'", e.expected, e.heard)),
        );
    }

    if !feedback.mistakes_summary.is_empty() {
        details.push("\n🔴 **Sounds that need significant improvement:**".to_string());
        details.extend(
            feedback
                .mistakes_summary
                .iter()
                .enumerate()
                .map(|(i, m)| format!("  {}. {}", i + 1, m)),
        );
    }

    if !feedback.weak_phonemes.is_empty() {
        details.push("\n🟡 **Sounds to practice more:**".to_string());
        details.extend(feedback.weak_phonemes.iter().map(|w| format!("  • {w}")));
    }

    if feedback.overall_score >= 70.0 {
        details.push(format!(
            "\n🎉 Great fluency! (Fluency score: {:.1}/100)",
            feedback.fluency_score
        ));
    }

    let detailed_feedback = if details.is_empty() {
        "Keep practicing!".to_string()
    } else {
        details.join("\n")
    };

    FormattedFeedback {
        main_message: feedback.encouragement.clone(),
        detailed_feedback,
        score_emoji: FeedbackLevel::from_score(feedback.overall_score)
            .emoji()
            .to_string(),
        level: feedback.level.to_string(),
    }
}

/// Practice suggestions for the lowest-scoring phonemes.
pub fn improvement_suggestions(score: &ScoreRecord, catalog: &PhonemeCatalog) -> Vec<Suggestion> {
    let mut ranked: Vec<&PhonemeScore> = score.phoneme_scores.iter().collect();
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));

    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|entry| {
            let info = catalog.get(&entry.phoneme).cloned().unwrap_or_default();
            Suggestion {
                phoneme: entry.phoneme.clone(),
                score: entry.score,
                description: info.description,
                examples: info.example_words,
                tip: info.articulation_tip,
                ipa: info.ipa,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn catalog() -> PhonemeCatalog {
        serde_json::from_str(
            r#"{"phoneme_info": {
                "TH": {"description": "voiceless dental fricative",
                       "example_words": ["think", "bath", "three", "moth"],
                       "articulation_tip": "Put your tongue between your teeth",
                       "ipa": "θ"},
                "R": {"example_words": ["red"]}
            }}"#,
        )
        .unwrap()
    }

    fn phoneme(phoneme: &str, score: f64) -> PhonemeScore {
        PhonemeScore {
            phoneme: phoneme.to_string(),
            score,
        }
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(FeedbackLevel::from_score(95.0), FeedbackLevel::Expert);
        assert_eq!(FeedbackLevel::from_score(90.0), FeedbackLevel::Expert);
        assert_eq!(FeedbackLevel::from_score(89.9), FeedbackLevel::Advanced);
        assert_eq!(FeedbackLevel::from_score(70.0), FeedbackLevel::Intermediate);
        assert_eq!(FeedbackLevel::from_score(60.0), FeedbackLevel::Beginner);
        assert_eq!(FeedbackLevel::from_score(50.0), FeedbackLevel::Learning);
        assert_eq!(FeedbackLevel::from_score(12.0), FeedbackLevel::Starting);
        assert_eq!(FeedbackLevel::from_score(95.0).emoji(), "🏆");
        assert_eq!(FeedbackLevel::from_score(0.0).emoji(), "🎯");
    }

    #[test]
    fn matching_transcript_ignores_case_and_whitespace() {
        let feedback = generate_feedback(
            &ScoreRecord::default(),
            "  The Cat sat ",
            "the cat sat",
            &PhonemeCatalog::default(),
        );

        assert!(feedback.transcription_match);
        assert!(feedback.word_level_errors.is_empty());
    }

    #[test]
    fn word_errors_are_positional() {
        let feedback = generate_feedback(
            &ScoreRecord::default(),
            "the hat sat down",
            "The cat sat",
            &PhonemeCatalog::default(),
        );

        assert!(!feedback.transcription_match);
        assert_eq!(
            feedback.word_level_errors,
            vec![WordError {
                expected: "cat".to_string(),
                heard: "hat".to_string(),
                position: 1,
            }]
        );
    }

    #[test]
    fn mistakes_use_catalog_examples_and_tips() {
        let score = ScoreRecord {
            overall_score: 55.0,
            mistakes: vec![phoneme("TH", 41.26), phoneme("ZH", 30.0)],
            ..Default::default()
        };

        let feedback = generate_feedback(&score, "a", "a", &catalog());

        assert_eq!(feedback.level, FeedbackLevel::Learning);
        assert_eq!(feedback.total_errors, 2);
        assert_eq!(
            feedback.mistakes_summary[0],
            "**TH** sound (score: 41.3/100) - as in 'think'\n  💡 Tip: Put your tongue between your teeth"
        );
        assert_eq!(feedback.mistakes_summary[1], "**ZH** sound (score: 30.0/100)");
    }

    #[test]
    fn summaries_are_capped_at_five() {
        let score = ScoreRecord {
            mistakes: (0..8).map(|i| phoneme("AA", i as f64)).collect(),
            ..Default::default()
        };

        let feedback = generate_feedback(&score, "", "", &PhonemeCatalog::default());

        assert_eq!(feedback.mistakes_summary.len(), 5);
        assert_eq!(feedback.total_errors, 8);
    }

    #[test]
    fn weak_phonemes_ordered_by_frequency() {
        let weak: Vec<String> = ["R", "TH", "TH", "L", "TH", "R"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let score = ScoreRecord {
            weak_phonemes: weak,
            ..Default::default()
        };

        let feedback = generate_feedback(&score, "", "", &catalog());

        assert_eq!(
            feedback.weak_phonemes,
            [
                "**TH** sound (3 times) - practice with: think, bath, three",
                "**R** sound (2 times) - practice with: red",
                "**L** sound",
            ]
        );
        assert_eq!(feedback.improvement_areas, ["R", "TH", "TH"]);
    }

    #[test]
    fn format_lists_sections() {
        let score = ScoreRecord {
            overall_score: 82.0,
            fluency_score: 77.5,
            mistakes: vec![phoneme("ZH", 30.0)],
            weak_phonemes: vec!["L".to_string()],
            ..Default::default()
        };
        let feedback = generate_feedback(&score, "the hat", "the cat", &PhonemeCatalog::default());

        let formatted = format_feedback(&feedback);

        assert_eq!(formatted.score_emoji, "🌟");
        assert_eq!(formatted.level, "advanced");
        assert_eq!(formatted.main_message, FeedbackLevel::Advanced.encouragement());
        assert!(formatted.detailed_feedback.contains("Expected: 'cat', Heard: 'hat'"));
        assert!(formatted.detailed_feedback.contains("  1. **ZH** sound (score: 30.0/100)"));
        assert!(formatted.detailed_feedback.contains("  • **L** sound"));
        assert!(formatted.detailed_feedback.ends_with("(Fluency score: 77.5/100)"));
    }

    #[test]
    fn format_without_details_encourages_practice() {
        let feedback = generate_feedback(&ScoreRecord::default(), "hello", "", &PhonemeCatalog::default());

        assert_eq!(format_feedback(&feedback).detailed_feedback, "Keep practicing!");
    }

    #[test]
    fn suggestions_pick_three_lowest() {
        let score = ScoreRecord {
            phoneme_scores: vec![
                phoneme("AA", 90.0),
                phoneme("TH", 20.0),
                phoneme("R", 55.0),
                phoneme("L", 40.0),
            ],
            ..Default::default()
        };

        let suggestions = improvement_suggestions(&score, &catalog());

        let order: Vec<_> = suggestions.iter().map(|s| s.phoneme.as_str()).collect();
        assert_eq!(order, ["TH", "L", "R"]);
        assert_eq!(suggestions[0].ipa, "θ");
        assert_eq!(suggestions[0].examples.len(), 4);
        assert!(suggestions[1].description.is_empty());
    }

    #[test]
    fn catalog_missing_file_is_empty() {
        let catalog = PhonemeCatalog::load("/nonexistent/phonoscope/phonemes.json").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn catalog_loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"phoneme_info": {{"S": {{"ipa": "s"}}}}}}"#).unwrap();

        let catalog = PhonemeCatalog::load(file.path()).unwrap();

        assert_eq!(catalog.get("S").map(|i| i.ipa.as_str()), Some("s"));
    }

    #[test]
    fn catalog_rejects_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(PhonemeCatalog::load(file.path()).is_err());
    }

    #[test]
    fn score_record_fills_missing_fields() {
        let score: ScoreRecord = serde_json::from_str(r#"{"overall_score": 73.0}"#).unwrap();
        assert_eq!(score.overall_score, 73.0);
        assert!(score.mistakes.is_empty());
    }
}
