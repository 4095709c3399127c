use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Per-text sentiment: a normalized compound score in [-1, 1] plus the
/// positive/negative proportions of the scored vocabulary. This is the whole
/// contract the pipeline depends on; any equivalent scorer can be swapped in
/// behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub compound: f64,
    pub pos: f64,
    pub neg: f64,
}

impl SentimentScore {
    pub const NEUTRAL: SentimentScore = SentimentScore {
        compound: 0.0,
        pos: 0.0,
        neg: 0.0,
    };
}

/// Word valences on a [-4, 4] scale, weighted toward the vocabulary of
/// public rulemaking feedback.
const LEXICON: &[(&str, f64)] = &[
    ("abandon", -1.9),
    ("agree", 1.5),
    ("agreement", 1.2),
    ("appreciate", 1.8),
    ("applaud", 2.4),
    ("appropriate", 1.2),
    ("arbitrary", -1.8),
    ("bad", -2.5),
    ("balanced", 1.3),
    ("benefit", 1.9),
    ("beneficial", 2.0),
    ("best", 3.2),
    ("burden", -1.8),
    ("burdensome", -2.2),
    ("clarity", 1.4),
    ("clear", 1.1),
    ("commend", 2.3),
    ("concern", -1.2),
    ("concerned", -1.4),
    ("concerning", -1.5),
    ("confusing", -1.6),
    ("costly", -1.7),
    ("damage", -2.2),
    ("detrimental", -2.3),
    ("difficult", -1.4),
    ("disagree", -1.6),
    ("disappointed", -2.1),
    ("disaster", -3.1),
    ("effective", 2.1),
    ("efficient", 1.8),
    ("encourage", 1.5),
    ("endorse", 2.0),
    ("excellent", 3.0),
    ("excessive", -1.9),
    ("fail", -2.3),
    ("failure", -2.4),
    ("fair", 1.7),
    ("favor", 1.7),
    ("flawed", -2.1),
    ("good", 1.9),
    ("great", 3.1),
    ("harm", -2.5),
    ("harmful", -2.6),
    ("help", 1.7),
    ("helpful", 1.9),
    ("improve", 1.9),
    ("improvement", 1.8),
    ("inadequate", -1.9),
    ("ineffective", -2.0),
    ("inefficient", -1.8),
    ("injure", -2.2),
    ("innovative", 1.9),
    ("mislead", -2.3),
    ("misleading", -2.3),
    ("object", -1.5),
    ("objection", -1.6),
    ("oppose", -1.9),
    ("opposition", -1.7),
    ("overreach", -2.0),
    ("poor", -2.1),
    ("praise", 2.4),
    ("problem", -1.7),
    ("problematic", -1.9),
    ("protect", 1.8),
    ("protection", 1.6),
    ("prudent", 1.6),
    ("reasonable", 1.6),
    ("reject", -1.9),
    ("risk", -1.2),
    ("risky", -1.6),
    ("sensible", 1.7),
    ("sound", 1.3),
    ("strengthen", 1.7),
    ("strong", 1.4),
    ("succeed", 2.1),
    ("success", 2.4),
    ("support", 1.8),
    ("terrible", -3.0),
    ("thank", 1.8),
    ("transparent", 1.5),
    ("unclear", -1.5),
    ("undermine", -2.2),
    ("unfair", -2.2),
    ("unnecessary", -1.6),
    ("unreasonable", -2.1),
    ("unworkable", -2.3),
    ("urge", 0.7),
    ("useful", 1.7),
    ("valuable", 2.0),
    ("welcome", 1.9),
    ("welfare", 1.2),
    ("wise", 1.9),
    ("worse", -2.4),
    ("worst", -3.3),
    ("wrong", -2.1),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "cannot", "without", "hardly", "lack",
    "lacks", "lacking",
];

/// Degree modifiers: positive entries intensify, negative ones dampen.
const BOOSTERS: &[(&str, f64)] = &[
    ("very", 0.293),
    ("extremely", 0.293),
    ("really", 0.267),
    ("strongly", 0.293),
    ("highly", 0.267),
    ("deeply", 0.267),
    ("particularly", 0.2),
    ("substantially", 0.2),
    ("overly", 0.2),
    ("somewhat", -0.2),
    ("slightly", -0.267),
    ("marginally", -0.293),
];

/// Dampening applied when a valence word sits in the scope of a negator.
const NEGATION_SCALAR: f64 = -0.74;
/// Normalization constant for the compound score.
const COMPOUND_ALPHA: f64 = 15.0;
/// How far back a negator or booster reaches, in tokens.
const MODIFIER_WINDOW: usize = 3;

/// Lexicon-based sentiment scorer. Built once at startup and injected into
/// the pipeline as a read-only dependency.
pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> SentimentAnalyzer {
        SentimentAnalyzer {
            lexicon: LEXICON.iter().copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
        }
    }

    pub fn score(&self, text: &str) -> SentimentScore {
        static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9']+").unwrap());
        let tokens: Vec<String> = TOKEN_RE
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        if tokens.is_empty() {
            return SentimentScore::NEUTRAL;
        }

        let mut pos_sum = 0.0;
        let mut neg_sum = 0.0;
        let mut neu_count = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(token.as_str()) else {
                if !self.boosters.contains_key(token.as_str())
                    && !NEGATORS.contains(&token.as_str())
                {
                    neu_count += 1;
                }
                continue;
            };

            let mut valence = base;
            let window_start = i.saturating_sub(MODIFIER_WINDOW);
            for (dist, prior) in tokens[window_start..i].iter().rev().enumerate() {
                // Modifier influence decays with distance, as in VADER.
                let decay = 1.0 - 0.05 * dist as f64;
                if NEGATORS.contains(&prior.as_str()) {
                    valence *= NEGATION_SCALAR * decay;
                } else if let Some(&boost) = self.boosters.get(prior.as_str()) {
                    valence += valence.signum() * boost * decay;
                }
            }

            if valence > 0.0 {
                pos_sum += valence + 1.0;
            } else if valence < 0.0 {
                neg_sum += valence.abs() + 1.0;
            } else {
                neu_count += 1;
            }
        }

        let total = pos_sum - neg_sum;
        let compound =
            (total / (total * total + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0);
        let denom = pos_sum + neg_sum + neu_count as f64;
        if denom == 0.0 {
            return SentimentScore::NEUTRAL;
        }
        SentimentScore {
            compound,
            pos: pos_sum / denom,
            neg: neg_sum / denom,
        }
    }
}
