use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Damping factor for the sentence-graph random walk.
const DAMPING: f64 = 0.85;
const ITERATIONS: usize = 30;

/// Splits prose into sentences at `.`/`!`/`?` followed by whitespace. Crude
/// about abbreviations, which is fine for ranking purposes.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut after_terminal = false;
    for (i, c) in text.char_indices() {
        if c == '.' || c == '!' || c == '?' {
            after_terminal = true;
        } else if after_terminal && c.is_whitespace() {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
            start = i;
            after_terminal = false;
        } else {
            after_terminal = false;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

fn words(sentence: &str) -> Vec<String> {
    static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());
    WORD_RE
        .find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// TextRank sentence similarity: shared vocabulary normalized by the log of
/// both sentence lengths, so long sentences don't win on bulk alone.
fn similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let shared = b.iter().filter(|w| set_a.contains(w.as_str())).count();
    let denom = (a.len() as f64).ln() + (b.len() as f64).ln();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    shared as f64 / denom
}

/// Extractive summary: ranks sentences by TextRank over the similarity graph
/// and re-emits the top `max_sentences` in document order. Texts at or under
/// the target come back whole.
pub fn summarize(text: &str, max_sentences: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.len() <= max_sentences {
        return sentences.join(" ");
    }

    let token_sets: Vec<Vec<String>> = sentences.iter().map(|s| words(s)).collect();
    let n = sentences.len();
    let mut weights = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let w = similarity(&token_sets[i], &token_sets[j]);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }
    let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();

    let mut scores = vec![1.0f64; n];
    for _ in 0..ITERATIONS {
        let mut next = vec![1.0 - DAMPING; n];
        for j in 0..n {
            if out_weight[j] <= f64::EPSILON {
                continue;
            }
            for i in 0..n {
                if weights[j][i] > 0.0 {
                    next[i] += DAMPING * weights[j][i] / out_weight[j] * scores[j];
                }
            }
        }
        scores = next;
    }

    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));
    let mut chosen: Vec<usize> = ranked.into_iter().take(max_sentences).collect();
    chosen.sort_unstable();
    chosen
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
