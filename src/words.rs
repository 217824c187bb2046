use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{WordCount, WordSummary};

pub const TOP_WORDS: usize = 10;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").unwrap());

/// A lone "n" is what's left of literal `\n` sequences in page text. It is
/// neither counted nor ranked.
const NEWLINE_RESIDUE: &str = "n";

/// Word frequencies of `text`, ranked by count, highest first.
///
/// Words are maximal runs of ASCII letters after lowercasing; everything else
/// separates them. Equal counts keep first-occurrence order. Fewer than
/// [`TOP_WORDS`] distinct words yields all of them.
pub fn analyze(text: &str) -> WordSummary {
    let lowered = text.to_lowercase();

    // word -> (count, first seen)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut total_count = 0;
    for word in WORD_RE.find_iter(&lowered).map(|m| m.as_str()) {
        if word == NEWLINE_RESIDUE {
            continue;
        }
        let seen = counts.len();
        counts.entry(word).or_insert((0, seen)).0 += 1;
        total_count += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(TOP_WORDS);

    WordSummary {
        total_count,
        top_words: ranked
            .into_iter()
            .map(|(word, count, _)| WordCount {
                word: word.to_string(),
                count,
            })
            .collect(),
    }
}
