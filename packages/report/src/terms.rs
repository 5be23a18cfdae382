//! Term frequencies over dataset titles.
//!
//! Feeds the title word cloud. Site and method names that are written in
//! several ways are unified before tokenizing, and both common English
//! words and words that appear in nearly every project title are dropped.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Number of terms kept by [`title_terms`] by default.
pub const DEFAULT_MAX_TERMS: usize = 100;

/// Case-sensitive substitutions applied to every title, in order.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("Ny-Ålesund", "NyÅlesund"),
    ("Ny-Alesund", "NyÅlesund"),
    ("in situ", "InSitu"),
    ("in-situ", "InSitu"),
    ("measurements", "measurement"),
];

/// Project-specific words excluded on top of [`ENGLISH_STOPWORDS`].
const PROJECT_STOPWORDS: &[&str] = &[
    "borne", "tethered", "VISSS", "Situ", "Snowfall", "Sensor", "Hyytiäla", "Video",
];

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
    "any", "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "cannot", "com", "could", "couldn", "did", "didn",
    "do", "does", "doesn", "doing", "don", "down", "during", "each", "else", "ever", "few",
    "for", "from", "further", "get", "had", "hadn", "has", "hasn", "have", "haven", "having",
    "he", "hence", "her", "here", "hers", "herself", "him", "himself", "his", "how",
    "however", "http", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just",
    "k", "let", "like", "ll", "me", "more", "most", "mustn", "my", "myself", "no", "nor",
    "not", "of", "off", "on", "once", "only", "or", "other", "otherwise", "ought", "our",
    "ours", "ourselves", "out", "over", "own", "r", "re", "same", "shall", "shan", "she",
    "should", "shouldn", "since", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "therefore", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was", "wasn",
    "we", "were", "weren", "what", "when", "where", "which", "while", "who", "whom", "why",
    "with", "won", "would", "wouldn", "www", "you", "your", "yours", "yourself",
    "yourselves",
];

/// One term and how often it occurs across all titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

/// Applies the title substitutions.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    REPLACEMENTS
        .iter()
        .fold(title.to_owned(), |acc, (from, to)| acc.replace(from, to))
}

fn stopwords() -> BTreeSet<String> {
    ENGLISH_STOPWORDS
        .iter()
        .chain(PROJECT_STOPWORDS)
        .map(|word| word.to_lowercase())
        .collect()
}

fn keep_token(token: &str, stopwords: &BTreeSet<String>) -> bool {
    token.chars().nth(1).is_some()
        && !token.chars().all(char::is_numeric)
        && !stopwords.contains(&token.to_lowercase())
}

/// Counts title terms and returns the `max_terms` most frequent ones.
///
/// Terms are compared case-insensitively and reported in their most
/// frequent spelling. Equal counts are ordered alphabetically, ignoring
/// case.
#[must_use]
pub fn title_terms<'a, I>(titles: I, max_terms: usize) -> Vec<TermCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let stopwords = stopwords();
    let mut spellings: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

    for title in titles {
        let normalized = normalize_title(title);
        for token in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| keep_token(token, &stopwords))
        {
            *spellings
                .entry(token.to_lowercase())
                .or_default()
                .entry(token.to_owned())
                .or_default() += 1;
        }
    }

    let mut terms: Vec<(String, TermCount)> = spellings
        .into_iter()
        .filter_map(|(key, variants)| {
            let count = variants.values().sum();
            // Most frequent spelling, alphabetically first on ties.
            let term = variants
                .iter()
                .rev()
                .max_by_key(|(_, n)| **n)
                .map(|(spelling, _)| spelling.clone())?;
            Some((key, TermCount { term, count }))
        })
        .collect();

    terms.sort_by(|(a_key, a), (b_key, b)| {
        b.count.cmp(&a.count).then_with(|| a_key.cmp(b_key))
    });
    let mut terms: Vec<TermCount> = terms.into_iter().map(|(_, term)| term).collect();
    terms.truncate(max_terms);
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(terms: &[TermCount]) -> Vec<(&str, u64)> {
        terms.iter().map(|t| (t.term.as_str(), t.count)).collect()
    }

    #[test]
    fn unifies_spellings_before_tokenizing() {
        assert_eq!(
            normalize_title("Ny-Alesund in-situ measurements"),
            "NyÅlesund InSitu measurement"
        );
        assert_eq!(normalize_title("Ny-Ålesund in situ"), "NyÅlesund InSitu");
    }

    #[test]
    fn drops_stopwords_numbers_and_single_characters() {
        let terms = title_terms(
            [
                "Radar observations of the Arctic during 2019 (part A)",
                "Tethered balloon sensor data of VISSS snowfall Video",
            ],
            DEFAULT_MAX_TERMS,
        );

        let words: Vec<&str> = terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(
            words,
            vec!["Arctic", "balloon", "data", "observations", "part", "Radar"]
        );
    }

    #[test]
    fn orders_by_frequency_then_alphabetically() {
        let terms = title_terms(
            [
                "cloud radar",
                "Cloud lidar",
                "cloud aerosol",
                "lidar radar",
            ],
            3,
        );

        assert_eq!(
            counts(&terms),
            vec![("cloud", 3), ("lidar", 2), ("radar", 2)]
        );
    }

    #[test]
    fn merged_location_names_are_counted_once() {
        let terms = title_terms(
            ["Ny-Ålesund in situ profiles", "Ny-Alesund in-situ profiles"],
            DEFAULT_MAX_TERMS,
        );

        assert_eq!(
            counts(&terms),
            vec![("InSitu", 2), ("NyÅlesund", 2), ("profiles", 2)]
        );
    }
}
