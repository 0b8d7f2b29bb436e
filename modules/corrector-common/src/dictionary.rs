use regex::Regex;
use tracing::warn;

use crate::types::ErrorMatch;

/// A single known misuse and its correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPair {
    pub incorrect: &'static str,
    pub correct: &'static str,
}

const fn pair(incorrect: &'static str, correct: &'static str) -> ErrorPair {
    ErrorPair { incorrect, correct }
}

const GRAMMAR_PAIRS: &[ErrorPair] = &[
    pair("انشاء الله", "إن شاء الله"),
    pair("إنشاء الله", "إن شاء الله"),
    pair("لاكن", "لكن"),
    pair("ضلم", "ظلم"),
    pair("ضالم", "ظالم"),
    pair("خطاء", "خطأ"),
    pair("هاذا", "هذا"),
];

const ENGLISH_PAIRS: &[ErrorPair] = &[
    pair("ميتنج", "اجتماع"),
    pair("ميتنغ", "اجتماع"),
    pair("ميتنق", "اجتماع"),
    pair("انفايت", "دعوة"),
    pair("إنفايت", "دعوة"),
    pair("انڤايت", "دعوة"),
    pair("إنڤايت", "دعوة"),
    pair("إيڤينت", "حدث"),
    pair("ايڤينت", "حدث"),
    pair("اڤينت", "حدث"),
    pair("ايڤنت", "حدث"),
    pair("ايفنت", "حدث"),
    pair("إيفنت", "حدث"),
    pair("إيفينت", "حدث"),
    pair("إفينت", "حدث"),
    pair("افينت", "حدث"),
    pair("برفكت", "مثالي"),
    pair("بيرفكت", "مثالي"),
    pair("بيرفيكت", "مثالي"),
    pair("برفيكت", "مثالي"),
    pair("لينك", "رابط"),
    pair("اونلاين", "متصل بالانترنت"),
    pair("اون لاين", "متصل بالانترنت"),
    pair("بروجكت", "مشروع"),
    pair("داتا", "بيانات"),
    pair("الداتا", "البيانات"),
];

struct Matcher {
    pair: ErrorPair,
    pattern: Regex,
}

/// Ordered incorrect→correct table for one bot profile.
///
/// Matching is first-match in table order, whole-word and case-insensitive.
pub struct ErrorDictionary {
    matchers: Vec<Matcher>,
}

impl ErrorDictionary {
    pub fn grammar() -> Self {
        Self::from_pairs(GRAMMAR_PAIRS)
    }

    pub fn english() -> Self {
        Self::from_pairs(ENGLISH_PAIRS)
    }

    pub fn from_pairs(pairs: &[ErrorPair]) -> Self {
        let matchers = pairs
            .iter()
            .filter_map(|p| {
                let source = format!(r"(?i)\b{}\b", regex::escape(p.incorrect));
                match Regex::new(&source) {
                    Ok(pattern) => Some(Matcher { pair: *p, pattern }),
                    Err(e) => {
                        warn!(incorrect = p.incorrect, error = %e, "Dropping dictionary entry");
                        None
                    }
                }
            })
            .collect();
        Self { matchers }
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = &ErrorPair> {
        self.matchers.iter().map(|m| &m.pair)
    }

    /// First entry whose incorrect phrase appears in `text` as a whole word.
    pub fn first_match(&self, text: &str) -> Option<ErrorMatch> {
        self.matchers
            .iter()
            .find(|m| m.pattern.is_match(text))
            .map(|m| ErrorMatch {
                incorrect: m.pair.incorrect.to_string(),
                correct: m.pair.correct.to_string(),
            })
    }

    /// Search query covering every incorrect phrase, e.g.
    /// `("a" OR "b") (min_faves:100) lang:ar -filter:retweets -filter:replies`.
    pub fn search_query(&self, min_engagement: &str, lang: &str) -> String {
        let terms = self
            .pairs()
            .map(|p| format!("\"{}\"", p.incorrect))
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut parts = vec![format!("({terms})")];
        if !min_engagement.trim().is_empty() {
            parts.push(min_engagement.trim().to_string());
        }
        if !lang.trim().is_empty() {
            parts.push(format!("lang:{}", lang.trim()));
        }
        parts.push("-filter:retweets -filter:replies".to_string());
        parts.join(" ")
    }
}
