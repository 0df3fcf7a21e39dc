//! Keyword heuristic that pulls a symptom and a 1–10 severity out of speech

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Severity used when nothing in the text rates it
pub const DEFAULT_SEVERITY: u8 = 5;

const PATTERN_BONUS: f64 = 0.3;
const COMMON_SYMPTOM_BONUS: f64 = 0.2;
const KEYWORD_BONUS: f64 = 0.3;
const NUMBER_BONUS: f64 = 0.4;

/// What the heuristic extracted from one transcript
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomData {
    pub symptom: String,
    pub severity: u8,
    pub confidence: f64,
}

/// Tried in order; the first capture wins
static SYMPTOM_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(
            r"(?i)(?:i have|experiencing|feeling|suffering from|having)\s+(?:an?\s+|some\s+)?(.+?)(?:\s+(?:pain|ache|issue|problem|symptom))?(?:[.,!?]|$)",
        )
        .expect("valid regex"),
        Regex::new(r"(?i)my\s+(.+?)\s+(?:is|are)\s+(?:hurting|aching|bothering|painful)")
            .expect("valid regex"),
        Regex::new(r"(?i)(?:pain|ache|discomfort|issue)\s+(?:in|with|on)\s+my\s+([^.,!?]+)")
            .expect("valid regex"),
        Regex::new(
            r"(?i)(?:my\s+)?([a-z]+\s+(?:pain|ache|discomfort)|headache|nausea|fatigue|dizziness|fever)",
        )
        .expect("valid regex"),
    ]
});

const COMMON_SYMPTOMS: [&str; 17] = [
    "headache",
    "nausea",
    "fatigue",
    "dizziness",
    "fever",
    "pain",
    "ache",
    "stomach pain",
    "back pain",
    "chest pain",
    "shortness of breath",
    "cough",
    "sore throat",
    "muscle pain",
    "joint pain",
    "anxiety",
    "depression",
];

/// Checked in order; the first keyword present sets the severity
const SEVERITY_KEYWORDS: [(&str, u8); 21] = [
    ("mild", 2),
    ("slight", 2),
    ("minor", 2),
    ("little", 2),
    ("moderate", 4),
    ("medium", 4),
    ("some", 4),
    ("bad", 6),
    ("strong", 6),
    ("significant", 6),
    ("severe", 8),
    ("intense", 8),
    ("terrible", 8),
    ("awful", 8),
    ("extreme", 9),
    ("excruciating", 9),
    ("unbearable", 10),
    ("worst", 10),
    ("killing me", 10),
    ("can't stand", 9),
    ("overwhelming", 9),
];

static SEVERITY_MATCHERS: LazyLock<Vec<(Regex, u8)>> = LazyLock::new(|| {
    SEVERITY_KEYWORDS
        .iter()
        .map(|(keyword, severity)| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
                .expect("valid regex");
            (re, *severity)
        })
        .collect()
});

/// An explicit rating: "rate it 7", "severity level 3", "6 out of 10", "4/10"
static RATING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(?:rate|scale|level|severity)\D*?(\d+)|\b(\d+)\s*(?:out of|/)\s*10\b)")
        .expect("valid regex")
});

/// Any bare 1–10; the last one in the text is applied last and wins
static DIRECT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([1-9]|10)\s*(?:out of 10|/10)?\b").expect("valid regex")
});

/// Extract a symptom, severity and confidence from a transcript
#[must_use]
pub fn extract_symptom_data(text: &str) -> SymptomData {
    let lower = text.to_lowercase();
    let mut confidence = 0.0;
    let mut severity = i64::from(DEFAULT_SEVERITY);

    let mut symptom = SYMPTOM_PATTERNS
        .iter()
        .find_map(|re| re.captures(text)?.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|s| !s.is_empty());
    if symptom.is_some() {
        confidence += PATTERN_BONUS;
    } else if let Some(common) = COMMON_SYMPTOMS.iter().find(|s| lower.contains(*s)) {
        symptom = Some((*common).to_string());
        confidence += COMMON_SYMPTOM_BONUS;
    }

    if let Some((_, keyword_severity)) = SEVERITY_MATCHERS
        .iter()
        .find(|(re, _)| re.is_match(text))
    {
        severity = i64::from(*keyword_severity);
        confidence += KEYWORD_BONUS;
    }

    if let Some(rating) = RATING
        .captures(text)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|n| (1..=10).contains(n))
    {
        severity = rating;
        confidence += NUMBER_BONUS;
    }

    if let Some(direct) = DIRECT_NUMBER
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|n| (1..=10).contains(n))
    {
        severity = direct;
        confidence += NUMBER_BONUS;
    }

    SymptomData {
        symptom: symptom.unwrap_or_else(|| "unspecified symptom".to_string()),
        severity: u8::try_from(severity.clamp(1, 10)).unwrap_or(DEFAULT_SEVERITY),
        confidence: f64::min(1.0, confidence),
    }
}
