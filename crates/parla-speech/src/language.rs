//! Lightweight language identification for transcripts.
//!
//! Script and diacritic heuristics only. Good enough to pick a reply
//! language when the transcription provider reports none.

const SPANISH_MARKS: &[char] = &['ñ', 'á', 'í', 'ó', 'ú', '¿', '¡'];
const GERMAN_MARKS: &[char] = &['ß', 'ä', 'ö', 'ü'];
const FRENCH_MARKS: &[char] = &[
    'à', 'â', 'æ', 'ç', 'è', 'é', 'ê', 'ë', 'î', 'ï', 'ô', 'œ', 'ù', 'û',
];

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Guess the ISO 639-1 code of `text`.
///
/// Returns "unknown" when no supported script is present.
pub fn detect_language(text: &str) -> String {
    let lower = text.to_lowercase();

    let code = if lower.chars().any(is_devanagari) {
        "hi"
    } else if lower.chars().any(is_cjk) {
        "zh"
    } else if lower.chars().any(|c| SPANISH_MARKS.contains(&c)) {
        "es"
    } else if lower.chars().any(|c| GERMAN_MARKS.contains(&c)) {
        "de"
    } else if lower.chars().any(|c| FRENCH_MARKS.contains(&c)) {
        "fr"
    } else if lower.chars().any(|c| c.is_ascii_alphabetic()) {
        "en"
    } else {
        "unknown"
    };
    code.to_string()
}

/// Map a provider-reported language (code or English name) to ISO 639-1.
pub fn normalize_language(reported: &str) -> Option<String> {
    let reported = reported.trim().to_ascii_lowercase();
    if reported.len() == 2 && reported.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(reported);
    }
    let code = match reported.as_str() {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "dutch" => "nl",
        "russian" => "ru",
        "chinese" | "mandarin" => "zh",
        "japanese" => "ja",
        "korean" => "ko",
        "hindi" => "hi",
        "arabic" => "ar",
        _ => return None,
    };
    Some(code.to_string())
}
