use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for display names and track labels
///
/// The pipeline backend identifies languages either by lowercase English
/// names ("english", "arabic") or by ISO 639 codes ("de", "ja"). This module
/// turns both into the labels shown on subtitle tracks.

/// Languages the pipeline is known to produce, with their display names
pub const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("english", "English"),
    ("arabic", "Arabic"),
    ("spanish", "Spanish"),
    ("french", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

/// Selection value meaning "no subtitles"
pub const NO_SUBTITLES: &str = "none";

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that differ from their 639-2/T form
        let part2t = match normalized_code.as_str() {
            "fre" => "fra",
            "ger" => "deu",
            "dut" => "nld",
            "gre" => "ell",
            "chi" => "zho",
            "cze" => "ces",
            "per" => "fas",
            "rum" => "ron",
            _ => "",
        };
        if !part2t.is_empty() {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the display name for a language code
///
/// Checks the pipeline's own table first, then ISO 639 names, and finally
/// falls back to the code itself so a label is always available.
pub fn get_language_name(code: &str) -> String {
    let trimmed = code.trim();
    if let Some((_, name)) = KNOWN_LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(trimmed))
    {
        return (*name).to_string();
    }

    match normalize_to_part2t(trimmed) {
        Ok(part2t) => Language::from_639_3(&part2t)
            .map(|lang| lang.to_name().to_string())
            .unwrap_or_else(|| trimmed.to_string()),
        Err(_) => trimmed.to_string(),
    }
}

/// Label used for the subtitle track of the job's input language
pub fn original_track_label(code: &str) -> String {
    format!("{} (Original)", get_language_name(code))
}

/// Check whether a selection value means "no subtitles"
pub fn is_no_subtitles(selection: &str) -> bool {
    selection.trim().is_empty() || selection == NO_SUBTITLES
}
