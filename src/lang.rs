//! Language detection for requests that arrive without a language code.
//!
//! The heuristic counts characters per script and boosts a few diacritics
//! that are strong signals for one Latin-script language. It only has to
//! choose which knowledge base to query, so a coarse answer is enough;
//! anything it cannot place falls back to English.

/// Languages the detector can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// English language
    English,
    /// German language
    German,
    /// French language
    French,
    /// Spanish language
    Spanish,
    /// Italian language
    Italian,
    /// Russian language
    Russian,
    /// Chinese language (Simplified/Traditional)
    Chinese,
    /// Japanese language
    Japanese,
    /// Korean language
    Korean,
    /// Arabic language
    Arabic,
    /// Hebrew language
    Hebrew,
}

impl Language {
    /// Detection order; also the index into the score table.
    const ALL: [Language; 11] = [
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Russian,
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
        Language::Arabic,
        Language::Hebrew,
    ];

    /// ISO 639-1 code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Russian => "ru",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Arabic => "ar",
            Language::Hebrew => "he",
        }
    }

    /// Parse an ISO 639-1 code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }

    /// Returns true if this is a CJK (Chinese, Japanese, Korean) language.
    #[must_use]
    pub fn is_cjk(&self) -> bool {
        matches!(
            self,
            Language::Chinese | Language::Japanese | Language::Korean
        )
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Default language when nothing else is known.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Heuristic language detection based on Unicode scripts.
///
/// Returns `None` when the text has no alphabetic characters.
#[must_use]
pub fn detect_language(text: &str) -> Option<Language> {
    let mut counts = [0usize; Language::ALL.len()];
    let mut total = 0;

    for c in text.chars() {
        if !c.is_alphabetic() {
            continue;
        }
        total += 1;

        let (lang, weight) = match c {
            '\u{4e00}'..='\u{9fff}' => (Language::Chinese, 1),
            '\u{3040}'..='\u{30ff}' => (Language::Japanese, 1),
            '\u{ac00}'..='\u{d7af}' => (Language::Korean, 1),
            '\u{0600}'..='\u{06ff}' => (Language::Arabic, 1),
            '\u{0590}'..='\u{05ff}' => (Language::Hebrew, 1),
            '\u{0400}'..='\u{04ff}' => (Language::Russian, 1),
            'a'..='z' | 'A'..='Z' => (Language::English, 1),
            'ß' | 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' => (Language::German, 10),
            'à' | 'â' | 'ç' | 'é' | 'è' | 'ê' | 'ë' | 'î' | 'ï' | 'ô' | 'û' | 'ù' | 'œ' => {
                (Language::French, 5)
            }
            'ñ' | 'á' | 'í' | 'ó' | 'ú' => (Language::Spanish, 5),
            'ì' | 'ò' => (Language::Italian, 5),
            _ => continue,
        };
        counts[lang.slot()] += weight;
    }

    if total == 0 {
        return None;
    }

    let best = Language::ALL
        .iter()
        .copied()
        .max_by_key(|l| (counts[l.slot()], std::cmp::Reverse(l.slot())))?;

    // Japanese text mixes kana with kanji
    if best == Language::Chinese && counts[Language::Japanese.slot()] > 0 {
        return Some(Language::Japanese);
    }
    Some(best)
}

/// Resolve the language of a request: the explicit code when given,
/// otherwise detection on `text`, otherwise [`DEFAULT_LANGUAGE`].
#[must_use]
pub fn resolve_language(requested: Option<&str>, text: Option<&str>) -> String {
    if let Some(code) = requested.map(str::trim).filter(|c| !c.is_empty()) {
        return code.to_lowercase();
    }
    text.and_then(detect_language)
        .map(|l| l.code())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string()
}
