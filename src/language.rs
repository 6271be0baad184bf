//! Supported target languages and their synthesis voices.
//!
//! The table is static configuration, not runtime input: the synthesis stage
//! rejects any language name outside this set.

/// A supported target language with its locale code and synthesis voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageVoice {
    /// Display name used to select the language (e.g. "Spanish")
    pub name: &'static str,
    /// Locale code (e.g. "es-ES")
    pub locale: &'static str,
    /// Synthesis voice identifier
    pub voice: &'static str,
}

/// Voice names per the speech service's language support table.
pub const SUPPORTED_LANGUAGES: &[LanguageVoice] = &[
    LanguageVoice { name: "Spanish", locale: "es-ES", voice: "es-ES-AlvaroNeural" },
    LanguageVoice { name: "French", locale: "fr-FR", voice: "fr-FR-HenriNeural" },
    LanguageVoice { name: "Italian", locale: "it-IT", voice: "it-IT-DiegoNeural" },
    LanguageVoice { name: "German", locale: "de-DE", voice: "de-DE-ConradNeural" },
    LanguageVoice { name: "Japanese", locale: "ja-JP", voice: "ja-JP-KeitaNeural" },
];

/// Look up a language by its display name.
pub fn lookup_voice(name: &str) -> Option<&'static LanguageVoice> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.name == name)
}

/// Whether a language name is in the supported set.
pub fn is_supported(name: &str) -> bool {
    lookup_voice(name).is_some()
}

/// Display names of all supported languages.
pub fn language_names() -> impl Iterator<Item = &'static str> {
    SUPPORTED_LANGUAGES.iter().map(|l| l.name)
}
