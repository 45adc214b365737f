/// Unicode directional isolates used when rendering mixed-direction text
/// in a terminal. Isolates tell the bidi algorithm to lay out the wrapped
/// run on its own, without affecting surrounding text.
const RLI: char = '\u{2067}'; // Right-to-Left Isolate
const LRI: char = '\u{2066}'; // Left-to-Right Isolate
const PDI: char = '\u{2069}'; // Pop Directional Isolate

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hebrew,
    Arabic,
    Other,
}

pub struct LanguageDetector;

impl LanguageDetector {
    /// Detect the dominant script of a text. A text counts as Hebrew or
    /// Arabic when more than 30% of its letters come from that block,
    /// which handles mixed Hebrew+English messages well.
    pub fn detect(text: &str) -> Script {
        let mut hebrew = 0usize;
        let mut arabic = 0usize;
        let mut letters = 0usize;

        for c in text.chars() {
            if !c.is_alphabetic() {
                continue;
            }
            letters += 1;
            if Self::is_hebrew_char(c) {
                hebrew += 1;
            } else if Self::is_arabic_char(c) {
                arabic += 1;
            }
        }

        if letters == 0 {
            return Script::Other;
        }

        if hebrew as f64 / letters as f64 > 0.3 {
            Script::Hebrew
        } else if arabic as f64 / letters as f64 > 0.3 {
            Script::Arabic
        } else {
            Script::Other
        }
    }

    pub fn is_rtl(text: &str) -> bool {
        matches!(Self::detect(text), Script::Hebrew | Script::Arabic)
    }

    fn is_hebrew_char(c: char) -> bool {
        // Hebrew: U+0590–U+05FF
        matches!(c, '\u{0590}'..='\u{05FF}')
    }

    fn is_arabic_char(c: char) -> bool {
        // Arabic: U+0600–U+06FF
        // Arabic Supplement: U+0750–U+077F
        // Arabic Extended-A: U+08A0–U+08FF
        matches!(c,
            '\u{0600}'..='\u{06FF}' |
            '\u{0750}'..='\u{077F}' |
            '\u{08A0}'..='\u{08FF}'
        )
    }
}

/// Short display tag for a detected script.
pub fn language_tag(script: Script) -> &'static str {
    match script {
        Script::Hebrew => "he",
        Script::Arabic => "ar",
        Script::Other => "en",
    }
}

/// Wrap RTL lines of a text in RLI/PDI isolates for terminal display.
/// LTR text is returned unchanged.
pub fn format_bidi(text: &str) -> String {
    if !LanguageDetector::is_rtl(text) {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{RLI}{line}{PDI}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text as RTL regardless of detection. For known-Hebrew fields such
/// as sender names.
pub fn force_rtl(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("{RLI}{text}{PDI}")
}

/// Wrap text as LTR regardless of detection. Keeps digits and codes
/// rendering correctly inside an RTL context.
pub fn force_ltr(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("{LRI}{text}{PDI}")
}
