use crate::message::SmsMessage;
use anyhow::Result;
use regex::Regex;

/// An extracted one-time passcode candidate. At most one is produced per
/// message: the pattern table is tried in priority order and the first
/// match wins, regardless of base confidence further down the table.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpCandidate {
    /// Id of the message the code was extracted from.
    pub message_id: i64,
    pub code: String,
    /// Adjusted confidence, clamped to [0.1, 1.0].
    pub confidence: f64,
    /// Name of the matching pattern, for display and diagnostics only.
    pub pattern: &'static str,
}

/// Ordered rule table: (name, pattern, base confidence). Order is the
/// priority order; do not sort or reorder.
///
/// The label connector tolerates an intervening "is" so that bodies like
/// "Your OTP code is 482913" hit the labeled rule rather than the weaker
/// is-pattern further down.
const OTP_PATTERNS: [(&str, &str, f64); 11] = [
    // Explicit OTP/code/PIN labels followed by digits (English + Hebrew)
    (
        "Labeled OTP 6-digit",
        r"(?i)(?:otp|code|pin|passcode|קוד|סיסמה)[\s:-]*(?:is[\s:-]+)?(\d{6})\b",
        0.95,
    ),
    (
        "Labeled OTP 4-digit",
        r"(?i)(?:otp|code|pin|passcode|קוד|סיסמה)[\s:-]*(?:is[\s:-]+)?(\d{4})\b",
        0.90,
    ),
    (
        "Labeled OTP 8-digit",
        r"(?i)(?:otp|code|pin|passcode|קוד|סיסמה)[\s:-]*(?:is[\s:-]+)?(\d{8})\b",
        0.90,
    ),
    // Hebrew verification phrasing, e.g. "קוד האימות לשירות 192837"
    ("Hebrew OTP 6-digit", r"קוד[\s\p{L}]*\s(\d{6})\b", 0.90),
    ("Hebrew OTP 4-digit", r"קוד[\s\p{L}]*\s(\d{4})\b", 0.85),
    // "is <digits>", e.g. "Your verification number is 123456"
    ("Is-pattern 6-digit", r"\bis\s+(\d{6})\b", 0.85),
    ("Is-pattern 4-digit", r"\bis\s+(\d{4})\b", 0.80),
    // Digits followed by a label, e.g. "Use 482913 as your code"
    ("Postfix label 6-digit", r"\b(\d{6})\s+(?:is your|as your)", 0.85),
    ("Postfix label 4-digit", r"\b(\d{4})\s+(?:is your|as your)", 0.80),
    // Uppercase alphanumeric codes, e.g. "code A1B2C3"
    (
        "Alphanumeric 6-char",
        r"(?:code|Code|CODE|OTP|otp)[\s:-]*(?:is\s+)?([A-Z0-9]{6})\b",
        0.75,
    ),
    // Bare 6-digit number anywhere in the body. Low confidence fallback.
    ("Standalone 6-digit", r"\b(\d{6})\b", 0.50),
];

/// Verification/authentication vocabulary in both supported languages.
const VERIFICATION_KEYWORDS: &str =
    r"(?i)verif|authent|confirm|login|sign.in|2fa|two.factor|otp|one.time|אימות|אישור";

/// A sender that is purely a phone number (optional leading +, digits).
const PHONE_SENDER: &str = r"^\+?\d+$";

pub struct OtpExtractor {
    patterns: Vec<(&'static str, Regex, f64)>,
    verification_re: Regex,
    phone_sender_re: Regex,
}

impl OtpExtractor {
    pub fn new() -> Result<Self> {
        let mut patterns = Vec::with_capacity(OTP_PATTERNS.len());
        for (name, pattern, base) in OTP_PATTERNS {
            patterns.push((name, Regex::new(pattern)?, base));
        }

        Ok(OtpExtractor {
            patterns,
            verification_re: Regex::new(VERIFICATION_KEYWORDS)?,
            phone_sender_re: Regex::new(PHONE_SENDER)?,
        })
    }

    /// Try the rule table in order and return the first match with its
    /// adjusted confidence, or `None` when no rule matches.
    pub fn extract(&self, message: &SmsMessage) -> Option<OtpCandidate> {
        for (name, regex, base_confidence) in &self.patterns {
            let captures = match regex.captures(&message.body) {
                Some(captures) => captures,
                None => continue,
            };
            let code = captures.get(1)?.as_str().to_string();

            let confidence = self.adjust_confidence(*base_confidence, message);

            return Some(OtpCandidate {
                message_id: message.id,
                code,
                confidence,
                pattern: name,
            });
        }

        None
    }

    /// Additive adjustments, applied in a fixed order, then clamped to
    /// [0.1, 1.0]:
    ///   +0.10  body mentions verification/authentication
    ///   +0.05  short body (< 160 chars), typical of automated senders
    ///   +0.05  sender is not a bare phone number (named service)
    ///   -0.15  very long body (> 300 chars), unlikely to be just an OTP
    fn adjust_confidence(&self, base: f64, message: &SmsMessage) -> f64 {
        let body_chars = message.body.chars().count();
        let mut confidence = base;

        if self.verification_re.is_match(&message.body) {
            confidence += 0.10;
        }
        if body_chars < 160 {
            confidence += 0.05;
        }
        if !self.phone_sender_re.is_match(&message.address) {
            confidence += 0.05;
        }
        if body_chars > 300 {
            confidence -= 0.15;
        }

        confidence.clamp(0.1, 1.0)
    }
}
