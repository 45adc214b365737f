use crate::otp::OtpCandidate;

/// Message category taxonomy. `Unknown` doubles as the "no signal" result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Unknown,
    Otp,
    Marketing,
    Personal,
    Financial,
    Delivery,
    Urgent,
    Spam,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Unknown => "UNKNOWN",
            Category::Otp => "OTP",
            Category::Marketing => "MARKETING",
            Category::Personal => "PERSONAL",
            Category::Financial => "FINANCIAL",
            Category::Delivery => "DELIVERY",
            Category::Urgent => "URGENT",
            Category::Spam => "SPAM",
        }
    }

    /// Map a remote classifier's category string. Unknown strings map to
    /// `Unknown` rather than erroring.
    pub fn from_remote(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "otp" => Category::Otp,
            "marketing" => Category::Marketing,
            "personal" => Category::Personal,
            "financial" => Category::Financial,
            "delivery" => Category::Delivery,
            "urgent" => Category::Urgent,
            "spam" => Category::Spam,
            _ => Category::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub summary: String,
    pub confidence: f64,
    /// Present only when the remote classifier found an OTP the pattern
    /// engine missed.
    pub detected_code: Option<String>,
}

impl Classification {
    pub fn new(category: Category, summary: &str, confidence: f64) -> Self {
        Classification {
            category,
            summary: summary.to_string(),
            confidence,
            detected_code: None,
        }
    }
}

// Keyword sets, English + Hebrew. Tried in the order given in `classify`;
// first matching set wins.
const SPAM_KEYWORDS: &[&str] = &["winner", "won", "lottery", "claim your", "free money", "זכית"];

const URGENT_KEYWORDS: &[&str] = &["urgent", "immediate", "alert", "warning", "דחוף", "אזהרה"];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "transaction",
    "debited",
    "credited",
    "payment",
    "balance",
    "עסקה",
    "תשלום",
    "חיוב",
];

const DELIVERY_KEYWORDS: &[&str] = &[
    "shipped",
    "delivered",
    "tracking",
    "package",
    "courier",
    "משלוח",
    "חבילה",
];

const MARKETING_KEYWORDS: &[&str] = &[
    "sale",
    "offer",
    "discount",
    "unsubscribe",
    "promo",
    "deal",
    "coupon",
    "הנחה",
    "מבצע",
];

/// Local keyword classifier.
///
/// A confident OTP candidate short-circuits everything: the message is an
/// OTP message no matter what else the body says. Otherwise the keyword
/// sets are tried in priority order (spam > urgent > financial > delivery
/// > marketing) against both the lower-cased and the original body; the
/// latter catches scripts that do not case-fold.
pub fn classify(body: &str, otp: Option<&OtpCandidate>) -> Classification {
    if let Some(otp) = otp {
        if otp.confidence >= 0.7 {
            return Classification::new(
                Category::Otp,
                &format!("OTP code: {}", otp.code),
                otp.confidence,
            );
        }
    }

    let lower = body.to_lowercase();

    if matches_any(&lower, body, SPAM_KEYWORDS) {
        return Classification::new(Category::Spam, "Suspected spam", 0.6);
    }
    if matches_any(&lower, body, URGENT_KEYWORDS) {
        return Classification::new(Category::Urgent, "Urgent message", 0.6);
    }
    if matches_any(&lower, body, FINANCIAL_KEYWORDS) {
        return Classification::new(Category::Financial, "Financial notification", 0.6);
    }
    if matches_any(&lower, body, DELIVERY_KEYWORDS) {
        return Classification::new(Category::Delivery, "Delivery update", 0.6);
    }
    if matches_any(&lower, body, MARKETING_KEYWORDS) {
        return Classification::new(Category::Marketing, "Marketing message", 0.6);
    }

    Classification::new(Category::Unknown, "", 0.3)
}

fn matches_any(lower_body: &str, original_body: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|kw| lower_body.contains(kw) || original_body.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn otp_candidate(confidence: f64) -> OtpCandidate {
        OtpCandidate {
            message_id: 1,
            code: "482913".to_string(),
            confidence,
            pattern: "Labeled OTP 6-digit",
        }
    }

    #[test]
    fn test_confident_otp_short_circuits() {
        // Body full of marketing words, but the OTP candidate wins.
        let result = classify(
            "Huge sale! Use discount code 482913",
            Some(&otp_candidate(0.95)),
        );

        assert_eq!(result.category, Category::Otp);
        assert_eq!(result.summary, "OTP code: 482913");
        assert!((result.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weak_otp_does_not_short_circuit() {
        let result = classify("Huge sale! code 482913", Some(&otp_candidate(0.5)));
        assert_eq!(result.category, Category::Marketing);
    }

    #[test]
    fn test_priority_order_spam_over_marketing() {
        // Contains both spam and marketing vocabulary; spam is tested first.
        let result = classify("You are a winner! Claim your discount now", None);
        assert_eq!(result.category, Category::Spam);
        assert_eq!(result.summary, "Suspected spam");
    }

    #[test]
    fn test_financial_over_delivery() {
        let result = classify("Payment received for your package", None);
        assert_eq!(result.category, Category::Financial);
    }

    #[test]
    fn test_case_insensitive_match() {
        let result = classify("URGENT: account verification required", None);
        assert_eq!(result.category, Category::Urgent);
    }

    #[test]
    fn test_hebrew_keywords_match_original_body() {
        let result = classify("חבילה ממתינה לך בסניף", None);
        assert_eq!(result.category, Category::Delivery);
    }

    #[test]
    fn test_no_match_is_unknown() {
        let result = classify("see you at dinner", None);
        assert_eq!(result.category, Category::Unknown);
        assert!(result.summary.is_empty());
        assert!((result.confidence - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remote_category_mapping() {
        assert_eq!(Category::from_remote("otp"), Category::Otp);
        assert_eq!(Category::from_remote("SPAM"), Category::Spam);
        assert_eq!(Category::from_remote("delivery"), Category::Delivery);
        assert_eq!(Category::from_remote("nonsense"), Category::Unknown);
        assert_eq!(Category::from_remote(""), Category::Unknown);
    }
}
