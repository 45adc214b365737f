use crate::classifier::Category;
use crate::language::{self, LanguageDetector};
use crate::monitor::MessageReport;
use crate::otp::OtpCandidate;
use chrono::Local;

/// Render one enriched message in full, as the monitor emits it.
pub fn render_report(report: &MessageReport, highlight_threshold: f64) {
    let msg = &report.message;
    let timestamp = msg
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");

    let script = LanguageDetector::detect(&msg.body);
    let address = if LanguageDetector::is_rtl(&msg.address) {
        language::force_rtl(&msg.address)
    } else {
        msg.address.clone()
    };
    let label = match report.source_label.as_deref() {
        Some(label) => format!(" ({label})"),
        None => String::new(),
    };

    println!();
    println!(
        "{timestamp}  {address}{label}  [{}]",
        language::language_tag(script)
    );
    println!("----- {} -----", msg.direction.label());
    println!("{}", language::format_bidi(&msg.body));

    if report.classification.category != Category::Unknown {
        let summary = if report.classification.summary.is_empty() {
            String::new()
        } else {
            format!(" {}", report.classification.summary)
        };
        println!(
            "  [{}]{summary} ({:.0}%)",
            report.classification.category.label(),
            report.classification.confidence * 100.0
        );
    }

    if let Some(otp) = &report.otp {
        render_otp(otp, highlight_threshold);
    } else if let Some(code) = &report.classification.detected_code {
        // The remote classifier caught a code the pattern engine missed.
        println!("  >>> OTP (remote): {}", language::force_ltr(code));
    }
}

/// Compact one-line form used by list mode.
pub fn render_compact(report: &MessageReport) {
    let msg = &report.message;
    let timestamp = msg.timestamp.with_timezone(&Local).format("%m-%d %H:%M");

    let category = match report.classification.category {
        Category::Unknown => "-".to_string(),
        category => category.label().to_string(),
    };

    let otp = match (&report.otp, &report.classification.detected_code) {
        (Some(otp), _) => format!("  OTP {}", language::force_ltr(&otp.code)),
        (None, Some(code)) => format!("  OTP {} (remote)", language::force_ltr(code)),
        (None, None) => String::new(),
    };

    let label = match report.source_label.as_deref() {
        Some(label) => format!(" ({label})"),
        None => String::new(),
    };

    println!(
        "{timestamp}  {:<20} [{category}]{otp}  {}{label}",
        truncate(&msg.address, 20),
        language::format_bidi(&truncate(&msg.body, 100)),
    );
}

fn render_otp(otp: &OtpCandidate, highlight_threshold: f64) {
    // Codes render LTR even inside RTL output.
    let code = language::force_ltr(&otp.code);
    let marker = if otp.confidence >= highlight_threshold {
        ">>>"
    } else {
        "  >"
    };
    println!(
        "  {marker} OTP: {code}  (confidence: {:.0}%, {})",
        otp.confidence * 100.0,
        otp.pattern
    );
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
