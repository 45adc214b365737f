use crate::classifier::{self, Category, Classification};
use crate::config::ClassifierConfig;
use crate::otp::OtpCandidate;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Two-tier classifier: local keyword heuristics, escalated per message to
/// a remote LLM when the cost gate allows it. Remote failures of any kind
/// fall back silently to the heuristic on the original inputs.
pub struct ClassifierAgent {
    settings: ClassifierConfig,
    client: Option<reqwest::Client>,
}

/// Structured reply the remote model is instructed to produce.
#[derive(Debug, Deserialize)]
struct RemoteReply {
    category: String,
    #[serde(default)]
    summary: String,
    confidence: f64,
    #[serde(default)]
    otp: Option<String>,
}

impl ClassifierAgent {
    pub fn new(settings: ClassifierConfig) -> Self {
        let enabled = settings.enabled && !settings.api_key.trim().is_empty();
        let client = if enabled {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .user_agent(concat!("sms-sentinel/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| log::warn!("failed to build HTTP client, remote classification disabled: {e}"))
                .ok()
        } else {
            None
        };

        ClassifierAgent { settings, client }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub async fn classify(
        &self,
        body: &str,
        sender: &str,
        otp: Option<&OtpCandidate>,
    ) -> Classification {
        if !self.should_escalate(body, otp) {
            return classifier::classify(body, otp);
        }

        match self.call_remote(body, sender, otp).await {
            Ok(result) => result,
            Err(e) => {
                // Reclassify the original body so the keyword signal is
                // not lost; the failure stays a diagnostic.
                log::debug!("remote classification failed, using heuristic: {e:#}");
                classifier::classify(body, otp)
            }
        }
    }

    /// Cost gate. A high-confidence regex OTP needs no semantic help, and
    /// very short bodies are not worth the round-trip.
    fn should_escalate(&self, body: &str, otp: Option<&OtpCandidate>) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if matches!(otp, Some(otp) if otp.confidence >= 0.9) {
            return false;
        }
        if body.chars().count() < 10 {
            return false;
        }
        true
    }

    async fn call_remote(
        &self,
        body: &str,
        sender: &str,
        otp: Option<&OtpCandidate>,
    ) -> Result<Classification> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| anyhow!("remote classifier not configured"))?;

        let request = serde_json::json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": [{ "role": "user", "content": build_prompt(body, sender, otp) }],
        });

        let response = client
            .post(API_URL)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("classification request failed")?
            .error_for_status()
            .context("classification request rejected")?;

        let reply: serde_json::Value = response.json().await?;
        let text = reply["content"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("reply has no text content"))?;

        parse_reply(text)
    }
}

fn build_prompt(body: &str, sender: &str, otp: Option<&OtpCandidate>) -> String {
    let otp_hint = match otp {
        Some(otp) => format!(
            "\nRegex already extracted OTP: {} (confidence: {:.0}%)",
            otp.code,
            otp.confidence * 100.0
        ),
        None => String::new(),
    };

    format!(
        "Classify this SMS. Respond with ONLY a JSON object, no markdown.\n\
         {{\"category\":\"<otp|marketing|personal|financial|delivery|urgent|spam>\",\
         \"summary\":\"<1-line summary in the message's language>\",\
         \"confidence\":<0.0-1.0>,\"otp\":\"<code or null>\"}}\n\n\
         From: {sender}{otp_hint}\nMessage: {body}"
    )
}

/// Parse the model's reply text. The instruction says "no markdown" but
/// replies still arrive fenced often enough that we always cut the text
/// down to the outermost braces before parsing.
fn parse_reply(text: &str) -> Result<Classification> {
    let start = text.find('{').ok_or_else(|| anyhow!("no JSON object in reply"))?;
    let end = text.rfind('}').ok_or_else(|| anyhow!("no JSON object in reply"))?;
    if end < start {
        return Err(anyhow!("no JSON object in reply"));
    }

    let reply: RemoteReply =
        serde_json::from_str(&text[start..=end]).context("malformed classification reply")?;

    let detected_code = reply
        .otp
        .filter(|code| !code.trim().is_empty() && code != "null");

    Ok(Classification {
        category: Category::from_remote(&reply.category),
        summary: reply.summary,
        confidence: reply.confidence,
        detected_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(enabled: bool, api_key: &str) -> ClassifierAgent {
        ClassifierAgent::new(ClassifierConfig {
            enabled,
            api_key: api_key.to_string(),
            ..Default::default()
        })
    }

    fn otp_candidate(confidence: f64) -> OtpCandidate {
        OtpCandidate {
            message_id: 1,
            code: "482913".to_string(),
            confidence,
            pattern: "Labeled OTP 6-digit",
        }
    }

    #[test]
    fn test_disabled_without_api_key() {
        assert!(!agent(true, "").is_enabled());
        assert!(!agent(true, "   ").is_enabled());
        assert!(!agent(false, "sk-ant-xxx").is_enabled());
        assert!(agent(true, "sk-ant-xxx").is_enabled());
    }

    #[test]
    fn test_gate_never_escalates_confident_otp() {
        let agent = agent(true, "sk-ant-xxx");
        let otp = otp_candidate(0.9);
        assert!(!agent.should_escalate("Your code is 482913 for login", Some(&otp)));

        // Just below the threshold it would escalate.
        let weak = otp_candidate(0.89);
        assert!(agent.should_escalate("Your code is 482913 for login", Some(&weak)));
    }

    #[test]
    fn test_gate_never_escalates_short_bodies() {
        let agent = agent(true, "sk-ant-xxx");
        assert!(!agent.should_escalate("hi there", None));
        assert!(agent.should_escalate("hello there!", None));
    }

    #[test]
    fn test_gate_requires_configuration() {
        let agent = agent(true, "");
        assert!(!agent.should_escalate("a perfectly classifiable message", None));
    }

    #[test]
    fn test_parse_bare_reply() {
        let result = parse_reply(
            r#"{"category":"financial","summary":"Card charged","confidence":0.8,"otp":null}"#,
        )
        .unwrap();

        assert_eq!(result.category, Category::Financial);
        assert_eq!(result.summary, "Card charged");
        assert!((result.confidence - 0.8).abs() < f64::EPSILON);
        assert!(result.detected_code.is_none());
    }

    #[test]
    fn test_parse_fenced_reply() {
        let text = "```json\n{\"category\":\"otp\",\"summary\":\"Login code\",\"confidence\":0.9,\"otp\":\"57391\"}\n```";
        let result = parse_reply(text).unwrap();

        assert_eq!(result.category, Category::Otp);
        assert_eq!(result.detected_code.as_deref(), Some("57391"));
    }

    #[test]
    fn test_parse_unknown_category_maps_to_unknown() {
        let result = parse_reply(
            r#"{"category":"greeting","summary":"Hi","confidence":0.5,"otp":null}"#,
        )
        .unwrap();
        assert_eq!(result.category, Category::Unknown);
    }

    #[test]
    fn test_parse_literal_null_string_otp_dropped() {
        let result = parse_reply(
            r#"{"category":"personal","summary":"Chat","confidence":0.7,"otp":"null"}"#,
        )
        .unwrap();
        assert!(result.detected_code.is_none());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_reply("I could not classify this message.").is_err());
        assert!(parse_reply("{not json}").is_err());
    }

    #[test]
    fn test_prompt_embeds_hint_and_sender() {
        let otp = otp_candidate(0.85);
        let prompt = build_prompt("Your code is 482913", "BANK", Some(&otp));

        assert!(prompt.contains("From: BANK"));
        assert!(prompt.contains("482913 (confidence: 85%)"));
        assert!(prompt.contains("Message: Your code is 482913"));

        let bare = build_prompt("hello", "MOM", None);
        assert!(!bare.contains("Regex already extracted"));
    }
}
