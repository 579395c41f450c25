//! Mood analysis through the Gemini `generateContent` endpoint.
//!
//! Analysis is best-effort: every failure (transport, status, envelope shape,
//! model output) collapses into [`MoodAnalysis::fallback`] so the journal write
//! path never depends on the remote model being up.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;

pub const FALLBACK_MOOD_SCORE: i32 = 5;
pub const FALLBACK_SUMMARY: &str = "AI is taking a nap, but your entry is saved.";

const MIN_MOOD: i32 = 1;
const MAX_MOOD: i32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct MoodAnalysis {
    pub mood_score: i32,
    pub summary: String,
}

impl MoodAnalysis {
    pub fn fallback() -> Self {
        Self {
            mood_score: FALLBACK_MOOD_SCORE,
            summary: FALLBACK_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoodAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl MoodAnalyzer {
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Always yields a usable result.
    pub async fn analyze(&self, journal_text: &str) -> MoodAnalysis {
        if self.api_key.is_empty() {
            tracing::debug!("GEMINI_API_KEY not set, using fallback mood analysis");
            return MoodAnalysis::fallback();
        }

        match self.call_gemini(journal_text).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "Mood analysis failed, using fallback");
                MoodAnalysis::fallback()
            }
        }
    }

    async fn call_gemini(&self, journal_text: &str) -> Result<MoodAnalysis, anyhow::Error> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "contents": [{
                    "parts": [{ "text": build_prompt(journal_text) }]
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error {}: {}", status, body);
        }

        let envelope: Value = response.json().await?;
        let text = extract_candidate_text(&envelope)?;
        parse_analysis(text)
    }
}

pub fn build_prompt(journal_text: &str) -> String {
    format!(
        r#"Analyze this diary entry: "{}".
Return ONLY a valid JSON object (no markdown) with these fields:
- "mood_score": an integer from 1 (worst) to 10 (best).
- "summary": a 1-sentence summary of the user's day.
"#,
        journal_text
    )
}

/// Pulls `candidates[0].content.parts[0].text` out of a Gemini response.
pub fn extract_candidate_text(envelope: &Value) -> Result<&str, anyhow::Error> {
    let candidates = envelope["candidates"]
        .as_array()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| anyhow::anyhow!("AI response has no candidates"))?;

    candidates[0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("AI candidate has no text part"))
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Model output as it arrives; `mood_score` is not trusted to be an integer.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    mood_score: Value,
    summary: String,
}

/// A missing summary or non-JSON text is an error. A score that isn't an
/// integer becomes the neutral score while the summary is kept.
pub fn parse_analysis(text: &str) -> Result<MoodAnalysis, anyhow::Error> {
    let raw: RawAnalysis = serde_json::from_str(&strip_code_fences(text))?;

    let mood_score = match raw.mood_score.as_i64() {
        Some(score) => score.clamp(MIN_MOOD as i64, MAX_MOOD as i64) as i32,
        None => {
            tracing::warn!(mood_score = %raw.mood_score, "Non-integer mood score, using neutral score");
            FALLBACK_MOOD_SCORE
        }
    };

    Ok(MoodAnalysis {
        mood_score,
        summary: raw.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analyzer(api_key: &str, api_base: &str) -> MoodAnalyzer {
        MoodAnalyzer {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gemini-2.5-flash".into(),
            api_base: api_base.into(),
        }
    }

    #[test]
    fn test_prompt_embeds_journal_text() {
        let prompt = build_prompt("Went hiking today");
        assert!(prompt.contains("\"Went hiking today\""));
        assert!(prompt.contains("mood_score"));
        assert!(prompt.contains("summary"));
    }

    #[test]
    fn test_extract_candidate_text() {
        let envelope = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"mood_score\": 8, \"summary\": \"Good day.\"}" }] }
            }]
        });
        let text = extract_candidate_text(&envelope).unwrap();
        assert!(text.contains("mood_score"));
    }

    #[test]
    fn test_extract_rejects_missing_or_empty_candidates() {
        assert!(extract_candidate_text(&json!({})).is_err());
        assert!(extract_candidate_text(&json!({ "candidates": [] })).is_err());
        assert!(extract_candidate_text(&json!({ "candidates": [{ "content": {} }] })).is_err());
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "```json\n{\"mood_score\": 7, \"summary\": \"A calm day.\"}\n```";
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(
            analysis,
            MoodAnalysis {
                mood_score: 7,
                summary: "A calm day.".into()
            }
        );
    }

    #[test]
    fn test_parse_clamps_out_of_range_score() {
        let analysis = parse_analysis(r#"{"mood_score": 42, "summary": "Ecstatic."}"#).unwrap();
        assert_eq!(analysis.mood_score, 10);

        let analysis = parse_analysis(r#"{"mood_score": -3, "summary": "Awful."}"#).unwrap();
        assert_eq!(analysis.mood_score, 1);
    }

    #[test]
    fn test_parse_rejects_malformed_output() {
        assert!(parse_analysis("I think the mood is 7").is_err());
        assert!(parse_analysis(r#"{"mood_score": 6}"#).is_err());
        assert!(parse_analysis(r#"{"mood_score": 6, "summary": null}"#).is_err());
    }

    #[test]
    fn test_non_integer_score_keeps_summary() {
        let analysis =
            parse_analysis(r#"{"mood_score": "seven", "summary": "Quiet evening."}"#).unwrap();
        assert_eq!(analysis.mood_score, FALLBACK_MOOD_SCORE);
        assert_eq!(analysis.summary, "Quiet evening.");

        let analysis = parse_analysis(r#"{"mood_score": 6.5, "summary": "Mixed."}"#).unwrap();
        assert_eq!(analysis.mood_score, FALLBACK_MOOD_SCORE);

        let analysis = parse_analysis(r#"{"summary": "No score given."}"#).unwrap();
        assert_eq!(analysis.mood_score, FALLBACK_MOOD_SCORE);
        assert_eq!(analysis.summary, "No score given.");
    }

    #[tokio::test]
    async fn test_missing_api_key_falls_back() {
        let result = analyzer("", "http://127.0.0.1:9").analyze("hello").await;
        assert_eq!(result, MoodAnalysis::fallback());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let result = analyzer("test-key", "http://127.0.0.1:9").analyze("hello").await;
        assert_eq!(result.mood_score, FALLBACK_MOOD_SCORE);
        assert_eq!(result.summary, FALLBACK_SUMMARY);
    }
}
