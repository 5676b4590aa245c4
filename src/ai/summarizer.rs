//! Narrative summary of a profile.
//!
//! The prompt is a bounded text projection of the profile, so its size does
//! not grow with the dataset. A single generator call is made per run, under
//! a timeout, and any failure yields no narrative.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::analyser::logic::types::{Narrative, Profile};
use crate::config::AIConfig;
use crate::utils::{fmt_f64, truncate_chars};

use super::client::{OpenAiGenerator, TextGenerator};

const NUMERIC_SECTION_LIMIT: usize = 1500;
const CORRELATION_SECTION_LIMIT: usize = 500;
const PROMPT_LIMIT: usize = 4000;
const CORRELATION_PAIRS: usize = 5;
const TOP_VALUES_IN_PROMPT: usize = 3;

pub struct InsightSummarizer {
    config: AIConfig,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl InsightSummarizer {
    /// Summarizer backed by the OpenAI client when the settings allow it.
    pub fn from_config(config: AIConfig) -> Self {
        let generator = if config.is_active() {
            match OpenAiGenerator::new(config.clone()) {
                Ok(g) => Some(Arc::new(g) as Arc<dyn TextGenerator>),
                Err(e) => {
                    tracing::warn!("AI client setup failed: {e:#}");
                    None
                }
            }
        } else {
            None
        };
        Self { config, generator }
    }

    pub fn with_generator(config: AIConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            generator: Some(generator),
        }
    }

    /// Produces a narrative, or `None` when the feature is off or the call fails.
    pub async fn summarize(&self, profile: &Profile) -> Option<Narrative> {
        if !self.config.enabled {
            tracing::info!("AI summary skipped: optional feature disabled");
            return None;
        }
        if !self.config.has_credential() {
            tracing::info!("AI summary skipped: no API key configured");
            return None;
        }
        let generator = self.generator.as_ref()?;

        let prompt = build_prompt(profile);
        tracing::debug!(chars = prompt.chars().count(), model = %self.config.model, "Requesting AI summary");

        match tokio::time::timeout(self.config.timeout, generator.generate(&prompt)).await {
            Ok(Ok(text)) => {
                let narrative = Narrative::new(text);
                if narrative.is_none() {
                    tracing::warn!("AI summary failed: empty response");
                }
                narrative
            }
            Ok(Err(e)) => {
                tracing::warn!("AI summary failed: {e:#}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "AI summary failed: request timed out"
                );
                None
            }
        }
    }
}

/// Bounded text projection of the profile sent to the generator.
pub fn build_prompt(profile: &Profile) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Below is a statistical summary of a dataset. Based on it:\n\
1) Summarize the data in 2-3 sentences.\n\
2) Briefly note anything notable (outliers, distribution, missing data).\n\
3) Give 1-2 practical recommendations for analysis or business intelligence.\n\n\
Respond in English only, concisely (at most 6-7 sentences). No headings, just a short paragraph.\n\n",
    );

    prompt.push_str("DATA SUMMARY:\n");
    writeln!(prompt, "- Row count: {}", profile.row_count).ok();
    writeln!(prompt, "- Column count: {}", profile.column_count).ok();
    writeln!(
        prompt,
        "- Numeric columns: {}",
        profile.numeric_columns.join(", ")
    )
    .ok();
    writeln!(
        prompt,
        "- Categorical columns: {}",
        profile.categorical_columns.join(", ")
    )
    .ok();
    if profile.has_missing() {
        let missing: Vec<String> = profile
            .missing_by_column
            .iter()
            .map(|(c, n)| format!("{c}={n}"))
            .collect();
        writeln!(prompt, "- Missing values: {}", missing.join(", ")).ok();
    } else {
        prompt.push_str("- Missing values: none\n");
    }

    let numeric = numeric_section(profile);
    if !numeric.is_empty() {
        prompt.push_str("\nNumeric statistics:\n");
        prompt.push_str(truncate_chars(&numeric, NUMERIC_SECTION_LIMIT));
        prompt.push('\n');
    }

    let categorical = categorical_section(profile);
    if !categorical.is_empty() {
        prompt.push_str("\nMost frequent values:\n");
        prompt.push_str(&categorical);
    }

    let correlations = correlation_section(profile);
    if !correlations.is_empty() {
        prompt.push_str("\nCorrelation (summary):\n");
        prompt.push_str(truncate_chars(&correlations, CORRELATION_SECTION_LIMIT));
        prompt.push('\n');
    }

    truncate_chars(&prompt, PROMPT_LIMIT).to_owned()
}

fn numeric_section(profile: &Profile) -> String {
    let mut out = String::new();
    for s in &profile.numeric_stats {
        writeln!(
            out,
            "{}: count={} mean={} std={} min={} median={} max={}",
            s.column,
            s.count,
            fmt_f64(s.mean),
            fmt_f64(s.std),
            fmt_f64(s.min),
            fmt_f64(s.median),
            fmt_f64(s.max)
        )
        .ok();
    }
    out
}

fn categorical_section(profile: &Profile) -> String {
    let mut out = String::new();
    for s in &profile.categorical_stats {
        let top: Vec<String> = s
            .top_values
            .iter()
            .take(TOP_VALUES_IN_PROMPT)
            .map(|v| format!("{} ({})", v.value, v.count))
            .collect();
        writeln!(
            out,
            "{}: {} unique; {}",
            s.column,
            s.unique_count,
            top.join(", ")
        )
        .ok();
    }
    // Same budget as the numeric block so wide categorical data stays bounded
    truncate_chars(&out, NUMERIC_SECTION_LIMIT).to_owned()
}

fn correlation_section(profile: &Profile) -> String {
    let mut out = String::new();
    for (a, b, r) in profile.correlation_matrix.strongest_pairs(CORRELATION_PAIRS) {
        writeln!(out, "{a} ~ {b}: {r:.2}").ok();
    }
    out
}
