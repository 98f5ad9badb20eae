//! Prompt template for trend reports.
//!
//! A template is plain text with two placeholders, `{query}` and
//! `{context}`. Retrieved units are "stuffed" into `{context}` separated
//! by blank lines.

use anyhow::{bail, Result};

use crate::index::RetrievedUnit;

pub const DEFAULT_TEMPLATE: &str = "\
You are a witty data oracle. Using the provided meme contexts and analytics knowledge, generate a fun, insightful report on the query: {query}.
Include:
1) Top 3 trends with virality scores.
2) Predictive forecast (e.g., \"This meme wave predicts SQL's comeback\").
3) A generated counter-meme idea.
Retrieved Contexts: {context}
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Fails unless both `{query}` and `{context}` appear in `template`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in ["{query}", "{context}"] {
            if !template.contains(placeholder) {
                bail!("prompt template is missing the {} placeholder", placeholder);
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `query` and the joined unit texts.
    pub fn render(&self, query: &str, context: &[RetrievedUnit]) -> String {
        let context = context
            .iter()
            .map(|hit| hit.unit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        // single pass: placeholder text inside the query or a meme stays literal
        let mut out = String::with_capacity(self.template.len() + query.len() + context.len());
        let mut rest = self.template.as_str();
        loop {
            let next = [("{query}", query), ("{context}", context.as_str())]
                .into_iter()
                .filter_map(|(p, v)| rest.find(p).map(|at| (at, p, v)))
                .min_by_key(|(at, _, _)| *at);
            match next {
                Some((at, placeholder, value)) => {
                    out.push_str(&rest[..at]);
                    out.push_str(value);
                    rest = &rest[at + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}
