//! Significance filtering: prompt, decoding parameters and output handling.
//!
//! The filter itself is a single text-generation call. Everything around it
//! (how titles are joined, how the reply is cleaned up and what counts as "no
//! significant events") is pure and lives here.

use std::fmt;

/// Instructions sent with every filter request.
///
/// The two examples fix the selection policy: milestones, self-care and
/// noticeable changes are kept, routine chores and lectures are dropped.
pub const SIGNIFICANCE_PROMPT: &str = "Analyse the following list of calendar event names and identify which events are thoughtful to mention in conversation. Prioritise events that suggest personal milestones, self-care, noticeable changes, or moments of significance. Exclude overly routine and generic activities unless they indicate something special or unique. If all events are routine and none fit the criteria, respond with \"None\". Only output a concise list of the identified events.

Example Input: Haircut, Lecture 1, Do washing, Lecture 2
Example Output: Haircut

Example Input: Do washing, Grocery shopping, Lecture 1
Example Output: None";

/// Sampling temperature for filter requests.
pub const TEMPERATURE: f32 = 0.2;

/// Nucleus sampling mass for filter requests.
pub const TOP_P: f32 = 0.1;

/// Upper bound on the length of a failure description, in characters.
pub const MAX_ERROR_CHARS: usize = 1024;

/// Reply meaning "nothing worth a reminder".
const NONE_REPLY: &str = "none";

/// Joins event titles into the filter input.
///
/// Titles are passed through verbatim and separated by a bare comma.
pub fn join_titles<S: AsRef<str>>(titles: &[S]) -> String {
    titles
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

/// Outcome of a filter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    /// Raw text produced by the backend.
    Output(String),
    /// The call failed; holds a truncated description of why.
    Failed(String),
}

impl FilterResult {
    /// Builds a failure result from any error, capped at
    /// [`MAX_ERROR_CHARS`] characters.
    pub fn failed(cause: impl fmt::Display) -> Self {
        let message = format!("Error extracting events: {cause}");
        Self::Failed(truncate_chars(&message, MAX_ERROR_CHARS))
    }

    /// The underlying text, whether output or failure description.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Output(text) | Self::Failed(text) => text,
        }
    }

    /// Returns true if the backend call failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Classifies the result for the orchestrator.
    pub fn verdict(&self) -> Verdict {
        let text = match self {
            Self::Failed(_) => return Verdict::Unusable,
            Self::Output(text) => normalize_output(text),
        };

        if text.is_empty() {
            Verdict::Unusable
        } else if text.eq_ignore_ascii_case(NONE_REPLY) {
            Verdict::NoneSignificant
        } else {
            Verdict::Significant(text)
        }
    }
}

impl fmt::Display for FilterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the orchestrator should do with a filter result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Failed call or empty reply.
    Unusable,
    /// The model said none of the events matter.
    NoneSignificant,
    /// Normalized list of events worth a reminder.
    Significant(String),
}

/// Strips double quotes anywhere in the reply and trims whitespace.
pub fn normalize_output(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Truncates to at most `max` characters without splitting a code point.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
