use async_trait::async_trait;

/// Upper bound on returned tag suggestions.
pub const MAX_TAGS: usize = 5;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SuggestError {
    #[error("network error: {0}")]
    Network(String),

    #[error("suggestion API returned status {status}")]
    Api { status: u16 },

    #[error("malformed suggestion response: {0}")]
    Malformed(String),
}

impl SuggestError {
    /// Transient failures worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status } => *status == 429 || *status >= 500,
            Self::Malformed(_) => false,
        }
    }
}

/// Best-effort tag suggestion from free-text notes. Callers treat every
/// failure shape the same way; none may abort a surrounding save.
#[async_trait]
pub trait TagSuggester: Send + Sync {
    async fn suggest(&self, notes: &str) -> Result<Vec<String>, SuggestError>;
}

/// Trim suggestions, drop empties, cap at `MAX_TAGS`.
pub fn clean_tags(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_tags_trims_and_caps() {
        let raw = vec![
            " hot ".to_string(),
            "nri".to_string(),
            "   ".to_string(),
            "urgent".to_string(),
            "corner-plot".to_string(),
            "investor".to_string(),
            "sixth".to_string(),
        ];
        let tags = clean_tags(raw);
        assert_eq!(tags, vec!["hot", "nri", "urgent", "corner-plot", "investor"]);
        assert_eq!(tags.len(), MAX_TAGS);
    }

    #[test]
    fn clean_tags_empty_input() {
        assert!(clean_tags(Vec::new()).is_empty());
        assert!(clean_tags(vec!["  ".into(), String::new()]).is_empty());
    }

    #[test]
    fn retryable_classification() {
        assert!(SuggestError::Network("timeout".into()).is_retryable());
        assert!(SuggestError::Api { status: 429 }.is_retryable());
        assert!(SuggestError::Api { status: 503 }.is_retryable());
        assert!(!SuggestError::Api { status: 401 }.is_retryable());
        assert!(!SuggestError::Malformed("not json".into()).is_retryable());
    }
}
