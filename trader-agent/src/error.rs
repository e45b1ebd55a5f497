use thiserror::Error;

/// Failures the pipeline reports to its caller. Parse problems never show
/// up here; they are recovered inside the pipeline.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Search failed: {0:#}")]
    Search(anyhow::Error),

    #[error("Generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("Trade history is empty")]
    EmptyHistory,
}

impl AgentError {
    /// True for failures of an external collaborator (search or model)
    pub fn is_external(&self) -> bool {
        matches!(self, AgentError::Search(_) | AgentError::Generation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_messages_include_cause_chain() {
        let err = AgentError::Search(anyhow!("connection refused").context("Qdrant search failed"));
        assert_eq!(err.to_string(), "Search failed: Qdrant search failed: connection refused");
        assert!(err.is_external());
        assert!(!AgentError::EmptyHistory.is_external());
    }
}
