use thiserror::Error;

/// Fatal conditions surfaced to the operator. None of these are retried.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("dispatch of variant {index} ({tag}) failed")]
    Dispatch {
        index: usize,
        tag: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("evaluation of skill {skill} failed")]
    Evaluation {
        skill: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl HarnessError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        HarnessError::Configuration {
            reason: reason.into(),
        }
    }
}
