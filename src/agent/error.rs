use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The runtime failed the run. Not retried.
    #[error("Agent run failed: {message}")]
    Run { message: String },

    #[error("Invalid tool gateway URL: {0}")]
    Gateway(#[from] url::ParseError),
}
