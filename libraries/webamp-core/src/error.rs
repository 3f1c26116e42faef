/// Core error types for WebAmp
use crate::types::Provider;
use thiserror::Error;

/// A track's external reference could not be turned into a playable id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Provider has no resolution strategy yet
    #[error("{0} playback is not implemented")]
    UnsupportedProvider(Provider),

    /// Reference is not a parseable URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parsed but matches none of the provider's known formats
    #[error("Unrecognized {provider} URL: {url}")]
    UnrecognizedFormat {
        /// Provider the reference was resolved for
        provider: Provider,
        /// The offending reference
        url: String,
    },
}
