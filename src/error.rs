/// Error type for gateway operations
/// Implements Clone so outcomes can be logged and carried forward
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error
{   /// API key (or endpoint) is missing for a provider
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// Transport-level failure talking to a provider
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// Provider answered with a non-success status
    #[error("API error: {0}")]
    ApiError(String)
  , /// Failed to parse a provider or model response
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// Provider response carried no usable text
    #[error("API response contained no choices")]
    NoChoicesInResponse
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Provider call exceeded its time budget
    #[error("Request timed out")]
    Timeout
  , /// Every provider was skipped or failed
    #[error("All AI providers exhausted; last reason: {last_reason}")]
    AllProvidersExhausted
    {   last_reason: String
    }
  , /// Record not found in the store
    #[error("Not found: {0}")]
    NotFound(String)
  , /// Request body failed validation
    #[error("Validation error: {0}")]
    Validation(String)
  , /// Generic error
    #[error("Error: {0}")]
    Other(String)
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}
