use std::fmt;

/// Custom error type for report generation
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// No provider credential could be resolved
    MissingCredential
  , /// Provider did not answer within the configured timeout
    Timeout
  , /// Provider answered without any text payload
    EmptyResponse
  , /// No valid JSON could be recovered from the text
    MalformedResponse
  , /// Provider call rejected (transport, quota, bad request)
    ProviderError(String)
  , /// Decoded JSON does not fit the expected report shape
    ShapeMismatch
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Persistence collaborator failed
    Storage(String)
  , /// Generic error
    Other(String)
}

/// Fieldless classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind
{   MissingCredential
  , Timeout
  , EmptyResponse
  , MalformedResponse
  , ProviderError
  , ShapeMismatch
  , InvalidConfiguration
  , Storage
  , Other
}

impl Error
{   pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::MissingCredential => ErrorKind::MissingCredential
          , Error::Timeout => ErrorKind::Timeout
          , Error::EmptyResponse => ErrorKind::EmptyResponse
          , Error::MalformedResponse => ErrorKind::MalformedResponse
          , Error::ProviderError(_) => ErrorKind::ProviderError
          , Error::ShapeMismatch => ErrorKind::ShapeMismatch
          , Error::InvalidConfiguration(_)
              => ErrorKind::InvalidConfiguration
          , Error::Storage(_) => ErrorKind::Storage
          , Error::Other(_) => ErrorKind::Other
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingCredential => {
              write!(f, "Deployment Error: API Key is missing")
            }
          , Error::Timeout => {
              write!(f, "Request Timed Out")
            }
          , Error::EmptyResponse => {
              write!(f, "The model returned an empty response")
            }
          , Error::MalformedResponse => {
              write!(f,
                "The model response could not be read as a report"
              )
            }
          , Error::ProviderError(msg) => {
              write!(f, "Provider error: {}", msg)
            }
          , Error::ShapeMismatch => {
              write!(f,
                "The report did not match the expected structure"
              )
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Storage(msg) => {
              write!(f, "Storage error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

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
