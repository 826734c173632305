//! Generative text providers

use std::future::Future;

pub mod gemini;

// Re-export for convenience
pub use gemini::GeminiProvider;

/// A generative-text service able to honour a response schema.
///
/// One call is one network request; implementations never retry.
/// Any rejection (transport, status, quota) comes back as
/// [`crate::error::Error::ProviderError`] with its message intact.
pub trait Provider: Send + Sync
{   fn generate_content(
      &self
    , request: crate::request::ProviderRequest<'_>
    ) -> impl Future<
        Output = Result<crate::request::RawModelResponse, crate::error::Error>
      > + Send;
}
