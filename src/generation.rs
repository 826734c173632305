use serde::de::DeserializeOwned;
use serde_json::Value;
use log::{debug, trace, error, warn};

use crate::config::{ClientConfig, CredentialSource};
use crate::error::Error;
use crate::providers::Provider;
use crate::request::{GenerationRequest, ProviderRequest};

/// Stateless request/decode facade over one provider.
///
/// Every call resolves the credential, picks the model, sends one
/// request bounded by the configured timeout and decodes the JSON
/// recovered from the answer. Failures are classified and returned,
/// never retried.
pub struct StructuredGenerationClient<P>
{   provider: P
  , credential: CredentialSource
  , config: ClientConfig
}

impl StructuredGenerationClient<crate::providers::GeminiProvider>
{   /// Gemini client with the key read from the environment per call
    pub fn gemini(config: ClientConfig) -> Self
    {   let provider
          = crate::providers::GeminiProvider::from_config(&config);
        StructuredGenerationClient::new(
          provider,
          CredentialSource::default(),
          config
        )
    }
}

impl<P: Provider> StructuredGenerationClient<P>
{   pub fn new(
      provider: P
    , credential: CredentialSource
    , config: ClientConfig
    ) -> Self
    {   debug!(
          "Creating StructuredGenerationClient (fast: {}, thorough: {})",
          config.fast_model, config.thorough_model
        );
        StructuredGenerationClient
        {   provider
          , credential
          , config
        }
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn provider(&self) -> &P
    {   &self.provider
    }

    /// Generate and decode one structured response
    pub async fn generate<T: DeserializeOwned>(
      &self
    , request: GenerationRequest
    ) -> Result<T, Error>
    {   let api_key = self.credential.resolve()
          .ok_or_else(|| {
            error!("No provider credential configured");
            Error::MissingCredential
          })?;

        let model = self.config.model_for(request.quality);
        debug!("Generating with {} ({:?})", model, request.quality);

        let call = self.provider.generate_content(ProviderRequest
        {   api_key: &api_key
          , model
          , prompt: &request.prompt
          , response_schema: request.shape.to_schema()
        });

        let timeout = self.config.timeout();
        let response = match tokio::time::timeout(timeout, call).await
        {   Ok(result) => result?
          , Err(_) => {
              error!("Provider did not answer within {:?}", timeout);
              return Err(Error::Timeout);
            }
        };

        let text = match response.text
        {   Some(text) if !text.trim().is_empty() => text
          , _ => {
              error!("Empty response from {}", response.model);
              return Err(Error::EmptyResponse);
            }
        };
        trace!("Raw model text: {}", text);

        let recovered
          = crate::recovery::recover(&text, self.config.recovery);
        let value: Value = serde_json::from_str(&recovered)
          .map_err(|e| {
            error!("Recovered text is not JSON: {}", e);
            Error::MalformedResponse
          })?;

        if self.config.validate_shapes
        {   if let Err(violations) = request.shape.check(&value)
            {   for violation in &violations
                {   warn!("Shape violation: {}", violation);
                }
                return Err(Error::ShapeMismatch);
            }
        }

        serde_json::from_value(value).map_err(|e| {
          error!("Decoded JSON does not fit target type: {}", e);
          Error::ShapeMismatch
        })
    }
}
