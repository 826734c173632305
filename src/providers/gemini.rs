use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace, error};

use crate::request::{ProviderRequest, RawModelResponse};

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub response_mime_type: String
  , pub response_schema: Value
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope
{   error: ErrorBody
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody
{   #[serde(default)]
    message: String
  , #[serde(default)]
    status: Option<String>
}

impl GenerateContentRequest
{   pub fn new(prompt: &str, response_schema: Value) -> Self
    {   GenerateContentRequest
        {   contents: vec![
              Content
              {   role: Some("user".to_string())
                , parts: vec![
                    Part { text: Some(prompt.to_string()) }
                  ]
              }
            ]
          , generation_config: GenerationConfig
            {   response_mime_type: "application/json".to_string()
              , response_schema
            }
        }
    }
}

impl GenerateContentResponse
{   /// Concatenated text of the first candidate, if any
    pub fn text(&self) -> Option<String>
    {   let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter()
          .filter_map(|p| p.text.as_deref())
          .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Turn a non-success body into a readable provider message
fn error_message(status: reqwest::StatusCode, body: &str) -> String
{   match serde_json::from_str::<ErrorEnvelope>(body)
    {   Ok(envelope) => match envelope.error.status
        {   Some(code) => format!(
              "{} ({}): {}", status.as_u16(), code, envelope.error.message
            )
          , None => format!(
              "{}: {}", status.as_u16(), envelope.error.message
            )
        }
      , Err(_) if body.trim().is_empty() => {
          format!("{}: {}", status.as_u16(), status)
        }
      , Err(_) => format!("{}: {}", status.as_u16(), body.trim())
    }
}

// ===== Gemini Provider =====

/// Google Gemini `generateContent` over HTTPS
#[derive(Debug, Clone)]
pub struct GeminiProvider
{   api_base: String
  , http_client: reqwest::Client
}

impl GeminiProvider
{   pub fn new(api_base: impl Into<String>) -> Self
    {   debug!("Creating GeminiProvider");
        GeminiProvider
        {   api_base: api_base.into().trim_end_matches('/').to_string()
          , http_client: reqwest::Client::new()
        }
    }

    pub fn from_config(config: &crate::config::ClientConfig) -> Self
    {   Self::new(config.api_base.clone())
    }

    fn endpoint(&self, model: &str) -> String
    {   format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

impl super::Provider for GeminiProvider
{   async fn generate_content(
      &self
    , request: ProviderRequest<'_>
    ) -> Result<RawModelResponse, crate::error::Error>
    {   debug!("Gemini generateContent for: {}", request.model);

        let body = GenerateContentRequest::new(
          request.prompt,
          request.response_schema
        );
        trace!("Gemini request: {:?}", body);

        let response = self.http_client
          .post(self.endpoint(request.model))
          .header("x-goog-api-key", request.api_key)
          .header("Content-Type", "application/json")
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::ProviderError(e.to_string())
          })?;

        let status = response.status();
        trace!("Gemini response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            let message = error_message(status, &error_text);
            error!("Gemini API error: {}", message);
            return Err(crate::error::Error::ProviderError(message));
        }

        let parsed: GenerateContentResponse
          = response.json().await.map_err(|e| {
            error!("Unreadable Gemini envelope: {}", e);
            crate::error::Error::ProviderError(e.to_string())
          })?;

        if let Some(reason) = parsed.candidates.first()
          .and_then(|c| c.finish_reason.as_deref())
        {   trace!("Gemini finish reason: {}", reason);
        }

        Ok(RawModelResponse
        {   text: parsed.text()
          , model: request.model.to_string()
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn request_body_uses_camel_case_and_json_mime()
    {   let body = GenerateContentRequest::new(
          "hello",
          json!({ "type": "OBJECT" })
        );
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
          v["generationConfig"]["responseMimeType"],
          "application/json"
        );
        assert_eq!(v["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn text_joins_parts_of_first_candidate()
    {   let parsed: GenerateContentResponse = serde_json::from_value(json!({
          "candidates": [
            { "content": { "role": "model",
                "parts": [ { "text": "{\"a\":" }, { "text": "1}" } ] },
              "finishReason": "STOP" }
          ]
        })).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_text_is_none()
    {   let parsed: GenerateContentResponse = serde_json::from_value(json!({
          "candidates": [ { "finishReason": "SAFETY" } ]
        })).unwrap();
        assert_eq!(parsed.text(), None);
        let empty: GenerateContentResponse
          = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn error_bodies_become_short_messages()
    {   let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
          error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body),
          "429 (RESOURCE_EXHAUSTED): Quota exceeded"
        );
        assert_eq!(
          error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down"),
          "502: upstream down"
        );
    }

    #[test]
    fn endpoint_trims_trailing_slash()
    {   let provider = GeminiProvider::new("http://localhost:9/v1beta/");
        assert_eq!(
          provider.endpoint("gemini-2.5-flash"),
          "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
