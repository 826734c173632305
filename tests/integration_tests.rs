use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use stratagem::providers::Provider;
use stratagem::request::{Field, ProviderRequest, RawModelResponse};
use stratagem::reports::{SwotAnalysis, Workforce};
use stratagem::{
  Brief, ClientConfig, CredentialSource, Error, GenerationRequest,
  QualityMode, RecoveryStrategy, ReportKind, ShapeDescriptor,
  StrategyBackend, StructuredGenerationClient
};

/// How the stub answers
#[derive(Clone)]
enum Reply
{   Text(String)
  , NoText
  , Delayed(Duration, String)
  , Fail(String)
}

/// Provider stub recording every call it receives
#[derive(Clone)]
struct StubProvider
{   reply: Reply
  , calls: Arc<AtomicUsize>
  , models: Arc<Mutex<Vec<String>>>
  , schemas: Arc<Mutex<Vec<Value>>>
}

impl StubProvider
{   fn new(reply: Reply) -> Self
    {   StubProvider
        {   reply
          , calls: Arc::new(AtomicUsize::new(0))
          , models: Arc::new(Mutex::new(vec![]))
          , schemas: Arc::new(Mutex::new(vec![]))
        }
    }

    fn text(text: &str) -> Self
    {   Self::new(Reply::Text(text.to_string()))
    }

    fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for StubProvider
{   async fn generate_content(
      &self
    , request: ProviderRequest<'_>
    ) -> Result<RawModelResponse, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().push(request.model.to_string());
        self.schemas.lock().unwrap().push(request.response_schema.clone());
        let model = request.model.to_string();
        match self.reply.clone()
        {   Reply::Text(text) => Ok(RawModelResponse
            {   text: Some(text), model
            })
          , Reply::NoText => Ok(RawModelResponse { text: None, model })
          , Reply::Delayed(delay, text) => {
              tokio::time::sleep(delay).await;
              Ok(RawModelResponse { text: Some(text), model })
            }
          , Reply::Fail(msg) => Err(Error::ProviderError(msg))
        }
    }
}

fn client(provider: StubProvider) -> StructuredGenerationClient<StubProvider>
{   client_with(provider, ClientConfig::default())
}

fn client_with(
  provider: StubProvider
, config: ClientConfig
) -> StructuredGenerationClient<StubProvider>
{   stratagem::logging::init();
    StructuredGenerationClient::new(
      provider,
      CredentialSource::Fixed("test-key".to_string()),
      config
    )
}

fn any_shape() -> ShapeDescriptor
{   ShapeDescriptor::object(vec![
      Field::required("executiveSummary", ShapeDescriptor::String)
    , Field::required("items", ShapeDescriptor::array_of(ShapeDescriptor::Integer))
    ])
}

fn request(quality: QualityMode) -> GenerationRequest
{   GenerationRequest::new("Summarise the market", any_shape(), quality)
}

#[tokio::test]
async fn test_missing_credential_fails_before_network()
{   let provider = StubProvider::text("{}");
    let client = StructuredGenerationClient::new(
      provider.clone(),
      CredentialSource::Absent,
      ClientConfig::default()
    );

    let result: Result<Value, Error>
      = client.generate(request(QualityMode::Fast)).await;

    assert_eq!(result, Err(Error::MissingCredential));
    assert_eq!(provider.calls(), 0);
    assert_eq!(
      Error::MissingCredential.to_string(),
      "Deployment Error: API Key is missing"
    );
}

#[tokio::test]
async fn test_timeout_abandons_slow_provider()
{   let provider = StubProvider::new(Reply::Delayed(
      Duration::from_millis(200),
      "{}".to_string()
    ));
    let config = ClientConfig
    {   timeout_secs: 0
      , timeout_millis: 50
      , ..ClientConfig::default()
    };
    let client = client_with(provider.clone(), config);

    let started = Instant::now();
    let result: Result<Value, Error>
      = client.generate(request(QualityMode::Fast)).await;
    let elapsed = started.elapsed();

    assert_eq!(result, Err(Error::Timeout));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(200), "{:?}", elapsed);
    assert_eq!(provider.calls(), 1);
    assert_eq!(Error::Timeout.to_string(), "Request Timed Out");
}

#[tokio::test]
async fn test_fenced_object_is_decoded()
{   let client = client(StubProvider::text("```json\n{\"a\":1}\n```"));
    let value: Value = assert_ok!(
      client.generate(request(QualityMode::Fast)).await
    );
    assert_eq!(value, json!({ "a": 1 }));
}

#[tokio::test]
async fn test_array_in_prose_is_decoded()
{   for recovery in [RecoveryStrategy::Outermost, RecoveryStrategy::Balanced]
    {   let config = ClientConfig { recovery, ..ClientConfig::default() };
        let client = client_with(
          StubProvider::text(
            "Here is your data: [ {\"x\":1}, {\"x\":2} ] Thanks!"
          ),
          config
        );

        #[derive(Deserialize)]
        struct Point { x: i64 }

        let points: Vec<Point> = assert_ok!(
          client.generate(request(QualityMode::Fast)).await
        );
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].x, 2);
    }
}

#[tokio::test]
async fn test_missing_text_is_empty_response()
{   let client = client(StubProvider::new(Reply::NoText));
    let result: Result<Value, Error>
      = client.generate(request(QualityMode::Fast)).await;
    assert_eq!(result, Err(Error::EmptyResponse));

    let blank = client_with(StubProvider::text("  \n "), ClientConfig::default());
    let result: Result<Value, Error>
      = blank.generate(request(QualityMode::Fast)).await;
    assert_eq!(result, Err(Error::EmptyResponse));
}

#[tokio::test]
async fn test_prose_without_json_is_malformed()
{   let client = client(StubProvider::text(
      "Sure thing! I cannot produce JSON right now."
    ));
    let err = assert_err!(
      client.generate::<Value>(request(QualityMode::Fast)).await
    );
    assert_eq!(err, Error::MalformedResponse);

    let parser_text = serde_json::from_str::<Value>(
      "Sure thing! I cannot produce JSON right now."
    ).unwrap_err().to_string();
    let message = err.to_string();
    assert!(!message.contains(&parser_text));
    assert!(!message.contains("line 1"));
}

#[tokio::test]
async fn test_each_quality_mode_selects_its_model()
{   let provider = StubProvider::text("{}");
    let client = client(provider.clone());
    for quality in [QualityMode::Fast, QualityMode::Thorough]
    {   let _: Value = assert_ok!(client.generate(request(quality)).await);
    }

    let models = provider.models.lock().unwrap().clone();
    let config = ClientConfig::default();
    assert_eq!(models, vec![
      config.fast_model.clone(),
      config.thorough_model.clone()
    ]);
    assert_ne!(models[0], models[1]);
}

#[tokio::test]
async fn test_well_formed_json_round_trips()
{   let provider = StubProvider::text(
      r#"{"executiveSummary":"ok","items":[1,2,3]}"#
    );
    let client = client(provider.clone());
    let value: Value = assert_ok!(
      client.generate(request(QualityMode::Thorough)).await
    );
    assert_eq!(value, json!({ "executiveSummary": "ok", "items": [1, 2, 3] }));

    let schemas = provider.schemas.lock().unwrap();
    assert_eq!(schemas[0], any_shape().to_schema());
}

#[tokio::test]
async fn test_provider_error_keeps_its_message()
{   let client = client(StubProvider::new(Reply::Fail(
      "429 (RESOURCE_EXHAUSTED): Quota exceeded".to_string()
    )));
    let result: Result<Value, Error>
      = client.generate(request(QualityMode::Fast)).await;
    assert_eq!(
      result,
      Err(Error::ProviderError(
        "429 (RESOURCE_EXHAUSTED): Quota exceeded".to_string()
      ))
    );
}

#[tokio::test]
async fn test_shape_validation_is_opt_in()
{   let text = r#"{"executiveSummary":"ok","items":["one"]}"#;

    let lenient = client(StubProvider::text(text));
    let value: Value = assert_ok!(
      lenient.generate(request(QualityMode::Fast)).await
    );
    assert_eq!(value["items"][0], "one");

    let strict = client_with(
      StubProvider::text(text),
      ClientConfig { validate_shapes: true, ..ClientConfig::default() }
    );
    let result: Result<Value, Error>
      = strict.generate(request(QualityMode::Fast)).await;
    assert_eq!(result, Err(Error::ShapeMismatch));
}

#[tokio::test]
async fn test_typed_report_decodes_record()
{   let client = client(StubProvider::text(
      "```json\n{\"executiveSummary\":\"Niche but loyal\",\
       \"strengths\":[\"brand\"],\"weaknesses\":[],\
       \"opportunities\":[\"export\"],\"threats\":[]}\n```"
    ));
    let swot: SwotAnalysis = assert_ok!(
      client.generate_typed(&Brief::new("craft beer"), QualityMode::Fast).await
    );
    assert_eq!(swot.strengths, vec!["brand".to_string()]);
    assert!(swot.strategic_implications.is_empty());

    let result = client
      .generate_typed::<Workforce>(&Brief::new("craft beer"), QualityMode::Fast)
      .await;
    assert_eq!(result, Err(Error::ShapeMismatch));
}

#[tokio::test]
async fn test_generate_report_wraps_body()
{   let provider = StubProvider::text(r#"{"executiveSummary":"ok"}"#);
    let client = client(provider.clone());
    let report = assert_ok!(
      client.generate_report(
        ReportKind::Pestle,
        &Brief::new("e-bikes"),
        QualityMode::Thorough
      ).await
    );
    assert_eq!(report.kind, ReportKind::Pestle);
    assert_eq!(report.quality, QualityMode::Thorough);
    assert_eq!(report.body["executiveSummary"], "ok");
    assert!(report.generated_at_ms > 0);

    let schemas = provider.schemas.lock().unwrap();
    assert_eq!(schemas[0], ReportKind::Pestle.shape().to_schema());
}

#[tokio::test]
async fn test_concurrent_calls_are_independent()
{   let provider = StubProvider::new(Reply::Delayed(
      Duration::from_millis(30),
      r#"{"executiveSummary":"ok"}"#.to_string()
    ));
    let client = client(provider.clone());
    let brief = Brief::new("vertical farming");

    let (a, b, c) = tokio::join!(
      client.generate_report(ReportKind::Swot, &brief, QualityMode::Fast),
      client.generate_report(ReportKind::OkrPlan, &brief, QualityMode::Fast),
      client.generate_report(ReportKind::BlueOcean, &brief, QualityMode::Thorough)
    );
    assert_eq!(assert_ok!(a).kind, ReportKind::Swot);
    assert_eq!(assert_ok!(b).kind, ReportKind::OkrPlan);
    assert_eq!(assert_ok!(c).kind, ReportKind::BlueOcean);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_backend_initialization()
{   let backend = StrategyBackend::new(client(StubProvider::text("{}")));
    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_backend_generates_reports()
{   let backend = StrategyBackend::new(client(StubProvider::text(
      r#"{"executiveSummary":"ok","agents":[]}"#
    )));

    let mut rx = assert_ok!(
      backend.generate_report(
        ReportKind::Workforce,
        Brief::new("boutique agency"),
        QualityMode::Fast
      ).await
    );

    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await
    {   Ok(Some(Ok(report))) => {
          assert_eq!(report.kind, ReportKind::Workforce);
          assert_eq!(report.body["agents"], json!([]));
        }
      , other => panic!("unexpected reply: {:?}", other)
    }

    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_backend_relays_classified_errors()
{   let backend = StrategyBackend::new(StructuredGenerationClient::new(
      StubProvider::text("{}"),
      CredentialSource::Absent,
      ClientConfig::default()
    ));

    let mut rx = assert_ok!(
      backend.generate_report(
        ReportKind::Swot,
        Brief::new("anything"),
        QualityMode::Fast
      ).await
    );
    let reply = rx.recv().await;
    assert_eq!(reply.map(|r| r.map(|r| r.kind)), Some(Err(Error::MissingCredential)));

    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
#[ignore]
async fn test_gemini_generate_report()
{   if std::env::var("GEMINI_API_KEY").is_err()
    {   println!("Skipping: GEMINI_API_KEY not set");
        return;
    }
    stratagem::logging::init();

    let client = StructuredGenerationClient::gemini(ClientConfig::default());
    match client
      .generate_typed::<SwotAnalysis>(
        &Brief::new("independent bookshops in mid-sized cities"),
        QualityMode::Fast
      )
      .await
    {   Ok(swot) => {
          println!("Summary: {}", swot.executive_summary);
          assert!(!swot.strengths.is_empty());
        }
      , Err(e) => {
          println!("Generation failed: {}", e);
        }
    }
}
