pub mod error;
pub mod config;
pub mod logging;
pub mod request;
pub mod recovery;
pub mod providers;
pub mod generation;
pub mod reports;
pub mod store;
pub mod client;
use serde::{Deserialize, Serialize};

pub use client::StrategyBackend;
pub use config::{ClientConfig, CredentialSource, RecoveryStrategy};
pub use error::{Error, ErrorKind};
pub use generation::StructuredGenerationClient;
pub use reports::{Brief, Report, ReportKind};
pub use request::{GenerationRequest, ShapeDescriptor};

/*

stratagem turns a short business brief into a structured report.
all the "thinking" happens at the model provider; this crate builds
the prompt, picks the model, waits (bounded) for one answer, digs the
JSON out of whatever text came back and hands it to the caller typed.

stratagem/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports, QualityMode, backend channels
│   ├── error.rs        # Error taxonomy, user-presentable messages
│   ├── config.rs       # Models, timeout, credential source
│   ├── logging.rs      # env_logger setup
│   ├── request.rs      # Request / shape descriptor types
│   ├── recovery.rs     # JSON recovery from raw model text
│   ├── providers/      # Provider trait + Gemini
│   ├── generation.rs   # StructuredGenerationClient
│   ├── reports.rs      # Report kinds, prompts, shapes
│   ├── store.rs        # Project / workforce persistence
│   └── client.rs       # Backend task for UI callers
└── tests/

*/

/// STRATAGEM STRUCTURES:

/// Speed/quality trade-off for one generation call.
/// Each variant maps to exactly one model identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default
)]
pub enum QualityMode
{   /// Faster, cheaper model
    #[default]
    Fast
  , /// Slower, higher fidelity model
    Thorough
}

/// STRATAGEM BACKEND INTERFACE:

// ===== GenerateReport =====

pub type GenerateReportReply = Result<crate::Report, crate::error::Error>;
pub type GenerateReportReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateReportReply>;

pub struct GenerateReportArgs
{   pub kind: crate::ReportKind
  , pub brief: crate::Brief
  , pub quality: QualityMode
  , pub reply: GenerateReportReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== BackendHand (sender side) =====

pub struct BackendHand
{   pub generate_report_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateReportArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== BackendFoot (receiver side) =====

pub struct BackendFoot
{   pub generate_report_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateReportArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
