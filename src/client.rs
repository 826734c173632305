use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::BackendFoot;
use crate::generation::StructuredGenerationClient;
use crate::providers::Provider;

/// Public API for the report backend - owns the task
pub struct StrategyBackend
{   hand: crate::BackendHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl StrategyBackend
{   /// Create and spawn a new backend around a generation client
    /// Returns immediately - spawns background task
    pub fn new<P>(client: StructuredGenerationClient<P>) -> Self
    where P: Provider + 'static
    {   debug!("Creating StrategyBackend with task ownership");

        let (generate_report_tx, generate_report_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::BackendHand
        {   generate_report_tx
          , kill_process_tx
        };

        let foot = crate::BackendFoot
        {   generate_report_rx
          , kill_process_rx
        };

        let client = Arc::new(client);
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, client).await
        });

        StrategyBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a report - returns almost immediately
    pub async fn generate_report(
      &self
    , kind: crate::ReportKind
    , brief: crate::Brief
    , quality: crate::QualityMode
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GenerateReportReply>,
        crate::error::Error
      >
    {   debug!("generate_report queuing {:?}", kind);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GenerateReportArgs
        {   kind
          , brief
          , quality
          , reply: reply_tx
        };

        self.hand.generate_report_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down StrategyBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Timeout)
        }
    }
}

/// Main backend event loop
///
/// tokio::select! is ONLY for fast queueing. Each report runs in
/// its own task so a slow model never holds up the next command.
async fn run_backend_loop<P>(
  foot: crate::BackendFoot
, client: Arc<StructuredGenerationClient<P>>
)
where P: Provider + 'static
{   debug!("Starting StrategyBackend event loop");
    let BackendFoot
    {   mut generate_report_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = generate_report_rx.recv() => {
          debug!("Received GenerateReport: {:?}", cmd.kind);
          let client = Arc::clone(&client);
          tokio::spawn(async move {
            let result = client
              .generate_report(cmd.kind, &cmd.brief, cmd.quality)
              .await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("StrategyBackend shutting down");
          break;
        }
      , else => {
          debug!("Command channels closed");
          break;
        }
      }
    }
}
