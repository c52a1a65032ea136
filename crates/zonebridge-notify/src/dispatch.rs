//! Resync dispatch.

use crate::{NotifyError, Result};
use async_trait::async_trait;
use tracing::{debug, info};
use zonebridge_model::NotifyEvent;

/// The action taken for an accepted NOTIFY.
///
/// Implementations must be idempotent per zone: NOTIFY delivery is
/// at-least-once and the same zone may be dispatched concurrently.
#[async_trait]
pub trait NotifyDispatch: Send + Sync {
    /// Triggers the local resync for the event's zone.
    async fn dispatch(&self, event: &NotifyEvent) -> Result<()>;
}

/// Dispatcher that runs a configured resync command with the zone name
/// appended as the final argument.
pub struct CommandDispatcher {
    program: String,
    args: Vec<String>,
}

impl CommandDispatcher {
    /// Creates a dispatcher from a command line split into words.
    ///
    /// Returns `None` for an empty command.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl NotifyDispatch for CommandDispatcher {
    async fn dispatch(&self, event: &NotifyEvent) -> Result<()> {
        debug!(zone = %event.zone, command = %self.program, "Running resync command");

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&event.zone)
            .status()
            .await
            .map_err(|e| NotifyError::Dispatch(format!("failed to run {}: {e}", self.program)))?;

        if !status.success() {
            return Err(NotifyError::Dispatch(format!(
                "{} exited with {status} for zone {}",
                self.program, event.zone
            )));
        }

        info!(zone = %event.zone, source = %event.source, "Resync dispatched");
        Ok(())
    }
}
