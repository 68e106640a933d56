use crate::cli::commands::render::render_notification;
use crate::cli::commands::{build_workflow, finish_session, Command};
use crate::config::ScannerConfig;
use crate::reservations::ReservationApi;
use crate::workflow::{Notification, ScanWorkflow, WorkflowError, WorkflowState};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

pub struct ScanCommand {
    config: ScannerConfig,
}

impl ScanCommand {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }
}

/// One line of operator input, interpreted against the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput<'a> {
    Quit,
    Serve,
    Dismiss,
    Decode(&'a str),
}

impl<'a> SessionInput<'a> {
    /// Serve and dismiss keys only mean something while a client is on
    /// screen; in any other state the line is a scanned payload.
    pub fn parse(line: &'a str, state: &WorkflowState) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match line {
            "q" | "quit" => SessionInput::Quit,
            "s" | "serve" if matches!(state, WorkflowState::ReviewingClient { .. }) => {
                SessionInput::Serve
            }
            "d" | "dismiss" if matches!(state, WorkflowState::ReviewingClient { .. }) => {
                SessionInput::Dismiss
            }
            payload => SessionInput::Decode(payload),
        }
    }
}

impl Command for ScanCommand {
    async fn execute(&self) -> Result<()> {
        let mut workflow = build_workflow(&self.config)?;
        let mut notifications = workflow.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("📷 Scanning session started against {}", self.config.server.base_url);
        println!("   One code per line. q, Ctrl-D or Ctrl-C ends the session.");
        println!();
        prompt(workflow.state());

        // One interrupt future for the whole session: it must also cover
        // requests in flight, not only the wait for input
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut interrupted => {
                    println!();
                    None
                }
            };
            let Some(line) = line else { break };

            let input = SessionInput::parse(&line, workflow.state());
            if input == SessionInput::Quit {
                break;
            }

            let result = tokio::select! {
                result = apply_input(&mut workflow, input) => result,
                _ = &mut interrupted => {
                    println!();
                    warn!(state = %workflow.state().kind(), "Session interrupted with a request in flight");
                    break;
                }
            };

            match result {
                Ok(()) => {}
                // Already surfaced through the notification channel
                Err(WorkflowError::VerificationFailed { .. } | WorkflowError::ServeFailed { .. }) => {}
                Err(e @ WorkflowError::Precondition { .. }) => println!("⚠️  {e}"),
            }

            show_notifications(&mut notifications);
            prompt(workflow.state());
        }

        println!("👋 Session closed");
        finish_session(&workflow, &self.config);
        Ok(())
    }
}

async fn apply_input<A: ReservationApi>(
    workflow: &mut ScanWorkflow<A>,
    input: SessionInput<'_>,
) -> Result<(), WorkflowError> {
    match input {
        SessionInput::Quit => Ok(()),
        SessionInput::Serve => workflow.serve().await.map(|_| ()),
        SessionInput::Dismiss => workflow.dismiss(),
        SessionInput::Decode(payload) => workflow.on_code_decoded(payload).await.map(|_| ()),
    }
}

fn show_notifications(notifications: &mut broadcast::Receiver<Notification>) {
    loop {
        match notifications.try_recv() {
            Ok(notification) => {
                if matches!(notification, Notification::ClientArrived { .. }) {
                    // Terminal bell stands in for the scanner's alert
                    print!("\x07");
                }
                println!("{}", render_notification(&notification));
                println!();
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Notifications dropped, consider raising workflow.notification_capacity");
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Closed) => {
                debug!("Notification channel closed");
                break;
            }
        }
    }
}

fn prompt(state: &WorkflowState) {
    match state {
        WorkflowState::ReviewingClient { .. } => print!("[s]erve  [d]ismiss  [q]uit > "),
        _ => print!("scan > "),
    }
    // Prompt is cosmetic; a failed flush only delays it
    let _ = std::io::stdout().flush();
}
