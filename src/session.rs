//! Session supervisor: owns the engine process, wires the line pumps and
//! the GUI channel together, and drives the restart loop that swaps
//! weight files when the GUI changes the rating.

use crate::config::WrapperConfig;
use crate::engine::{launch_command, EngineProcess};
use crate::error::{Result, WrapperError};
use crate::pump::{spawn_pump, StreamSource};
use crate::translate::{translate, GuiCommand, ResponseFilter};
use crate::wire::{WireDirection, WireLog};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// Grace period for the engine to exit on its own after a forwarded
/// `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Session lifecycle with validated transitions. One per engine session;
/// `Terminated` is terminal. The supervisor's restart loop is what takes
/// a reconfigured session back to a fresh `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Starting,
    Running,
    Reconfiguring,
    ShuttingDown,
    Terminated,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Starting => "Starting",
            SessionPhase::Running => "Running",
            SessionPhase::Reconfiguring => "Reconfiguring",
            SessionPhase::ShuttingDown => "ShuttingDown",
            SessionPhase::Terminated => "Terminated",
        }
    }

    pub fn transition(&mut self, next: SessionPhase) -> Result<()> {
        use SessionPhase::*;
        let valid = matches!(
            (*self, next),
            (Starting, Running)
                | (Running, Reconfiguring)
                | (Running, ShuttingDown)
                | (Starting, Terminated)
                | (Reconfiguring, Terminated)
                | (ShuttingDown, Terminated)
        );
        if !valid {
            return Err(WrapperError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            });
        }
        debug!(from = self.as_str(), to = next.as_str(), "session phase");
        *self = next;
        Ok(())
    }
}

/// Control signals shared by the tasks of one session. Created fresh per
/// session so a stale request can never leak into the next one.
#[derive(Debug, Default)]
pub struct SessionControl {
    quit: AtomicBool,
    reconfigure: AtomicBool,
}

impl SessionControl {
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn request_reconfigure(&self) {
        self.reconfigure.store(true, Ordering::SeqCst);
    }

    pub fn reconfigure_requested(&self) -> bool {
        self.reconfigure.load(Ordering::SeqCst)
    }
}

/// Where lines for the GUI go. Production uses stdout; tests capture.
pub trait GuiSink: Send + Sync {
    fn emit(&self, line: &str);
}

pub struct StdoutSink;

impl GuiSink for StdoutSink {
    fn emit(&self, line: &str) {
        use std::io::Write;
        let mut stdout = std::io::stdout().lock();
        if writeln!(stdout, "{line}")
            .and_then(|_| stdout.flush())
            .is_err()
        {
            warn!("failed to write to GUI stdout");
        }
    }
}

/// Why a session ended. `Reconfigure` is the single-slot handoff carrying
/// the next session's configuration to the supervisor.
#[derive(Debug)]
pub enum SessionEnd {
    Quit,
    Reconfigure { rating: u32, weights: PathBuf },
}

/// Runs one engine session to completion.
///
/// Takes a prepared launch command so tests can substitute a scripted
/// process. `announce_uciok` is set for sessions started by a
/// reconfiguration: the GUI already holds an open handshake from its
/// point of view, so a `uciok` is synthesized immediately.
///
/// The GUI receiver is borrowed, not owned; input buffered across an
/// engine restart is consumed by the next session.
pub async fn run_session(
    config: &WrapperConfig,
    command: tokio::process::Command,
    announce_uciok: bool,
    gui_rx: &mut UnboundedReceiver<String>,
    sink: &dyn GuiSink,
    wire: &WireLog,
) -> Result<SessionEnd> {
    let mut phase = SessionPhase::Starting;

    let (mut engine, stdout, stderr) = match EngineProcess::spawn(command) {
        Ok(spawned) => spawned,
        Err(e) => {
            phase.transition(SessionPhase::Terminated)?;
            wire.record(WireDirection::Lifecycle, "engine launch failed");
            return Err(e);
        }
    };

    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel();
    spawn_pump(stdout, StreamSource::EngineStdout, engine_tx.clone());
    spawn_pump(stderr, StreamSource::EngineStderr, engine_tx);

    let control = SessionControl::default();
    let mut filter = ResponseFilter::new(config.engine_identity(), config.elo_range());
    let mut pending: Option<(u32, PathBuf)> = None;
    let mut sent_quit = false;
    let mut engine_open = true;

    if announce_uciok {
        wire.record(WireDirection::ToGui, "uciok");
        sink.emit("uciok");
    }

    phase.transition(SessionPhase::Running)?;

    while !control.quit_requested() && !control.reconfigure_requested() {
        tokio::select! {
            gui_line = gui_rx.recv() => {
                match gui_line {
                    Some(line) => {
                        wire.record(WireDirection::FromGui, &line);
                        match translate(&line) {
                            GuiCommand::Discard => {}
                            GuiCommand::Handshake => {
                                filter.begin_handshake();
                                wire.record(WireDirection::ToEngine, "uci");
                                engine.send("uci").await;
                            }
                            GuiCommand::Quit => {
                                info!("quit received from GUI");
                                wire.record(WireDirection::ToEngine, "quit");
                                engine.send("quit").await;
                                sent_quit = true;
                                control.request_quit();
                                phase.transition(SessionPhase::ShuttingDown)?;
                            }
                            GuiCommand::Reconfigure(Some(rating)) => {
                                match config.weights_path(rating) {
                                    Ok(weights) => {
                                        info!(rating, "reconfiguration requested");
                                        pending = Some((rating, weights));
                                        control.request_reconfigure();
                                        phase.transition(SessionPhase::Reconfiguring)?;
                                    }
                                    // No UCI error line exists; reject locally
                                    // and keep the current session.
                                    Err(WrapperError::UnknownRating(r)) => {
                                        warn!(
                                            rating = r,
                                            closest = ?config.closest_rating(r),
                                            "no weights for requested rating, ignoring"
                                        );
                                    }
                                    Err(e) => return Err(e),
                                }
                            }
                            GuiCommand::Reconfigure(None) => {
                                warn!(line = %line, "unparseable UCI_Elo value, ignoring");
                            }
                            GuiCommand::Forward(cmd) => {
                                wire.record(WireDirection::ToEngine, &cmd);
                                engine.send(&cmd).await;
                            }
                        }
                    }
                    None => {
                        info!("GUI input closed, shutting down");
                        control.request_quit();
                        phase.transition(SessionPhase::ShuttingDown)?;
                    }
                }
            }
            engine_event = engine_rx.recv(), if engine_open => {
                match engine_event {
                    Some(event) => {
                        wire.record_from(
                            WireDirection::FromEngine,
                            Some(event.source.as_str()),
                            &event.text,
                        );
                        for out in filter.apply(&event.text) {
                            wire.record(WireDirection::ToGui, &out);
                            sink.emit(&out);
                        }
                    }
                    None => {
                        // Engine gone. Keep serving the GUI; writes to the
                        // dead process are dropped with a warning.
                        engine_open = false;
                        debug!("engine output streams closed");
                    }
                }
            }
        }
    }

    if control.quit_requested() {
        if sent_quit {
            if !engine.wait_with_timeout(QUIT_GRACE).await {
                engine.terminate().await;
            }
        } else {
            engine.terminate().await;
        }
        phase.transition(SessionPhase::Terminated)?;
        wire.record(WireDirection::Lifecycle, "session terminated");
        return Ok(SessionEnd::Quit);
    }

    let (rating, weights) = pending.take().ok_or_else(|| {
        WrapperError::Config("reconfigure requested without a pending configuration".to_string())
    })?;
    engine.terminate().await;
    phase.transition(SessionPhase::Terminated)?;
    wire.record(
        WireDirection::Lifecycle,
        &format!("session ending for restart at rating {rating}"),
    );
    Ok(SessionEnd::Reconfigure { rating, weights })
}

/// Restart loop: runs sessions until the GUI quits or a launch fails.
/// Each reconfiguration carries the pending weights into the next session
/// and advances the wire log's run counter.
pub async fn run_supervisor(
    config: &WrapperConfig,
    initial_rating: u32,
    gui_rx: &mut UnboundedReceiver<String>,
    sink: &dyn GuiSink,
    wire: &WireLog,
) -> Result<()> {
    let mut rating = initial_rating;
    let mut weights = config.weights_path(rating)?;
    let mut reconfigured = false;

    loop {
        info!(rating, weights = %weights.display(), "starting engine session");
        if reconfigured {
            wire.next_run();
        }
        let command = launch_command(config, &weights);
        match run_session(config, command, reconfigured, gui_rx, sink, wire).await? {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::Reconfigure {
                rating: next_rating,
                weights: next_weights,
            } => {
                rating = next_rating;
                weights = next_weights;
                reconfigured = true;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
