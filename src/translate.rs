//! UCI command and response rewriting.
//!
//! Two halves: `translate` classifies a single GUI line before it reaches
//! the engine, and `ResponseFilter` rewrites engine output during the
//! `uci` -> `uciok` handshake window. Both are pure protocol logic with no
//! I/O so the whole rewriting surface is unit-testable.

/// Fixed search directive sent in place of any GUI `go` command. The
/// wrapped networks are trained to move well after a single node.
pub const SINGLE_NODE_GO: &str = "go nodes 1";

const ELO_SETOPTION_PREFIX: &str = "setoption name UCI_Elo value";

/// Engine-native strength options that must not leak to the GUI; the
/// wrapper declares its own versions during the handshake.
const BLOCKED_OPTION_MARKERS: [&str; 2] = ["UCI_Elo", "UCI_LimitStrength"];

/// Identity presented to the GUI in place of the engine's own `id` lines.
#[derive(Debug, Clone)]
pub struct EngineIdentity {
    pub name: String,
    pub author: String,
}

/// Bounds advertised in the synthetic `UCI_Elo` option declaration.
#[derive(Debug, Clone, Copy)]
pub struct EloRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// What to do with one line received from the GUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    /// Send the line to the engine as-is (possibly rewritten).
    Forward(String),
    /// `uci`: forward it and open the handshake window on the filter.
    Handshake,
    /// `quit`: forward it and begin shutdown.
    Quit,
    /// `setoption name UCI_Elo value ...`: suppress the line and request a
    /// reconfiguration. `None` when the trailing token is not an integer.
    Reconfigure(Option<u32>),
    /// Empty or whitespace-only input, dropped entirely.
    Discard,
}

/// Classifies one GUI line. Rules apply in priority order; anything not
/// matched is forwarded byte-for-byte minus surrounding whitespace.
pub fn translate(line: &str) -> GuiCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return GuiCommand::Discard;
    }
    if trimmed == "uci" {
        return GuiCommand::Handshake;
    }
    if trimmed == "quit" {
        return GuiCommand::Quit;
    }
    if trimmed.starts_with(ELO_SETOPTION_PREFIX) {
        let rating = trimmed
            .split_whitespace()
            .last()
            .and_then(|token| token.parse::<u32>().ok());
        return GuiCommand::Reconfigure(rating);
    }
    if trimmed.starts_with("go") {
        return GuiCommand::Forward(SINGLE_NODE_GO.to_string());
    }
    GuiCommand::Forward(trimmed.to_string())
}

/// Rewrites engine output lines on their way to the GUI.
///
/// Outside the handshake window every line passes through unchanged.
/// Inside it, identity lines are replaced, native strength options are
/// dropped, and the wrapper's own option declarations are injected just
/// before `uciok`.
#[derive(Debug)]
pub struct ResponseFilter {
    identity: EngineIdentity,
    range: EloRange,
    collecting: bool,
}

impl ResponseFilter {
    pub fn new(identity: EngineIdentity, range: EloRange) -> Self {
        Self {
            identity,
            range,
            collecting: false,
        }
    }

    /// Opens the handshake window. Called when the GUI sends `uci`.
    pub fn begin_handshake(&mut self) {
        self.collecting = true;
    }

    /// Filters one engine line, returning the line(s) to emit to the GUI
    /// in order. May return zero lines (suppressed) or several (injection
    /// before `uciok`).
    pub fn apply(&mut self, line: &str) -> Vec<String> {
        if !self.collecting {
            return vec![line.to_string()];
        }
        if line.starts_with("id name") {
            return vec![format!("id name {}", self.identity.name)];
        }
        if line.starts_with("id author") {
            return vec![format!("id author {}", self.identity.author)];
        }
        if line.starts_with("option name") {
            if BLOCKED_OPTION_MARKERS.iter().any(|m| line.contains(m)) {
                return Vec::new();
            }
            return vec![line.to_string()];
        }
        if line == "uciok" {
            self.collecting = false;
            return vec![
                format!(
                    "option name UCI_Elo type spin default {} min {} max {}",
                    self.range.default, self.range.min, self.range.max
                ),
                "option name UCI_LimitStrength type check default false".to_string(),
                "uciok".to_string(),
            ];
        }
        vec![line.to_string()]
    }
}
