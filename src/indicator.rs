use std::io::IsTerminal;

use crate::status::StatusTuple;

/// Terminal rendering of a [`StatusTuple`]: one light per fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicator {
    symbols: &'static Symbols,
}

#[derive(Debug, PartialEq, Eq)]
struct Symbols {
    staged: [&'static str; 2],
    unstaged: [&'static str; 2],
    unpushed: [&'static str; 2],
}

impl Indicator {
    // [off, on]
    const SYMBOLS_FANCY: Symbols = Symbols {
        staged: ["⚪", "🟢"],
        unstaged: ["⚪", "🟡"],
        unpushed: ["⚪", "🔵"],
    };
    const SYMBOLS_PLAIN: Symbols = Symbols {
        staged: ["[ ]", "[S]"],
        unstaged: ["[ ]", "[U]"],
        unpushed: ["[ ]", "[P]"],
    };

    pub fn detect() -> Self {
        if Self::wants_fancy() {
            Self::fancy()
        } else {
            Self::plain()
        }
    }

    pub fn fancy() -> Self {
        Self {
            symbols: &Self::SYMBOLS_FANCY,
        }
    }

    pub fn plain() -> Self {
        Self {
            symbols: &Self::SYMBOLS_PLAIN,
        }
    }

    fn wants_fancy() -> bool {
        // Explicit overrides first
        if std::env::var("BEACON_PLAIN_TEXT").is_ok() {
            return false;
        }
        if std::env::var("BEACON_FANCY").is_ok() {
            return true;
        }

        if !std::io::stdout().is_terminal() {
            return false;
        }
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        if let Ok(term) = std::env::var("TERM") {
            let term = term.to_lowercase();
            if term == "dumb" || term == "vt100" || term.contains("linux") {
                return false;
            }
        }
        true
    }

    pub fn render(&self, status: &StatusTuple) -> String {
        let light = |pair: &[&'static str; 2], on: bool| pair[usize::from(on)];
        format!(
            "{}{}{}",
            light(&self.symbols.staged, status.has_staged_changes),
            light(&self.symbols.unstaged, status.has_unstaged_changes),
            light(&self.symbols.unpushed, status.has_unpushed_commits),
        )
    }

    /// The light followed by its tooltip, as printed by `beacon status`.
    pub fn line(&self, status: &StatusTuple) -> String {
        format!("{} {}", self.render(status), status.tooltip())
    }
}
