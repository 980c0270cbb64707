use std::fmt;

/// Lifecycle phase derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Paused,
    Exhausted,
    Destroyed,
    Invalid,
}

impl Phase {
    /// Lowercase name used in diagnostics
    pub fn display(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Fetching => "fetching",
            Phase::Paused => "paused",
            Phase::Exhausted => "exhausted",
            Phase::Destroyed => "destroyed",
            Phase::Invalid => "invalid",
        }
    }

    /// Returns true if no further pages load without an explicit reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Exhausted | Phase::Destroyed | Phase::Invalid)
    }
}

/// Requested change to the paused flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseAction {
    Pause,
    Resume,
    Toggle,
}

/// Signal binding direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Bind,
    Unbind,
}

/// Why a pager stopped loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Out of pages, or the last fetch failed
    End,
    /// Torn down by the caller
    Destroy,
    /// Anything else; carries the diagnostic
    Unknown(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::End => write!(f, "end"),
            StopReason::Destroy => write!(f, "destroy"),
            StopReason::Unknown(msg) => write!(f, "unknown: {}", msg),
        }
    }
}

/// Mutable pagination state, owned by one `Pager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerState {
    /// Last page requested; 1 is the page already on screen
    pub current_page: u32,
    pub is_fetching: bool,
    pub is_paused: bool,
    pub is_exhausted: bool,
    pub is_destroyed: bool,
    pub is_invalid_page: bool,
}

impl Default for PagerState {
    fn default() -> Self {
        Self {
            current_page: 1,
            is_fetching: false,
            is_paused: false,
            is_exhausted: false,
            is_destroyed: false,
            is_invalid_page: false,
        }
    }
}

impl PagerState {
    pub fn phase(&self) -> Phase {
        if self.is_destroyed {
            Phase::Destroyed
        } else if self.is_invalid_page {
            Phase::Invalid
        } else if self.is_exhausted {
            Phase::Exhausted
        } else if self.is_fetching {
            Phase::Fetching
        } else if self.is_paused {
            Phase::Paused
        } else {
            Phase::Idle
        }
    }

    /// Whether a scroll check may start a fetch
    pub fn can_auto_trigger(&self) -> bool {
        !(self.is_invalid_page
            || self.is_fetching
            || self.is_exhausted
            || self.is_destroyed
            || self.is_paused)
    }

    /// Apply a pause action, returning the new paused flag
    pub fn apply_pause(&mut self, action: PauseAction) -> bool {
        self.is_paused = match action {
            PauseAction::Pause => true,
            PauseAction::Resume => false,
            PauseAction::Toggle => !self.is_paused,
        };
        self.is_paused
    }

    /// Back to a fresh run on page 1; the invalid flag is kept.
    pub fn restart(&mut self) {
        self.current_page = 1;
        self.is_fetching = false;
        self.is_paused = false;
        self.is_exhausted = false;
        self.is_destroyed = false;
    }
}
