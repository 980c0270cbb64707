//! Pager event queue and command handle
//!
//! Everything that changes a pager's state arrives as a `PagerEvent` on its
//! queue: debounced scroll checks, completed fetches, and commands sent
//! through a `PagerHandle` from elsewhere in the host.

use tokio::sync::mpsc;

use crate::config::ConfigPatch;
use crate::error::TransportResult;
use crate::transport::{FetchStrategy, Response};

/// Identifies one dispatched fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Run generation at dispatch; bumped by `reset` and `enable`
    pub generation: u64,
    /// Page number the fetch was issued for
    pub page: u32,
}

/// Public operation, queued for the pager
#[derive(Debug, Clone)]
pub enum Command {
    Bind,
    Unbind,
    Pause,
    Resume,
    Toggle,
    Finish,
    Retrieve(Option<u32>),
    Update(ConfigPatch),
    Reset(Option<ConfigPatch>),
    Enable,
    Disable,
    Destroy,
}

/// Events drained by `Pager::process`
#[derive(Debug)]
pub enum PagerEvent {
    /// Debounced scroll signal
    Check,
    Command(Command),
    Fetched {
        ticket: FetchTicket,
        strategy: FetchStrategy,
        result: TransportResult<Response>,
    },
    /// Smooth scroll after an append has finished
    ScrollSettled { ticket: FetchTicket },
}

/// Cloneable sender for commands to a running pager
#[derive(Debug, Clone)]
pub struct PagerHandle {
    tx: mpsc::UnboundedSender<PagerEvent>,
}

impl PagerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PagerEvent>) -> Self {
        Self { tx }
    }

    /// Queue a command. Returns false once the pager is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(PagerEvent::Command(command)).is_ok()
    }

    /// Queue a scroll check, bypassing the debounce.
    pub fn check(&self) -> bool {
        self.tx.send(PagerEvent::Check).is_ok()
    }

    pub fn bind(&self) -> bool {
        self.send(Command::Bind)
    }

    pub fn unbind(&self) -> bool {
        self.send(Command::Unbind)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(Command::Resume)
    }

    pub fn toggle(&self) -> bool {
        self.send(Command::Toggle)
    }

    pub fn finish(&self) -> bool {
        self.send(Command::Finish)
    }

    pub fn retrieve(&self, page: Option<u32>) -> bool {
        self.send(Command::Retrieve(page))
    }

    pub fn update(&self, patch: ConfigPatch) -> bool {
        self.send(Command::Update(patch))
    }

    pub fn reset(&self, patch: Option<ConfigPatch>) -> bool {
        self.send(Command::Reset(patch))
    }

    pub fn enable(&self) -> bool {
        self.send(Command::Enable)
    }

    pub fn disable(&self) -> bool {
        self.send(Command::Disable)
    }

    pub fn destroy(&self) -> bool {
        self.send(Command::Destroy)
    }
}
