//! Error types for the session negotiation with the source system.

use std::fmt;

/// One of the three exchanges that make up a report retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// GET of the program menu, which opens the ASP session.
    Menu,
    /// POST of the program selection form.
    Selection,
    /// GET of the generated report.
    Report,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Selection => "selection",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("{stage} request returned HTTP {status}")]
    Status { stage: Stage, status: u16 },
    #[error("{stage} request failed")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },
}

impl NegotiationError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Status { stage, .. } | Self::Transport { stage, .. } => *stage,
        }
    }

    /// HTTP status of the failing exchange, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}
