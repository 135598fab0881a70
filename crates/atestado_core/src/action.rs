use std::fmt;

/// The four user-facing actions whose outcome is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    Process,
    Download,
    Infer,
    Import,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Process,
        ActionKind::Download,
        ActionKind::Infer,
        ActionKind::Import,
    ];

    fn slot(self) -> usize {
        match self {
            ActionKind::Process => 0,
            ActionKind::Download => 1,
            ActionKind::Infer => 2,
            ActionKind::Import => 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Process => write!(f, "process"),
            ActionKind::Download => write!(f, "download"),
            ActionKind::Infer => write!(f, "infer"),
            ActionKind::Import => write!(f, "import"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    Waiting,
    Processing,
    Ok,
    Error,
}

impl StatusKind {
    pub fn is_settled(self) -> bool {
        matches!(self, StatusKind::Ok | StatusKind::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl ActionStatus {
    pub fn waiting() -> Self {
        Self::new(StatusKind::Waiting, "-")
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Processing, message)
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Ok, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, message)
    }

    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Default for ActionStatus {
    fn default() -> Self {
        Self::waiting()
    }
}

/// Typed mapping from every [`ActionKind`] to its current status.
///
/// Every kind always has an entry; there is no way to address an unknown key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionBoard {
    entries: [ActionStatus; 4],
}

impl ActionBoard {
    pub fn get(&self, kind: ActionKind) -> &ActionStatus {
        &self.entries[kind.slot()]
    }

    pub fn status(&self, kind: ActionKind) -> StatusKind {
        self.get(kind).kind
    }

    pub fn is_processing(&self, kind: ActionKind) -> bool {
        self.status(kind) == StatusKind::Processing
    }

    pub(crate) fn set(&mut self, kind: ActionKind, status: ActionStatus) {
        self.entries[kind.slot()] = status;
    }

    pub(crate) fn reset(&mut self) {
        for entry in &mut self.entries {
            *entry = ActionStatus::waiting();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, &ActionStatus)> + '_ {
        ActionKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Identifier the core attaches to every backend request it starts.
pub type RequestId = u64;

/// The request each action is currently waiting on.
///
/// Ids only grow, so a reply for a superseded request never matches again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct InFlight {
    last: RequestId,
    awaiting: [Option<RequestId>; 4],
}

impl InFlight {
    pub(crate) fn begin(&mut self, kind: ActionKind) -> RequestId {
        self.last = self.last.wrapping_add(1);
        self.awaiting[kind.slot()] = Some(self.last);
        self.last
    }

    /// Accepts the reply to `request` if it is the one `kind` waits on.
    pub(crate) fn settle(&mut self, kind: ActionKind, request: RequestId) -> bool {
        let slot = &mut self.awaiting[kind.slot()];
        if *slot == Some(request) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn forget_all(&mut self) {
        self.awaiting = [None; 4];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_starts_waiting_for_every_action() {
        let board = ActionBoard::default();
        for (_, status) in board.iter() {
            assert_eq!(status, &ActionStatus::waiting());
        }
    }

    #[test]
    fn set_touches_only_the_addressed_action() {
        let mut board = ActionBoard::default();
        board.set(ActionKind::Infer, ActionStatus::error("boom"));
        assert_eq!(board.status(ActionKind::Infer), StatusKind::Error);
        assert_eq!(board.status(ActionKind::Process), StatusKind::Waiting);
        assert_eq!(board.status(ActionKind::Download), StatusKind::Waiting);
        assert_eq!(board.status(ActionKind::Import), StatusKind::Waiting);

        board.reset();
        assert_eq!(board, ActionBoard::default());
    }

    #[test]
    fn only_the_latest_request_settles() {
        let mut in_flight = InFlight::default();
        let first = in_flight.begin(ActionKind::Download);
        let second = in_flight.begin(ActionKind::Download);
        assert_ne!(first, second);
        assert!(!in_flight.settle(ActionKind::Download, first));
        assert!(in_flight.settle(ActionKind::Download, second));
        assert!(!in_flight.settle(ActionKind::Download, second));
    }

    #[test]
    fn forgotten_requests_never_settle() {
        let mut in_flight = InFlight::default();
        let request = in_flight.begin(ActionKind::Process);
        in_flight.forget_all();
        assert!(!in_flight.settle(ActionKind::Process, request));
    }
}
