use crate::entity::Scrip;

/// Request status shared by every async store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Failed,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Loading => write!(f, "loading"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Create,
    Update,
    Delete,
    Export,
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Initialize => write!(f, "initialize"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Export => write!(f, "export"),
            Operation::Import => write!(f, "import"),
        }
    }
}

/// Every transition the store can make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pending(Operation),
    /// `scrips: None` leaves the collection as it was.
    Fulfilled {
        op: Operation,
        scrips: Option<Vec<Scrip>>,
    },
    Rejected {
        op: Operation,
        message: String,
    },
    SelectScrip(Option<i64>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScripState {
    /// Newest id first, as last read from the table.
    pub scrips: Vec<Scrip>,
    /// May name a scrip that no longer exists.
    pub selected_scrip_id: Option<i64>,
    pub status: Status,
    pub error: Option<String>,
}

impl ScripState {
    /// Apply `action`, producing the next state.
    pub fn reduce(self, action: Action) -> ScripState {
        match action {
            Action::Pending(_) => ScripState {
                status: Status::Loading,
                error: None,
                ..self
            },
            Action::Fulfilled { scrips, .. } => ScripState {
                scrips: scrips.unwrap_or(self.scrips),
                status: Status::Idle,
                ..self
            },
            Action::Rejected { message, .. } => ScripState {
                status: Status::Failed,
                error: Some(message),
                ..self
            },
            Action::SelectScrip(id) => ScripState {
                selected_scrip_id: id,
                ..self
            },
        }
    }

    pub fn all_scrips(&self) -> &[Scrip] {
        &self.scrips
    }

    pub fn scrip_by_id(&self, id: i64) -> Option<&Scrip> {
        self.scrips.iter().find(|s| s.id == Some(id))
    }

    pub fn selected_scrip(&self) -> Option<&Scrip> {
        self.selected_scrip_id.and_then(|id| self.scrip_by_id(id))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
