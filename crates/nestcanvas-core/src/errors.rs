use thiserror::Error;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

/// Result type alias for domain-level decoding and model errors
pub type DiagramResult<T> = std::result::Result<T, DiagramError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (CLI, UI boundary,
/// tests) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidSnapshot,
    UnsupportedFormat,
    DuplicateId,
    DanglingParent,
    CycleDetected,
    NotFound,

    // Restore
    /// Persisted data failed validation and no last-known-good state exists
    CorruptSnapshot,

    // Operational
    /// Another import/restore holds the operation lock
    OperationInFlight,
    Timeout,

    // Collaborators
    /// An external collaborator (host application callback) failed
    Collaborator,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    StorageUnavailable,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::UnsupportedFormat => "ERR_UNSUPPORTED_FORMAT",
            ExErrorKind::DuplicateId => "ERR_DUPLICATE_ID",
            ExErrorKind::DanglingParent => "ERR_DANGLING_PARENT",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::CorruptSnapshot => "ERR_CORRUPT_SNAPSHOT",
            ExErrorKind::OperationInFlight => "ERR_OPERATION_IN_FLIGHT",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Collaborator => "ERR_COLLABORATOR",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::StorageUnavailable => "ERR_STORAGE_UNAVAILABLE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, node, detail lines) for debugging and display.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node_id: Option<String>,
    message: String,
    details: Vec<String>,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node_id: None,
            message: String::new(),
            details: Vec::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node ID context
    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach detail lines (validation errors, typically)
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Text suitable for showing to the person driving the editor
    ///
    /// Leads with the message and appends up to three detail lines; the full
    /// list stays available through [`ExError::details`].
    pub fn user_message(&self) -> String {
        let mut text = if self.message.is_empty() {
            self.kind.code().to_string()
        } else {
            self.message.clone()
        };
        for detail in self.details.iter().take(3) {
            text.push_str("\n  - ");
            text.push_str(detail);
        }
        if self.details.len() > 3 {
            text.push_str(&format!("\n  ({} more)", self.details.len() - 3));
        }
        text
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(node_id) = &self.node_id {
            write!(f, " (node_id: {})", node_id)?;
        }
        if !self.details.is_empty() {
            write!(f, " [{}]", self.details.join("; "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for diagram snapshots
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    /// Snapshot declares a schema other than the supported one
    #[error("Unsupported format version: {found} (expected {expected})")]
    UnsupportedFormat { found: String, expected: String },

    /// Snapshot failed structural validation
    #[error("Snapshot failed validation with {} error(s)", errors.len())]
    InvalidSnapshot { errors: Vec<String> },

    /// A field required for decoding is missing or has the wrong type
    #[error("Malformed {field} in {context}")]
    Malformed { context: String, field: String },

    /// Two nodes share the same id
    #[error("Duplicate node id: {node_id}")]
    DuplicateId { node_id: String },

    /// A node refers to a parent that is not part of the snapshot
    #[error("Node {node_id} refers to missing parent {parent_id}")]
    DanglingParent { node_id: String, parent_id: String },

    /// Parent chain loops back on itself
    #[error("Cycle detected in parent chain involving node {node_id}")]
    CycleDetected { node_id: String },

    /// JSON could not be parsed or produced
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DiagramError {
    fn from(err: serde_json::Error) -> Self {
        DiagramError::Serialization(err.to_string())
    }
}

impl From<DiagramError> for ExError {
    fn from(err: DiagramError) -> Self {
        let message = err.to_string();
        match err {
            DiagramError::UnsupportedFormat { .. } => {
                ExError::new(ExErrorKind::UnsupportedFormat).with_message(message)
            }
            DiagramError::InvalidSnapshot { errors } => ExError::new(ExErrorKind::InvalidSnapshot)
                .with_message(message)
                .with_details(errors),
            DiagramError::Malformed { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            DiagramError::DuplicateId { node_id } => ExError::new(ExErrorKind::DuplicateId)
                .with_node_id(node_id)
                .with_message(message),
            DiagramError::DanglingParent { node_id, .. } => {
                ExError::new(ExErrorKind::DanglingParent)
                    .with_node_id(node_id)
                    .with_message(message)
            }
            DiagramError::CycleDetected { node_id } => ExError::new(ExErrorKind::CycleDetected)
                .with_node_id(node_id)
                .with_message(message),
            DiagramError::Serialization(_) => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}
