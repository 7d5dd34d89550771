use thiserror::Error;

/// Failures raised while turning a diagram document into a [`crate::graph::Network`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("malformed diagram XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("root element must be <mxGraphModel>, found <{0}>")]
    WrongRoot(String),

    #[error("edge '{id}' has no source attribute")]
    EdgeMissingSource { id: String },

    #[error("edge '{id}' has no target attribute")]
    EdgeMissingTarget { id: String },

    #[error("cell '{id}' has a style but no recognized shape=...; token was '{shape}'")]
    UnknownShape { id: String, shape: String },

    #[error("resource object '{id}' is missing a Name attribute")]
    ResourceMissingName { id: String },

    #[error("document contains no vertices")]
    EmptyNetwork,
}

impl BuildError {
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::Xml(_) => "B-XML",
            BuildError::WrongRoot(_) => "B-ROOT",
            BuildError::EdgeMissingSource { .. } => "B-EDGE-SRC",
            BuildError::EdgeMissingTarget { .. } => "B-EDGE-DST",
            BuildError::UnknownShape { .. } => "B-SHAPE",
            BuildError::ResourceMissingName { .. } => "B-RES-NAME",
            BuildError::EmptyNetwork => "B-EMPTY",
        }
    }
}

/// One structural violation found by the validator. Carries a short rule code
/// so callers can match on specific failure classes without string parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub rule: &'static str,
    pub node_id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "[{}] {} ({})", self.rule, self.message, id),
            None => write!(f, "[{}] {}", self.rule, self.message),
        }
    }
}

/// A network that failed validation. Carries every violation found, not just
/// the first — see the Validator's accumulate-all-errors contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("network failed validation with {} issue(s)", .0.len())]
pub struct ValidationError(pub Vec<ValidationIssue>);

impl ValidationError {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }
}

/// Internal invariant violations. Constructing one is a bug in this crate, not
/// a caller error — the scheduler never returns these, it logs and degrades.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("resource '{resource}' in-use count {in_use} exceeds capacity {capacity}")]
    ResourceOverCapacity {
        resource: String,
        in_use: usize,
        capacity: usize,
    },

    #[error("scheduler dispatched an event for unknown node '{0}'")]
    UnknownNode(String),
}

/// Failure modes of the `SimulationSubmit` external-collaborator seam.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("unsupported content type, expected application/json")]
    UnsupportedContentType,

    #[error("request body missing required field '{0}'")]
    MissingField(&'static str),
}

/// Failure modes of the `SimulationDeliver` external-collaborator seam.
#[derive(Debug, Error)]
pub enum DeliverError {
    #[error("callback delivery failed: {0}")]
    Transport(String),
}

/// Top-level failure of building and validating a network from a diagram.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
