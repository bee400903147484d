use thiserror::Error;

/// One failed delivery attempt, recorded in the order the endpoint was tried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub detail: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("request validation failed: {0}")]
    Validation(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("all completion endpoints failed: {}", format_attempts(.0))]
    UpstreamExhausted(Vec<EndpointFailure>),
}

fn format_attempts(attempts: &[EndpointFailure]) -> String {
    if attempts.is_empty() {
        return "no endpoints were configured".to_string();
    }
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.endpoint, attempt.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::UpstreamUnavailable { .. } => {
                "The recommendation service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UpstreamUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl PipelineError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::UpstreamUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<PipelineError> for InterfaceError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::Validation(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            PipelineError::UpstreamExhausted(attempts) => Self::UpstreamUnavailable {
                message: format_attempts(&attempts),
                correlation_id: "unassigned".to_owned(),
            },
            PipelineError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
