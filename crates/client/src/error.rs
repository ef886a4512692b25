use gatelink_protocol::ErrorCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Connect, send or read failed, including timeouts.
    #[error("gateway unreachable ({endpoint}): {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },

    /// The gateway answered with a status/code we do not absorb.
    #[error("gateway refused {endpoint}: HTTP {status}{}", describe_code(.code.as_ref(), .message))]
    Protocol {
        endpoint: &'static str,
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    /// The registration secret was rotated; a fresh one has been fetched.
    #[error("gateway rejected the registration credential")]
    CredentialRejected,

    #[error("heartbeat for service '{0}' is already running")]
    HeartbeatAlreadyRunning(String),

    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    pub(crate) fn transport(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Error code carried by a protocol failure, if any.
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Protocol { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

impl From<gatelink_credentials::CredentialError> for GatewayError {
    fn from(e: gatelink_credentials::CredentialError) -> Self {
        Self::Config(e.to_string())
    }
}

fn describe_code(code: Option<&ErrorCode>, message: &str) -> String {
    match (code, message.is_empty()) {
        (Some(code), false) => format!(" (code {code}: {message})"),
        (Some(code), true) => format!(" (code {code})"),
        (None, false) => format!(" ({message})"),
        (None, true) => String::new(),
    }
}
