use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("input missing: {what}")]
    InputMissing { what: String },
    #[error("collaborator unavailable: {name}: {reason}")]
    CollaboratorUnavailable { name: String, reason: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl EvalError {
    pub fn input_missing(what: impl Into<String>) -> Self {
        Self::InputMissing { what: what.into() }
    }

    pub fn unavailable(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
