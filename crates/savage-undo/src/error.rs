use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    /// Rejected at construction; the command never reaches a stack.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("property `{property}` not found on {type_name}")]
    PropertyNotFound {
        type_name: &'static str,
        property: String,
    },

    #[error("cannot assign {found} to property `{property}` of type {expected}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The target object was already borrowed when the command ran.
    #[error("target of property `{property}` is in use")]
    TargetInUse { property: String },

    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
