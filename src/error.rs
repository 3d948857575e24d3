use miette::Diagnostic;
use thiserror::Error;

/// Boxed error type carried by [`UpdateError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug, Diagnostic)]
pub enum OpayError {
    #[error("Accounter \"{0}\" has been registered")]
    #[diagnostic(
        code(opay::registry::already_registered),
        help("an asset id can be bound to a single accounter for the life of the process")
    )]
    AlreadyRegistered(String),

    #[error("Accounter \"{0}\" not found")]
    #[diagnostic(code(opay::registry::not_found), help("unsupported asset type"))]
    NotFound(String),

    #[error(transparent)]
    #[diagnostic(code(opay::accounter::update))]
    Update(#[from] UpdateError),

    #[error("Invalid time zone \"{name}\": offset {hours}h is out of range")]
    #[diagnostic(code(opay::order_id::time_zone), help("hour offset must be within -23..=23"))]
    InvalidTimeZone { name: String, hours: i32 },

    #[error("Invalid order id \"{0}\"")]
    #[diagnostic(code(opay::order_id::parse))]
    InvalidOrderId(String),

    #[error("Config error: {0}")]
    #[diagnostic(code(opay::config))]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OpayError>;

/// Failure reported by an accounter while adjusting a balance.
///
/// The inner error belongs to the handler; callers can recover it with
/// [`UpdateError::downcast_ref`] and decide whether to roll back.
#[derive(Error, Debug)]
#[error("Balance update failed: {0}")]
pub struct UpdateError(BoxError);

impl UpdateError {
    pub fn new<E: Into<BoxError>>(err: E) -> Self {
        Self(err.into())
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug, PartialEq)]
    #[error("ledger offline")]
    struct Offline;

    #[test]
    fn test_update_error_keeps_handler_error() {
        let err = UpdateError::new(Offline);
        assert_eq!(err.downcast_ref::<Offline>(), Some(&Offline));
        assert_eq!(err.to_string(), "Balance update failed: ledger offline");
    }

    #[test]
    fn test_update_error_from_message() {
        let err: OpayError = UpdateError::msg("frozen").into();
        assert!(matches!(err, OpayError::Update(_)));
        assert_eq!(err.to_string(), "Balance update failed: frozen");
    }

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            OpayError::AlreadyRegistered("usd".to_string()).to_string(),
            "Accounter \"usd\" has been registered"
        );
        assert_eq!(
            OpayError::NotFound("btc".to_string()).to_string(),
            "Accounter \"btc\" not found"
        );
    }
}
