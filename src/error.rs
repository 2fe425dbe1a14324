use thiserror::Error;

/// Closed set of failure categories used across the crate.
///
/// Each kind has a stable wire code carried in the `except_type` field of an
/// encoded reply. `None` (code 0) is the success sentinel and never appears
/// in a raised [`RpcError`] produced by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    None,
    FunctionNotFound,
    RemoteExecution,
    Serialization,
    Deserialization,
    SignatureMismatch,
    ClientSend,
    ClientReceive,
    ServerSend,
    ServerReceive,
}

impl ErrorKind {
    /// The integer code written to the wire.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::None => 0,
            ErrorKind::FunctionNotFound => 1,
            ErrorKind::RemoteExecution => 2,
            ErrorKind::Serialization => 3,
            ErrorKind::Deserialization => 4,
            ErrorKind::SignatureMismatch => 5,
            ErrorKind::ClientSend => 6,
            ErrorKind::ClientReceive => 7,
            ErrorKind::ServerSend => 8,
            ErrorKind::ServerReceive => 9,
        }
    }

    /// Inverse of [`ErrorKind::code`]. Codes outside the closed set yield `None`.
    pub fn from_code(code: i64) -> Option<ErrorKind> {
        Some(match code {
            0 => ErrorKind::None,
            1 => ErrorKind::FunctionNotFound,
            2 => ErrorKind::RemoteExecution,
            3 => ErrorKind::Serialization,
            4 => ErrorKind::Deserialization,
            5 => ErrorKind::SignatureMismatch,
            6 => ErrorKind::ClientSend,
            7 => ErrorKind::ClientReceive,
            8 => ErrorKind::ServerSend,
            9 => ErrorKind::ServerReceive,
            _ => return None,
        })
    }
}

/// An RPC failure: one [`ErrorKind`] plus a human-readable message.
///
/// The message travels over the wire verbatim in `err_mesg`; hosts that log
/// or display it should treat it as untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{mesg}")]
pub struct RpcError {
    kind: ErrorKind,
    mesg: String,
}

impl RpcError {
    pub fn new(kind: ErrorKind, mesg: impl Into<String>) -> Self {
        Self {
            kind,
            mesg: mesg.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.mesg
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=9 {
            let kind = ErrorKind::from_code(code).unwrap();
            assert_eq!(i64::from(kind.code()), code);
        }
        assert_eq!(ErrorKind::from_code(10), None);
        assert_eq!(ErrorKind::from_code(-1), None);
    }

    #[test]
    fn display_is_the_message() {
        let err = RpcError::new(ErrorKind::RemoteExecution, "divide by zero");
        assert_eq!(err.to_string(), "divide by zero");
        assert_eq!(err.kind(), ErrorKind::RemoteExecution);
    }
}
