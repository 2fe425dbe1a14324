use crate::error::{ErrorKind, Result, RpcError};
use crate::types::RpcType;

/// The typed in-memory record of one RPC invocation.
///
/// `R` is the return type and `A` the decayed argument tuple. A pack is
/// created per call, travels through the adapter in both directions, and is
/// consumed once the caller has observed its outcome. The server mutates
/// `args` in place so by-reference mutations reach the client in the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedCall<R, A> {
    func_name: String,
    args: A,
    result: Option<R>,
    error: Option<RpcError>,
}

impl<R: RpcType, A> PackedCall<R, A> {
    pub fn new(func_name: impl Into<String>, args: A) -> Self {
        Self {
            func_name: func_name.into(),
            args,
            result: None,
            error: None,
        }
    }

    pub fn with_result(func_name: impl Into<String>, args: A, result: R) -> Self {
        Self {
            func_name: func_name.into(),
            args,
            result: Some(result),
            error: None,
        }
    }

    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    pub fn args(&self) -> &A {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut A {
        &mut self.args
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: R) {
        self.result = Some(result);
    }

    pub fn clear_result(&mut self) {
        self.result = None;
    }

    pub fn error(&self) -> Option<&RpcError> {
        self.error.as_ref()
    }

    /// Marks the call failed. An error with kind [`ErrorKind::None`] is
    /// treated as "no error".
    pub fn set_error(&mut self, error: RpcError) {
        if error.kind() == ErrorKind::None {
            self.error = None;
        } else {
            self.error = Some(error);
        }
    }

    /// A call succeeded iff no error is recorded and a result is present
    /// (unit-returning calls carry no result slot and only need the former).
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (R::UNIT.is_some() || self.result.is_some())
    }

    /// Consumes the pack, yielding the parsed argument tuple alongside the
    /// outcome. The client uses the tuple for out-parameter copy-back.
    pub fn into_parts(self) -> (A, Result<R>) {
        let Self {
            args,
            result,
            error,
            ..
        } = self;

        if let Some(error) = error {
            return (args, Err(error));
        }

        let outcome = match result {
            Some(result) => Ok(result),
            None => match R::UNIT {
                Some(unit) => Ok(unit),
                None => Err(RpcError::new(
                    ErrorKind::None,
                    "RPC call did not produce a result",
                )),
            },
        };

        (args, outcome)
    }

    /// The call's outcome: the result on success, the carried error otherwise.
    pub fn into_result(self) -> Result<R> {
        self.into_parts().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_call_is_not_successful() {
        let pack = PackedCall::<i32, (i32, i32)>::new("SimpleSum", (2, 3));
        assert!(!pack.is_success());
        assert!(pack.into_result().is_err());
    }

    #[test]
    fn result_makes_it_successful() {
        let mut pack = PackedCall::<i32, (i32, i32)>::new("SimpleSum", (2, 3));
        pack.set_result(5);
        assert!(pack.is_success());
        assert_eq!(pack.into_result().unwrap(), 5);
    }

    #[test]
    fn unit_calls_need_no_result() {
        let pack = PackedCall::<(), (Vec<i32>,)>::new("AddOneToEachRef", (vec![1],));
        assert!(pack.is_success());
        pack.into_result().unwrap();
    }

    #[test]
    fn error_wins_over_result() {
        let mut pack = PackedCall::<i32, ()>::with_result("GetMagicNum", (), 42);
        pack.set_error(RpcError::new(ErrorKind::RemoteExecution, "boom"));
        assert!(!pack.is_success());
        let err = pack.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteExecution);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn none_kind_clears_the_error() {
        let mut pack = PackedCall::<i32, ()>::with_result("GetMagicNum", (), 42);
        pack.set_error(RpcError::new(ErrorKind::RemoteExecution, "boom"));
        pack.set_error(RpcError::new(ErrorKind::None, ""));
        assert!(pack.is_success());
    }
}
