use crate::adapter::{ArgList, SerialAdapter};
use crate::error::{ErrorKind, Result, RpcError};
use crate::packed::PackedCall;
use crate::types::{CallArgs, RpcType};
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

/// Blocking byte transport supplied by the host.
///
/// The crate imposes no framing; `receive` must return exactly the reply
/// bytes produced by the server's dispatch of the preceding `send`.
pub trait ClientTransport {
    type Error: fmt::Display;

    fn send(&mut self, bytes: &[u8]) -> std::result::Result<(), Self::Error>;
    fn receive(&mut self) -> std::result::Result<Vec<u8>, Self::Error>;
}

/// Client-side call surface over a host transport and a serial adapter.
///
/// Not thread-safe and not reentrant: one in-flight call per instance.
pub struct RpcClient<S: SerialAdapter, T: ClientTransport> {
    transport: T,
    _adapter: PhantomData<S>,
}

impl<S: SerialAdapter, T: ClientTransport> RpcClient<S, T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            _adapter: PhantomData,
        }
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Invokes the remote function `func_name` with the given argument tuple
    /// and returns its result.
    ///
    /// Arguments are passed by reference and decay to owned wire values (see
    /// [`CallArg`](crate::CallArg)). After a successful round-trip, every
    /// `&mut` argument is overwritten with the value the server left in the
    /// corresponding slot. A failure at any stage surfaces as an
    /// [`RpcError`] whose kind names the failing stage.
    pub fn call_func<R, A>(&mut self, func_name: &str, args: A) -> Result<R>
    where
        R: RpcType,
        A: CallArgs,
        A::Owned: ArgList<S>,
    {
        let pack = PackedCall::<R, A::Owned>::new(func_name, args.to_owned_args());
        let obj = S::serialize_pack(&pack)?;
        let request = S::to_bytes(obj)?;
        trace!(func_name, len = request.len(), "sending RPC request");

        self.transport
            .send(&request)
            .map_err(|err| RpcError::new(ErrorKind::ClientSend, err.to_string()))?;

        let reply = self
            .transport
            .receive()
            .map_err(|err| RpcError::new(ErrorKind::ClientReceive, err.to_string()))?;
        trace!(func_name, len = reply.len(), "received RPC reply");

        let obj = S::from_bytes(&reply).ok_or_else(|| {
            RpcError::new(ErrorKind::ClientReceive, "Client received invalid RPC object")
        })?;

        // Error replies keep their original kind; there is nothing to copy
        // back since the server never ran (or never finished) the call.
        if let Some(error) = S::extract_exception(&obj) {
            return Err(error);
        }

        let pack: PackedCall<R, A::Owned> = S::deserialize_pack(&obj)?;
        let (parsed_args, outcome) = pack.into_parts();
        args.write_back(parsed_args);
        outcome
    }
}
