//! Call named functions in another process as if they were local.
//!
//! The crate is transport-agnostic: the host supplies blocking
//! [`send`](ClientTransport::send)/[`receive`](ClientTransport::receive).
//! It is also serialization-agnostic: every encoding decision lives behind
//! the [`SerialAdapter`] capability, and
//! [`JsonAdapter`](adapters::JsonAdapter) is the bundled reference
//! implementation.
//!
//! A server binds plain functions by name and turns request bytes into reply
//! bytes; a client packs a typed call, ships it through the transport, and
//! rebuilds the result (including mutations to `&mut` arguments):
//!
//! ```no_run
//! use packrpc::{adapters::JsonAdapter, ClientTransport, RpcClient, RpcServer};
//! # struct Pipe;
//! # impl ClientTransport for Pipe {
//! #     type Error = String;
//! #     fn send(&mut self, _: &[u8]) -> Result<(), String> { Ok(()) }
//! #     fn receive(&mut self) -> Result<Vec<u8>, String> { Ok(vec![]) }
//! # }
//!
//! fn simple_sum(a: &mut i32, b: &mut i32) -> Result<i32, String> {
//!     Ok(*a + *b)
//! }
//!
//! let mut server = RpcServer::<JsonAdapter>::new();
//! server.bind("SimpleSum", simple_sum);
//! // reply = server.dispatch(&request);
//!
//! let mut client = RpcClient::<JsonAdapter, Pipe>::new(Pipe);
//! let sum: i32 = client.call_func("SimpleSum", (&2, &3)).unwrap();
//! ```

mod adapter;
pub mod adapters;
mod client;
mod error;
mod macros;
mod packed;
mod server;
mod types;

pub use adapter::{ArgList, SerialAdapter};
pub use client::{ClientTransport, RpcClient};
pub use error::{ErrorKind, Result, RpcError};
pub use packed::PackedCall;
pub use server::{FuncCache, Handler, RpcServer};
pub use types::{CallArg, CallArgs, RpcType, Shape};
