//! Process invocation engine for the cryptotool bridge.
//!
//! [`ProcessInvoker`] launches one cryptotool process per call, drains its
//! stdout and stderr concurrently so a chatty child can never stall on a
//! full pipe, bounds the whole run with a deadline, and returns the raw
//! [`ProcessResult`](cryptobridge_types::ProcessResult). It knows nothing
//! about command semantics.

pub mod invoker;

pub use invoker::ProcessInvoker;
