//! Typed access to the cryptotool.
//!
//! [`Cryptotool`] turns each operation into one process run: it builds the
//! command, hands it to the [`ProcessInvoker`](cryptobridge_exec::ProcessInvoker),
//! rejects failed runs, and decodes the answer. [`IssuerCryptotool`] binds an
//! executor to a certificate issuer so issuer-signed operations need only
//! their payload.

pub mod executor;
pub mod issuer;

pub use executor::Cryptotool;
pub use issuer::IssuerCryptotool;
