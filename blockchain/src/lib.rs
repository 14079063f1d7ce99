#![warn(clippy::missing_docs_in_private_items)]

//! Chain access for the conduit engine: the signing capability and the
//! read-only chain reader consumed by deposit reconciliation and transfer
//! resolution.

/// Chain errors.
pub mod errors;
/// Private key signer.
pub mod keys;
/// Read-only chain reader.
pub mod reader;
