#![warn(clippy::missing_docs_in_private_items)]

//! Primitives crate defines the base Conduit data types and utils shared by
//! every other crate in the workspace.

/// Base constants.
pub mod constants;
/// Base deserializers.
pub mod deserializers;
/// Base hashing functions.
pub mod hashing;
/// Deterministic channel and transfer identifier derivation.
pub mod identifiers;
/// Base trait implementations.
pub mod impls;
/// Canonical packing of protocol values.
pub mod packing;
/// Base serializers.
pub mod serializers;
/// Signature recovery utils.
pub mod signing;
#[cfg(test)]
mod tests;
/// Base traits.
pub mod traits;
/// Base types some of which are aliases from rust-web3.
pub mod types;
