//! # Signature Verification Subsystem (MM-01)
//!
//! Stateless recovery of a signer address from a typed-data signature over a
//! fixed, ordered field tuple. Every `create_*` and `login_*`/`join_*` call in
//! the action workflow authenticates its caller through this crate before
//! anything is persisted.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure cryptographic logic, no I/O
//!   - `typed_data`: EIP-712 style struct hashing (domain separator, type
//!     hash, word encoding)
//!   - `actions`: one strongly-typed struct per action kind; field order is
//!     part of the wire contract and must stay bit-for-bit stable
//!   - `recovery`: secp256k1 public-key recovery and address derivation
//! - **`testing`**: signing helpers for unit and integration tests (clients
//!   sign over the exact same tuples)
//!
//! ## Security Notes
//!
//! - Verification is deterministic and pure: same inputs, same output.
//! - Callers MUST reject any request whose recovered address differs from the
//!   claimed wallet address, before any persistence occurs.

pub mod domain;
pub mod testing;

pub use domain::actions::{
    ApiPublish, CatalogCreate, MarketCreate, MarketJoin, MemberLogin, MemberRegister, TypedAction,
};
pub use domain::errors::SignatureError;
pub use domain::recovery::{address_from_pubkey, keccak256, recover_address, Signature65};
pub use domain::typed_data::{domain_separator, signing_digest};
pub use domain::SignatureVerifier;
