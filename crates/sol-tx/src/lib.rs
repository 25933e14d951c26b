//! Solana transaction construction for SPL token transfers and burns.
//!
//! This crate covers instruction encoding, associated token account (PDA)
//! derivation, and legacy transaction assembly and signing, all without
//! pulling in `solana-sdk` (which drags in tokio and 200+ transitive
//! dependencies).
//!
//! The compact binary wire format is implemented by hand, using
//! `ed25519-dalek` for signing, `curve25519-dalek` for the off-curve check,
//! `bs58` for addresses and `base64` for the transport encoding. Nothing here
//! performs I/O.

pub mod address;
pub mod codec;
pub mod error;
pub mod instruction;
pub mod keypair;
pub mod pda;
pub mod programs;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use address::{validate_address, Address, Blockhash};
pub use error::TxError;
pub use instruction::{AccountMeta, Instruction, InstructionKind, TokenInstruction};
pub use keypair::{Keypair, Signature, Signer};
pub use pda::{derive_associated_token_address, find_program_address};
pub use programs::ProgramIds;
pub use transaction::{DecodedTransaction, Message, SignedTransaction, TransactionEnvelope};
