//! Addresses of the on-chain programs the instruction builders target.
//!
//! The builders never reach for these constants directly: they take a
//! [`ProgramIds`] value so that a local validator or a fork with relocated
//! programs can be targeted without touching the code.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The System Program: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; 32]);

/// SPL Token Program: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Address = Address::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79,
    0xac, 0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff,
    0x00, 0xa9,
]);

/// Associated Token Account Program: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Address = Address::new([
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d,
    0x83, 0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9,
    0xf8, 0x59,
]);

/// Compute Budget Program: `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: Address = Address::new([
    0x03, 0x06, 0x46, 0x6f, 0xe5, 0x21, 0x17, 0x32, 0xff, 0xec, 0xad, 0xba, 0x72, 0xc3, 0x9b,
    0xe7, 0xbc, 0x8c, 0xe5, 0xbb, 0xc5, 0xf7, 0x12, 0x6b, 0x2c, 0x43, 0x9b, 0x3a, 0x40, 0x00,
    0x00, 0x00,
]);

/// The set of program addresses a transaction is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramIds {
    pub system: Address,
    pub token: Address,
    pub associated_token: Address,
    pub compute_budget: Address,
}

impl ProgramIds {
    /// The program addresses deployed on mainnet, devnet and testnet.
    pub const MAINNET: ProgramIds = ProgramIds {
        system: SYSTEM_PROGRAM_ID,
        token: TOKEN_PROGRAM_ID,
        associated_token: ASSOCIATED_TOKEN_PROGRAM_ID,
        compute_budget: COMPUTE_BUDGET_PROGRAM_ID,
    };
}

impl Default for ProgramIds {
    fn default() -> Self {
        Self::MAINNET
    }
}
