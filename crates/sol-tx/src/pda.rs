//! Program Derived Address (PDA) derivation.
//!
//! A PDA is `SHA-256(seeds || bump || program_id || "ProgramDerivedAddress")`
//! where the bump seed is searched from 255 downwards until the digest is NOT
//! a valid Ed25519 point. Associated token accounts are PDAs of the
//! associated-token program with seeds `[owner, token_program, mint]`.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::TxError;
use crate::programs::ProgramIds;

/// Maximum number of seeds, bump included.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derive the associated token account for an owner + mint pair.
///
/// Returns the address together with the bump seed that produced it.
pub fn derive_associated_token_address(
    owner: &Address,
    mint: &Address,
    programs: &ProgramIds,
) -> Result<(Address, u8), TxError> {
    find_program_address(
        &[owner.as_ref(), programs.token.as_ref(), mint.as_ref()],
        &programs.associated_token,
    )
}

/// Find a valid Program Derived Address for the given seeds and program.
///
/// Iterates bump seeds from 255 down to 0 and returns the first result that
/// is NOT a valid Ed25519 point.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), TxError> {
    // One slot is reserved for the bump.
    check_seeds(seeds, MAX_SEEDS - 1)?;

    for bump in (0u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, &[bump], program_id) {
            return Ok((address, bump));
        }
    }

    Err(TxError::DerivationExhausted)
}

/// Create a PDA from seeds that already include the bump.
///
/// Fails when the seeds are out of bounds or the digest happens to lie on the
/// curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Address) -> Result<Address, TxError> {
    check_seeds(seeds, MAX_SEEDS)?;

    try_create_program_address(seeds, &[], program_id).ok_or_else(|| {
        TxError::InvalidAddress("derived address lies on the ed25519 curve".into())
    })
}

fn check_seeds(seeds: &[&[u8]], max_seeds: usize) -> Result<(), TxError> {
    if seeds.len() > max_seeds {
        return Err(TxError::ContractViolation(format!(
            "at most {max_seeds} seeds allowed, got {}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(TxError::ContractViolation(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

/// Returns `Some(address)` if the derived point is OFF the Ed25519 curve,
/// `None` if it falls on the curve.
fn try_create_program_address(
    seeds: &[&[u8]],
    bump_seed: &[u8],
    program_id: &Address,
) -> Option<Address> {
    let mut hasher = Sha256::new();

    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump_seed);
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);

    let address = Address::new(hasher.finalize().into());

    if address.is_on_curve() {
        return None;
    }

    Some(address)
}
