//! Finds an owner's token account for a mint, or plans its creation.

use sol_tx::instruction::create_associated_token_account;
use sol_tx::{Address, Instruction, ProgramIds};
use tracing::{debug, warn};

use crate::error::TokenError;
use crate::ledger::{LedgerQuery, TokenAccountsLookup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociatedAccount {
    /// Already on the ledger.
    Existing(Address),
    /// Does not exist yet. `instruction` creates it at `address`.
    PendingCreation {
        instruction: Instruction,
        address: Address,
    },
}

impl AssociatedAccount {
    pub fn address(&self) -> &Address {
        match self {
            AssociatedAccount::Existing(address) => address,
            AssociatedAccount::PendingCreation { address, .. } => address,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AssociatedAccount::PendingCreation { .. })
    }

    pub fn into_parts(self) -> (Address, Option<Instruction>) {
        match self {
            AssociatedAccount::Existing(address) => (address, None),
            AssociatedAccount::PendingCreation {
                instruction,
                address,
            } => (address, Some(instruction)),
        }
    }
}

/// Look up `owner`'s token account for `mint`.
///
/// When the ledger reports several, the first one wins. When it reports none,
/// the canonical associated address is derived and a creation instruction
/// paid by `funder` is returned with it.
pub fn resolve<L: LedgerQuery + ?Sized>(
    ledger: &L,
    programs: &ProgramIds,
    funder: &Address,
    owner: &Address,
    mint: &Address,
) -> Result<AssociatedAccount, TokenError> {
    match ledger.get_token_accounts_by_owner(owner, mint)? {
        TokenAccountsLookup::Found(accounts) => {
            if accounts.len() > 1 {
                warn!(
                    %owner,
                    %mint,
                    count = accounts.len(),
                    "owner holds several token accounts for mint, using the first"
                );
            }
            let address = accounts
                .into_iter()
                .next()
                .ok_or_else(|| TokenError::UpstreamUnavailable("empty token account list".into()))?;
            debug!(%owner, %address, "token account exists");
            Ok(AssociatedAccount::Existing(address))
        }
        TokenAccountsLookup::NotFound => {
            let (instruction, address) =
                create_associated_token_account(programs, funder, owner, mint)?;
            debug!(%owner, %address, %funder, "token account missing, will create");
            Ok(AssociatedAccount::PendingCreation {
                instruction,
                address,
            })
        }
    }
}
