//! The transfer and transfer-with-burn workflows.
//!
//! Each call resolves both token accounts, fetches a fresh blockhash, builds
//! the instruction list, assembles and signs it. No state is kept between
//! calls.

use sol_tx::instruction::{
    burn, set_compute_unit_limit, set_compute_unit_price, transfer, transfer_native,
};
use sol_tx::{Address, Instruction, Keypair, Signature, Signer, TransactionEnvelope};
use tracing::{debug, debug_span, info};

use crate::config::Config;
use crate::error::TokenError;
use crate::ledger::LedgerQuery;
use crate::resolver::resolve;
use crate::response::TransactionResponse;

/// A signed transaction ready for `sendTransaction`.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    /// Standard base64 of the wire bytes.
    pub base64: String,
    pub bytes: Vec<u8>,
    /// Fee payer signature, which is also the transaction id.
    pub signature: Signature,
    /// Instructions in their final order.
    pub instructions: Vec<Instruction>,
}

impl PreparedTransaction {
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Amounts {
    send: u64,
    burn: u64,
    native_lamports: u64,
}

pub struct TokenClient<L> {
    config: Config,
    ledger: L,
}

impl<L: LedgerQuery> TokenClient<L> {
    pub fn new(config: Config, ledger: L) -> Self {
        Self { config, ledger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Move `amount` base units of the configured mint from `sender` to
    /// `destination`'s token account, creating accounts as needed.
    pub fn prepare_transfer(
        &self,
        sender: &dyn Signer,
        destination: &Address,
        amount: u64,
    ) -> Result<PreparedTransaction, TokenError> {
        let _span = debug_span!("prepare_transfer", %destination, amount).entered();
        self.prepare(
            sender,
            destination,
            Amounts {
                send: amount,
                burn: 0,
                native_lamports: 0,
            },
        )
    }

    /// Like [`prepare_transfer`](Self::prepare_transfer), then burn
    /// `burn_amount` from the sender's own token account and, when
    /// `native_lamports > 0`, send that many lamports to `destination`.
    /// A zero `burn_amount` leaves the burn instruction out.
    ///
    /// Fails with [`TokenError::InsufficientRentExemption`] when the native
    /// amount is below the rent-exemption minimum; nothing is signed then.
    pub fn prepare_transfer_with_burn(
        &self,
        sender: &dyn Signer,
        destination: &Address,
        send_amount: u64,
        burn_amount: u64,
        native_lamports: u64,
    ) -> Result<PreparedTransaction, TokenError> {
        let _span = debug_span!(
            "prepare_transfer_with_burn",
            %destination,
            send_amount,
            burn_amount,
            native_lamports
        )
        .entered();
        self.prepare(
            sender,
            destination,
            Amounts {
                send: send_amount,
                burn: burn_amount,
                native_lamports,
            },
        )
    }

    /// String-level transfer: Base58 secret key plus wallet addresses in,
    /// flat response out.
    pub fn transfer_response(
        &self,
        secret_key: &str,
        sender_wallet: &str,
        destination_wallet: &str,
        amount: u64,
    ) -> TransactionResponse {
        let result = signer_for_wallet(secret_key, sender_wallet).and_then(|sender| {
            let destination = parse_wallet(destination_wallet)?;
            self.prepare_transfer(&sender, &destination, amount)
        });
        TransactionResponse::from_transfer(result)
    }

    pub fn transfer_with_burn_response(
        &self,
        secret_key: &str,
        sender_wallet: &str,
        destination_wallet: &str,
        send_amount: u64,
        burn_amount: u64,
        native_lamports: u64,
    ) -> TransactionResponse {
        let result = signer_for_wallet(secret_key, sender_wallet).and_then(|sender| {
            let destination = parse_wallet(destination_wallet)?;
            self.prepare_transfer_with_burn(
                &sender,
                &destination,
                send_amount,
                burn_amount,
                native_lamports,
            )
        });
        TransactionResponse::from_transfer_with_burn(result)
    }

    fn prepare(
        &self,
        sender: &dyn Signer,
        destination: &Address,
        amounts: Amounts,
    ) -> Result<PreparedTransaction, TokenError> {
        let programs = &self.config.programs;
        let mint = &self.config.mint;
        let payer = sender.pubkey();

        // 1. Token accounts, both funded by the sender when missing.
        let (source, create_source) =
            resolve(&self.ledger, programs, &payer, &payer, mint)?.into_parts();
        let (target, create_target) =
            resolve(&self.ledger, programs, &payer, destination, mint)?.into_parts();

        // 2. Freshness token.
        let blockhash = self.ledger.get_latest_blockhash()?;
        debug!(%source, %target, %blockhash, "accounts resolved");

        // 3. Instruction list.
        let budget = self.config.compute_budget;
        let mut instructions = vec![
            set_compute_unit_limit(programs, budget.unit_limit),
            set_compute_unit_price(programs, budget.unit_price_micro_lamports),
        ];
        instructions.extend(create_source);
        if target != source {
            instructions.extend(create_target);
        }
        instructions.push(transfer(programs, &source, &target, &payer, amounts.send));
        if amounts.burn > 0 {
            instructions.push(burn(programs, &source, mint, &payer, amounts.burn));
        }
        if amounts.native_lamports > 0 {
            // 4. Guard.
            self.ensure_rent_exempt(amounts.native_lamports)?;
            instructions.push(transfer_native(
                programs,
                &payer,
                destination,
                amounts.native_lamports,
            ));
        }

        // 5. Assemble, sign, encode.
        let envelope = TransactionEnvelope::assemble(instructions, payer, blockhash, programs)?;
        let signed = envelope.sign(&[sender])?;
        let bytes = signed.serialize()?;
        let base64 = signed.to_base64()?;
        let signature = *signed.signature();
        let instructions = signed.envelope().instructions().to_vec();

        info!(
            %signature,
            instructions = instructions.len(),
            size = bytes.len(),
            "transaction prepared"
        );

        Ok(PreparedTransaction {
            base64,
            bytes,
            signature,
            instructions,
        })
    }

    fn ensure_rent_exempt(&self, lamports: u64) -> Result<(), TokenError> {
        let minimum = self
            .ledger
            .get_minimum_balance_for_rent_exemption(self.config.rent_probe_len)?;
        if lamports < minimum {
            debug!(lamports, minimum, "native amount below rent exemption");
            return Err(TokenError::InsufficientRentExemption {
                requested: lamports,
                minimum,
            });
        }
        Ok(())
    }
}

fn parse_wallet(wallet: &str) -> Result<Address, TokenError> {
    Ok(wallet.parse::<Address>()?)
}

/// Decode a Base58 secret key and check it belongs to `wallet`.
fn signer_for_wallet(secret_key: &str, wallet: &str) -> Result<Keypair, TokenError> {
    let keypair = Keypair::from_base58_string(secret_key)?;
    let wallet = parse_wallet(wallet)?;
    if keypair.pubkey() != wallet {
        return Err(TokenError::ContractViolation(format!(
            "secret key belongs to {}, not {wallet}",
            keypair.pubkey()
        )));
    }
    Ok(keypair)
}
