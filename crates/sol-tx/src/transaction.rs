//! Transaction assembly, signing and the Solana wire format.
//!
//! We build legacy Solana transactions entirely by hand. The wire format:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! The life cycle is one-way: [`TransactionEnvelope::assemble`] orders and
//! compiles the instructions, [`TransactionEnvelope::sign`] consumes the
//! envelope and yields a [`SignedTransaction`], which can only be
//! serialized.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::address::{Address, Blockhash};
use crate::codec::{decode_compact_u16, put_compact_len, read_array32, read_u8};
use crate::error::TxError;
use crate::instruction::{Instruction, InstructionKind};
use crate::keypair::{Signature, Signer};
use crate::programs::ProgramIds;

/// Account indices are a single byte on the wire.
pub const MAX_ACCOUNTS: usize = 256;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// Number of required signatures (first N account keys are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    /// All account keys referenced by this message, in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<Address>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile instructions against a single fee payer.
    ///
    /// Accounts referenced more than once are merged, keeping the strongest
    /// signer/writable flags seen.
    pub fn compile(
        instructions: &[Instruction],
        fee_payer: &Address,
        recent_blockhash: Blockhash,
    ) -> Result<Self, TxError> {
        struct AccountEntry {
            pubkey: Address,
            is_signer: bool,
            is_writable: bool,
        }

        // Header counts are single bytes on the wire.
        fn header_count(
            entries: &[AccountEntry],
            what: &str,
            pred: impl Fn(&AccountEntry) -> bool,
        ) -> Result<u8, TxError> {
            let count = entries.iter().filter(|e| pred(e)).count();
            u8::try_from(count).map_err(|_| {
                TxError::ContractViolation(format!("{count} {what} accounts exceed 255"))
            })
        }

        // Instruction account lists are tiny; a linear scan beats hashing.
        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: Address, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        // Fee payer is always signer + writable.
        upsert(*fee_payer, true, true);

        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            // Program IDs are non-signer, read-only accounts.
            upsert(ix.program_id, false, false);
        }

        if entries.len() > MAX_ACCOUNTS {
            return Err(TxError::ContractViolation(format!(
                "{} accounts exceed the limit of {MAX_ACCOUNTS}",
                entries.len()
            )));
        }

        // Stable sort: the fee payer was inserted first with the lowest rank,
        // so it stays at index 0 and every category keeps insertion order.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        let header = MessageHeader {
            num_required_signatures: header_count(&entries, "signer", |e| e.is_signer)?,
            num_readonly_signed: header_count(&entries, "read-only signer", |e| {
                e.is_signer && !e.is_writable
            })?,
            num_readonly_unsigned: header_count(&entries, "read-only non-signer", |e| {
                !e.is_signer && !e.is_writable
            })?,
        };

        let account_keys: Vec<Address> = entries.iter().map(|e| e.pubkey).collect();
        let index_of = |key: &Address| -> Result<u8, TxError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| TxError::ContractViolation(format!("{key} not in account keys")))
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions {
            let account_indices = ix
                .accounts
                .iter()
                .map(|meta| index_of(&meta.pubkey))
                .collect::<Result<Vec<u8>, TxError>>()?;

            compiled.push(CompiledInstruction {
                program_id_index: index_of(&ix.program_id)?,
                account_indices,
                data: ix.data.clone(),
            });
        }

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// The accounts that must sign, in signature-slot order.
    pub fn signer_keys(&self) -> &[Address] {
        let n = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Whether the account at `index` is writable according to the header.
    pub fn is_writable(&self, index: usize) -> bool {
        let h = &self.header;
        let signers = h.num_required_signatures as usize;
        if index >= self.account_keys.len() {
            false
        } else if index < signers {
            index < signers.saturating_sub(h.num_readonly_signed as usize)
        } else {
            index < self.account_keys.len().saturating_sub(h.num_readonly_unsigned as usize)
        }
    }

    /// Serialize the message (the bytes that get signed).
    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let mut buf = Vec::with_capacity(256);

        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed);
        buf.push(self.header.num_readonly_unsigned);

        put_compact_len(&mut buf, self.account_keys.len())?;
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_bytes());
        }

        buf.extend_from_slice(self.recent_blockhash.as_bytes());

        put_compact_len(&mut buf, self.instructions.len())?;
        for ix in &self.instructions {
            buf.push(ix.program_id_index);

            put_compact_len(&mut buf, ix.account_indices.len())?;
            buf.extend_from_slice(&ix.account_indices);

            put_compact_len(&mut buf, ix.data.len())?;
            buf.extend_from_slice(&ix.data);
        }

        Ok(buf)
    }

    /// Parse a serialized message. The whole input must be consumed.
    pub fn deserialize(data: &[u8]) -> Result<Self, TxError> {
        let mut cursor = Cursor { data, pos: 0 };

        let header = MessageHeader {
            num_required_signatures: cursor.u8()?,
            num_readonly_signed: cursor.u8()?,
            num_readonly_unsigned: cursor.u8()?,
        };

        let num_accounts = cursor.compact_u16()? as usize;
        let mut account_keys = Vec::with_capacity(num_accounts);
        for _ in 0..num_accounts {
            account_keys.push(Address::new(cursor.array32()?));
        }
        if (header.num_required_signatures as usize) > num_accounts {
            return Err(TxError::Serialization(
                "more required signatures than account keys".into(),
            ));
        }

        let recent_blockhash = Blockhash::new(cursor.array32()?);

        let num_instructions = cursor.compact_u16()? as usize;
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_id_index = cursor.u8()?;
            let num_indices = cursor.compact_u16()? as usize;
            let account_indices = cursor.bytes(num_indices)?.to_vec();
            let data_len = cursor.compact_u16()? as usize;
            let ix_data = cursor.bytes(data_len)?.to_vec();

            let out_of_range = std::iter::once(&program_id_index)
                .chain(&account_indices)
                .any(|&i| i as usize >= num_accounts);
            if out_of_range {
                return Err(TxError::Serialization(
                    "instruction references an unknown account index".into(),
                ));
            }

            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data: ix_data,
            });
        }

        if cursor.pos != data.len() {
            return Err(TxError::Serialization(format!(
                "{} trailing bytes after message",
                data.len() - cursor.pos
            )));
        }

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Result<u8, TxError> {
        let v = read_u8(self.data, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    fn array32(&mut self) -> Result<[u8; 32], TxError> {
        let v = read_array32(self.data, self.pos)?;
        self.pos += 32;
        Ok(v)
    }

    fn compact_u16(&mut self) -> Result<u16, TxError> {
        let rest = self.data.get(self.pos..).unwrap_or_default();
        let (v, used) = decode_compact_u16(rest)?;
        self.pos += used;
        Ok(v)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], TxError> {
        let end = self.pos.saturating_add(len);
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| TxError::Serialization("unexpected end of message".into()))?;
        self.pos = end;
        Ok(slice)
    }
}

// ---------------------------------------------------------------------------
// Envelope (unsigned)
// ---------------------------------------------------------------------------

/// Position of an instruction kind inside an assembled transaction.
///
/// Compute budget first (limit, then price), account creation before the
/// instructions that use the new accounts, transfer before burn, native
/// transfer last. Unknown instructions sit with the transfers.
fn order_rank(kind: InstructionKind) -> u8 {
    match kind {
        InstructionKind::ComputeUnitLimit => 0,
        InstructionKind::ComputeUnitPrice => 1,
        InstructionKind::CreateAssociatedAccount => 2,
        InstructionKind::TokenTransfer | InstructionKind::Other => 3,
        InstructionKind::TokenBurn => 4,
        InstructionKind::NativeTransfer => 5,
    }
}

/// An ordered, compiled, not yet signed transaction.
#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    fee_payer: Address,
    instructions: Vec<Instruction>,
    message: Message,
}

impl TransactionEnvelope {
    /// Order `instructions`, attach the fee payer and blockhash, and compile
    /// the message.
    pub fn assemble(
        mut instructions: Vec<Instruction>,
        fee_payer: Address,
        recent_blockhash: Blockhash,
        programs: &ProgramIds,
    ) -> Result<Self, TxError> {
        if instructions.is_empty() {
            return Err(TxError::ContractViolation(
                "a transaction needs at least one instruction".into(),
            ));
        }

        instructions.sort_by_key(|ix| order_rank(ix.kind(programs)));
        let message = Message::compile(&instructions, &fee_payer, recent_blockhash)?;

        Ok(Self {
            fee_payer,
            instructions,
            message,
        })
    }

    pub fn fee_payer(&self) -> &Address {
        &self.fee_payer
    }

    pub fn recent_blockhash(&self) -> &Blockhash {
        &self.message.recent_blockhash
    }

    /// Instructions in their final order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Every address that has to provide a signature.
    pub fn required_signers(&self) -> &[Address] {
        self.message.signer_keys()
    }

    pub fn message_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.message.serialize()
    }

    /// Sign with exactly the required signer set.
    ///
    /// A missing, extra or duplicated signer is a contract violation; nothing
    /// is signed in that case.
    pub fn sign(self, signers: &[&dyn Signer]) -> Result<SignedTransaction, TxError> {
        let required = self.required_signers();
        let mut slots: Vec<Option<&dyn Signer>> = vec![None; required.len()];

        for &signer in signers {
            let pubkey = signer.pubkey();
            let index = required.iter().position(|k| *k == pubkey).ok_or_else(|| {
                TxError::ContractViolation(format!("{pubkey} is not a required signer"))
            })?;
            if slots[index].replace(signer).is_some() {
                return Err(TxError::ContractViolation(format!(
                    "{pubkey} supplied more than once"
                )));
            }
        }

        if let Some(missing) = slots.iter().position(Option::is_none) {
            return Err(TxError::ContractViolation(format!(
                "missing signer for {}",
                required[missing]
            )));
        }

        let message_bytes = self.message_bytes()?;
        let signatures = slots
            .into_iter()
            .flatten()
            .map(|signer| signer.try_sign_message(&message_bytes))
            .collect::<Result<Vec<Signature>, TxError>>()?;

        Ok(SignedTransaction {
            envelope: self,
            signatures,
        })
    }
}

// ---------------------------------------------------------------------------
// Signed transaction
// ---------------------------------------------------------------------------

/// A fully signed transaction, ready for `sendTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    envelope: TransactionEnvelope,
    signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The fee payer's signature, which doubles as the transaction id.
    pub fn signature(&self) -> &Signature {
        // The fee payer always occupies slot 0.
        &self.signatures[0]
    }

    /// Serialize into the wire format.
    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let message_bytes = self.envelope.message_bytes()?;

        let mut wire = Vec::with_capacity(3 + 64 * self.signatures.len() + message_bytes.len());
        put_compact_len(&mut wire, self.signatures.len())?;
        for sig in &self.signatures {
            wire.extend_from_slice(sig.as_bytes());
        }
        wire.extend_from_slice(&message_bytes);

        Ok(wire)
    }

    /// Serialize and encode as standard, padded base64 (the `sendTransaction`
    /// `encoding: "base64"` form).
    pub fn to_base64(&self) -> Result<String, TxError> {
        Ok(BASE64.encode(self.serialize()?))
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A transaction parsed back from its wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl DecodedTransaction {
    pub fn deserialize(wire: &[u8]) -> Result<Self, TxError> {
        let (num_sigs, prefix_len) = decode_compact_u16(wire)?;

        let sigs_end = prefix_len + num_sigs as usize * Signature::LEN;
        let sig_bytes = wire.get(prefix_len..sigs_end).ok_or_else(|| {
            TxError::Serialization("transaction too short: signature slots exceed length".into())
        })?;

        let signatures = sig_bytes
            .chunks_exact(Signature::LEN)
            .map(|chunk| {
                let mut arr = [0u8; 64];
                arr.copy_from_slice(chunk);
                Signature::new(arr)
            })
            .collect::<Vec<_>>();

        let message = Message::deserialize(&wire[sigs_end..])?;
        if signatures.len() != message.header.num_required_signatures as usize {
            return Err(TxError::Serialization(format!(
                "{} signatures for {} required signers",
                signatures.len(),
                message.header.num_required_signatures
            )));
        }

        Ok(Self {
            signatures,
            message,
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, TxError> {
        let wire = BASE64
            .decode(encoded)
            .map_err(|e| TxError::Serialization(format!("base64 decode failed: {e}")))?;
        Self::deserialize(&wire)
    }

    /// Check every signature against its signer key.
    pub fn verify_signatures(&self) -> Result<(), TxError> {
        let message_bytes = self.message.serialize()?;
        for (sig, key) in self.signatures.iter().zip(self.message.signer_keys()) {
            if !sig.verify(key, &message_bytes) {
                return Err(TxError::Signing(format!("invalid signature for {key}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{
        burn, create_associated_token_account, set_compute_unit_limit, set_compute_unit_price,
        transfer, transfer_native, AccountMeta,
    };
    use crate::keypair::Keypair;

    fn ids() -> ProgramIds {
        ProgramIds::default()
    }

    fn native_transfer_envelope(from: Address, to: Address) -> TransactionEnvelope {
        let ix = transfer_native(&ids(), &from, &to, 1000);
        TransactionEnvelope::assemble(vec![ix], from, Blockhash::new([0xAA; 32]), &ids()).unwrap()
    }

    // -- Compilation --------------------------------------------------------

    #[test]
    fn compiled_transaction_account_order() {
        let from = Address::new([1u8; 32]);
        let to = Address::new([2u8; 32]);
        let env = native_transfer_envelope(from, to);
        let msg = env.message();

        // from (signer+writable), to (writable), system program (read-only)
        assert_eq!(msg.account_keys, vec![from, to, ids().system]);
        assert_eq!(msg.header.num_required_signatures, 1);
        assert_eq!(msg.header.num_readonly_signed, 0);
        assert_eq!(msg.header.num_readonly_unsigned, 1);
        assert!(msg.is_writable(0));
        assert!(msg.is_writable(1));
        assert!(!msg.is_writable(2));
    }

    #[test]
    fn compiled_instruction_indices() {
        let from = Address::new([1u8; 32]);
        let to = Address::new([2u8; 32]);
        let env = native_transfer_envelope(from, to);

        let cix = &env.message().instructions[0];
        assert_eq!(cix.program_id_index, 2);
        assert_eq!(cix.account_indices, vec![0, 1]);
    }

    #[test]
    fn self_transfer_deduplicates_accounts() {
        let key = Address::new([0xAAu8; 32]);
        let env = native_transfer_envelope(key, key);

        assert_eq!(env.message().account_keys.len(), 2);
        assert_eq!(env.required_signers(), &[key]);
    }

    #[test]
    fn fee_payer_leads_even_when_not_referenced_first() {
        let owner = Address::new([3u8; 32]);
        let payer = Address::new([9u8; 32]);
        let ix = transfer(&ids(), &Address::new([1; 32]), &Address::new([2; 32]), &owner, 5);
        let env = TransactionEnvelope::assemble(vec![ix], payer, Blockhash::default(), &ids()).unwrap();

        assert_eq!(env.message().account_keys[0], payer);
        assert_eq!(env.required_signers(), &[payer, owner]);
        assert_eq!(env.message().header.num_readonly_signed, 1);
    }

    #[test]
    fn empty_instruction_list_is_rejected() {
        let result = TransactionEnvelope::assemble(Vec::new(), Address::default(), Blockhash::default(), &ids());
        assert!(matches!(result, Err(TxError::ContractViolation(_))));
    }

    #[test]
    fn too_many_accounts_are_rejected() {
        let payer = Address::new([0xFF; 32]);
        let instructions: Vec<Instruction> = (0..=255u8)
            .map(|i| {
                let mut recipient = [0x11u8; 32];
                recipient[0] = i;
                transfer_native(&ids(), &payer, &Address::new(recipient), 1)
            })
            .collect();
        // 256 recipients + payer + system program.
        let result = TransactionEnvelope::assemble(instructions, payer, Blockhash::default(), &ids());
        assert!(matches!(result, Err(TxError::ContractViolation(_))));
    }

    #[test]
    fn signer_count_overflow_is_rejected() {
        // The program id doubles as the fee payer, so 256 distinct signers fit
        // under the account limit without any read-only entry.
        let payer = Address::new([0xFF; 32]);
        let accounts = (0..255u8)
            .map(|i| {
                let mut key = [0x22u8; 32];
                key[0] = i;
                AccountMeta::readonly(Address::new(key), true)
            })
            .collect();
        let ix = Instruction {
            program_id: payer,
            accounts,
            data: vec![0],
        };

        let err = Message::compile(&[ix], &payer, Blockhash::default()).unwrap_err();
        assert_eq!(
            err,
            TxError::ContractViolation("256 signer accounts exceed 255".into())
        );
    }

    // -- Ordering -----------------------------------------------------------

    #[test]
    fn assemble_orders_by_kind() {
        let p = ids();
        let owner = Address::new([3u8; 32]);
        let mint = Address::new([4u8; 32]);
        let src = Address::new([5u8; 32]);
        let (create, dest) = create_associated_token_account(&p, &owner, &Address::new([6; 32]), &mint).unwrap();

        let shuffled = vec![
            transfer_native(&p, &owner, &Address::new([6; 32]), 10),
            burn(&p, &src, &mint, &owner, 2),
            transfer(&p, &src, &dest, &owner, 1),
            create.clone(),
            set_compute_unit_price(&p, 300_000),
            set_compute_unit_limit(&p, 462_000),
        ];
        let env = TransactionEnvelope::assemble(shuffled, owner, Blockhash::default(), &p).unwrap();

        let kinds: Vec<InstructionKind> = env.instructions().iter().map(|ix| ix.kind(&p)).collect();
        assert_eq!(
            kinds,
            vec![
                InstructionKind::ComputeUnitLimit,
                InstructionKind::ComputeUnitPrice,
                InstructionKind::CreateAssociatedAccount,
                InstructionKind::TokenTransfer,
                InstructionKind::TokenBurn,
                InstructionKind::NativeTransfer,
            ]
        );
        assert_eq!(env.instructions()[2], create);
    }

    // -- Serialization ------------------------------------------------------

    #[test]
    fn serialize_message_contains_blockhash() {
        let env = native_transfer_envelope(Address::new([1; 32]), Address::new([2; 32]));
        let msg = env.message_bytes().unwrap();

        assert_eq!(&msg[..3], &[1, 0, 1]);
        // header(3) + compact-u16(3) + 32 * 3 keys
        let offset = 3 + 1 + 32 * 3;
        assert_eq!(&msg[offset..offset + 32], &[0xAA; 32]);
    }

    #[test]
    fn message_roundtrips_through_deserialize() {
        let env = native_transfer_envelope(Address::new([1; 32]), Address::new([2; 32]));
        let bytes = env.message_bytes().unwrap();
        assert_eq!(&Message::deserialize(&bytes).unwrap(), env.message());
    }

    #[test]
    fn message_deserialize_rejects_trailing_and_truncated() {
        let env = native_transfer_envelope(Address::new([1; 32]), Address::new([2; 32]));
        let mut bytes = env.message_bytes().unwrap();

        assert!(Message::deserialize(&bytes[..bytes.len() - 1]).is_err());
        bytes.push(0);
        assert!(Message::deserialize(&bytes).is_err());
    }

    // -- Signing ------------------------------------------------------------

    #[test]
    fn signed_wire_bytes_verify() {
        let keypair = Keypair::from_seed(&[0x42u8; 32]);
        let env = native_transfer_envelope(keypair.pubkey(), Address::new([0xBB; 32]));
        let message = env.message_bytes().unwrap();

        let signed = env.sign(&[&keypair]).unwrap();
        let wire = signed.serialize().unwrap();

        // compact-u16(1), 64-byte signature, message.
        assert_eq!(wire[0], 0x01);
        assert_eq!(&wire[65..], &message[..]);
        assert!(signed.signature().verify(&keypair.pubkey(), &message));

        let decoded = DecodedTransaction::deserialize(&wire).unwrap();
        assert!(decoded.verify_signatures().is_ok());
        assert_eq!(decoded.signatures, signed.signatures());
    }

    #[test]
    fn base64_matches_wire_bytes() {
        let keypair = Keypair::from_seed(&[0x11u8; 32]);
        let signed = native_transfer_envelope(keypair.pubkey(), Address::new([2; 32]))
            .sign(&[&keypair])
            .unwrap();

        let text = signed.to_base64().unwrap();
        assert_eq!(BASE64.decode(&text).unwrap(), signed.serialize().unwrap());
        let decoded = DecodedTransaction::from_base64(&text).unwrap();
        assert_eq!(&decoded.message, signed.envelope().message());
    }

    #[test]
    fn signing_is_deterministic() {
        let keypair = Keypair::from_seed(&[0x55u8; 32]);
        let env = native_transfer_envelope(keypair.pubkey(), Address::new([0x77; 32]));
        let a = env.clone().sign(&[&keypair]).unwrap().serialize().unwrap();
        let b = env.sign(&[&keypair]).unwrap().serialize().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_signer_fails() {
        let payer = Keypair::from_seed(&[1u8; 32]);
        let owner = Keypair::from_seed(&[2u8; 32]);
        let ix = transfer(&ids(), &Address::new([5; 32]), &Address::new([6; 32]), &owner.pubkey(), 1);
        let env = TransactionEnvelope::assemble(vec![ix], payer.pubkey(), Blockhash::default(), &ids()).unwrap();

        let err = env.clone().sign(&[&payer]).unwrap_err();
        assert!(err.to_string().contains("missing signer"));
        assert!(env.sign(&[&payer, &owner]).is_ok());
    }

    #[test]
    fn extra_signer_fails() {
        let payer = Keypair::from_seed(&[1u8; 32]);
        let stranger = Keypair::from_seed(&[3u8; 32]);
        let env = native_transfer_envelope(payer.pubkey(), Address::new([2; 32]));

        let err = env.sign(&[&payer, &stranger]).unwrap_err();
        assert!(matches!(err, TxError::ContractViolation(_)));
        assert!(err.to_string().contains("not a required signer"));
    }

    #[test]
    fn duplicate_signer_fails() {
        let payer = Keypair::from_seed(&[1u8; 32]);
        let env = native_transfer_envelope(payer.pubkey(), Address::new([2; 32]));

        let err = env.sign(&[&payer, &payer]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn multi_signer_slots_follow_account_order() {
        let payer = Keypair::from_seed(&[1u8; 32]);
        let owner = Keypair::from_seed(&[2u8; 32]);
        let ix = transfer(&ids(), &Address::new([5; 32]), &Address::new([6; 32]), &owner.pubkey(), 1);
        let env = TransactionEnvelope::assemble(vec![ix], payer.pubkey(), Blockhash::default(), &ids()).unwrap();

        // Supply in reverse order; slots must still match account keys.
        let signed = env.sign(&[&owner, &payer]).unwrap();
        let decoded = DecodedTransaction::deserialize(&signed.serialize().unwrap()).unwrap();
        assert_eq!(decoded.signatures.len(), 2);
        assert!(decoded.verify_signatures().is_ok());
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let keypair = Keypair::from_seed(&[0x42u8; 32]);
        let signed = native_transfer_envelope(keypair.pubkey(), Address::new([2; 32]))
            .sign(&[&keypair])
            .unwrap();
        let mut wire = signed.serialize().unwrap();
        wire[10] ^= 0xFF;

        let decoded = DecodedTransaction::deserialize(&wire).unwrap();
        assert!(decoded.verify_signatures().is_err());
    }

    #[test]
    fn decode_rejects_truncated_wire() {
        assert!(DecodedTransaction::deserialize(&[]).is_err());
        assert!(DecodedTransaction::deserialize(&[0x01]).is_err());
        assert!(DecodedTransaction::from_base64("not base64!").is_err());
    }
}
