//! Instruction values and the builders for every instruction kind a token
//! transfer transaction needs.
//!
//! | Builder                           | Program          | Data                              |
//! |-----------------------------------|------------------|-----------------------------------|
//! | [`transfer`]                      | SPL Token        | `[3] amount:u64le`                |
//! | [`burn`]                          | SPL Token        | `[8] amount:u64le`                |
//! | [`create_associated_token_account`] | Associated Token | `[1]`                           |
//! | [`set_compute_unit_limit`]        | Compute Budget   | `[0x02] units:u32le`              |
//! | [`set_compute_unit_price`]        | Compute Budget   | `[0x03] micro_lamports:u64le`     |
//! | [`transfer_native`]               | System           | `2:u32le lamports:u64le`          |
//!
//! Amounts are raw base units. Scaling by the mint's decimals is the
//! caller's job.

use crate::address::Address;
use crate::codec::{put_u32_le, put_u64_le, put_u8, read_u64_le, read_u8};
use crate::error::TxError;
use crate::pda::derive_associated_token_address;
use crate::programs::ProgramIds;

/// Compute Budget `SetComputeUnitLimit` discriminant.
pub const SET_COMPUTE_UNIT_LIMIT_OPCODE: u8 = 0x02;

/// Compute Budget `SetComputeUnitPrice` discriminant.
pub const SET_COMPUTE_UNIT_PRICE_OPCODE: u8 = 0x03;

const ATA_CREATE_OPCODE: u8 = AssociatedTokenInstruction::Create as u8;
const ATA_CREATE_IDEMPOTENT_OPCODE: u8 = AssociatedTokenInstruction::CreateIdempotent as u8;

/// System Program `Transfer` instruction index (little-endian u32).
pub const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountMeta {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub const fn writable(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub const fn readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    /// Whether `address` appears in this instruction's account list.
    pub fn references(&self, address: &Address) -> bool {
        self.accounts.iter().any(|meta| meta.pubkey == *address)
    }

    /// Classify this instruction against a set of program addresses.
    pub fn kind(&self, programs: &ProgramIds) -> InstructionKind {
        let opcode = self.data.first().copied();

        if self.program_id == programs.compute_budget {
            match opcode {
                Some(SET_COMPUTE_UNIT_LIMIT_OPCODE) => InstructionKind::ComputeUnitLimit,
                Some(SET_COMPUTE_UNIT_PRICE_OPCODE) => InstructionKind::ComputeUnitPrice,
                _ => InstructionKind::Other,
            }
        } else if self.program_id == programs.associated_token {
            match opcode {
                // An empty payload is the legacy form of Create.
                None | Some(ATA_CREATE_OPCODE) | Some(ATA_CREATE_IDEMPOTENT_OPCODE) => {
                    InstructionKind::CreateAssociatedAccount
                }
                _ => InstructionKind::Other,
            }
        } else if self.program_id == programs.token {
            match opcode.map(TokenInstruction::try_from) {
                Some(Ok(TokenInstruction::Transfer)) => InstructionKind::TokenTransfer,
                Some(Ok(TokenInstruction::Burn)) => InstructionKind::TokenBurn,
                _ => InstructionKind::Other,
            }
        } else if self.program_id == programs.system
            && self.data.get(..4) == Some(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes()[..])
        {
            InstructionKind::NativeTransfer
        } else {
            InstructionKind::Other
        }
    }
}

/// The instruction kinds a transaction assembler knows how to order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    ComputeUnitLimit,
    ComputeUnitPrice,
    CreateAssociatedAccount,
    TokenTransfer,
    TokenBurn,
    NativeTransfer,
    Other,
}

/// SPL Token program instruction discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenInstruction {
    InitializeMint = 0,
    InitializeAccount = 1,
    InitializeMultisig = 2,
    Transfer = 3,
    Approve = 4,
    Revoke = 5,
    SetAuthority = 6,
    MintTo = 7,
    Burn = 8,
    CloseAccount = 9,
    FreezeAccount = 10,
    ThawAccount = 11,
    TransferChecked = 12,
    ApproveChecked = 13,
    MintToChecked = 14,
    BurnChecked = 15,
    InitializeAccount2 = 16,
    SyncNative = 17,
    InitializeAccount3 = 18,
    InitializeMultisig2 = 19,
    InitializeMint2 = 20,
    GetAccountDataSize = 21,
    InitializeImmutableOwner = 22,
    AmountToUiAmount = 23,
    UiAmountToAmount = 24,
    InitializeMintCloseAuthority = 25,
    TransferFeeExtension = 26,
    ConfidentialTransferExtension = 27,
    DefaultAccountStateExtension = 28,
    Reallocate = 29,
    MemoTransferExtension = 30,
    CreateNativeMint = 31,
    InitializeNonTransferableMint = 32,
    InterestBearingMintExtension = 33,
    CpiGuardExtension = 34,
    InitializePermanentDelegate = 35,
    TransferHookExtension = 36,
    MetadataPointerExtension = 39,
    GroupPointerExtension = 40,
    GroupMemberPointerExtension = 41,
}

impl TryFrom<u8> for TokenInstruction {
    type Error = TxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use TokenInstruction::*;

        let ix = match value {
            0 => InitializeMint,
            1 => InitializeAccount,
            2 => InitializeMultisig,
            3 => Transfer,
            4 => Approve,
            5 => Revoke,
            6 => SetAuthority,
            7 => MintTo,
            8 => Burn,
            9 => CloseAccount,
            10 => FreezeAccount,
            11 => ThawAccount,
            12 => TransferChecked,
            13 => ApproveChecked,
            14 => MintToChecked,
            15 => BurnChecked,
            16 => InitializeAccount2,
            17 => SyncNative,
            18 => InitializeAccount3,
            19 => InitializeMultisig2,
            20 => InitializeMint2,
            21 => GetAccountDataSize,
            22 => InitializeImmutableOwner,
            23 => AmountToUiAmount,
            24 => UiAmountToAmount,
            25 => InitializeMintCloseAuthority,
            26 => TransferFeeExtension,
            27 => ConfidentialTransferExtension,
            28 => DefaultAccountStateExtension,
            29 => Reallocate,
            30 => MemoTransferExtension,
            31 => CreateNativeMint,
            32 => InitializeNonTransferableMint,
            33 => InterestBearingMintExtension,
            34 => CpiGuardExtension,
            35 => InitializePermanentDelegate,
            36 => TransferHookExtension,
            39 => MetadataPointerExtension,
            40 => GroupPointerExtension,
            41 => GroupMemberPointerExtension,
            other => {
                return Err(TxError::Serialization(format!(
                    "unknown token instruction {other}"
                )))
            }
        };
        Ok(ix)
    }
}

/// Associated Token Account program instruction discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssociatedTokenInstruction {
    Create = 0,
    /// Succeeds without changes when the account already exists.
    CreateIdempotent = 1,
    RecoverNested = 2,
}

// ---------------------------------------------------------------------------
// SPL Token
// ---------------------------------------------------------------------------

/// Encode `[opcode][amount: u64 LE]`, the layout shared by Transfer and Burn.
fn amount_payload(opcode: TokenInstruction, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(9);
    put_u8(&mut data, opcode as u8);
    put_u64_le(&mut data, amount);
    data
}

/// Build an SPL Token `Transfer` instruction.
///
/// Moves `amount` base units from `source` to `destination`, both token
/// accounts of the same mint. `owner` must sign.
pub fn transfer(
    programs: &ProgramIds,
    source: &Address,
    destination: &Address,
    owner: &Address,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: programs.token,
        accounts: vec![
            AccountMeta::writable(*source, false),
            AccountMeta::writable(*destination, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: amount_payload(TokenInstruction::Transfer, amount),
    }
}

/// Build an SPL Token `Burn` instruction.
///
/// Destroys `amount` base units held in `account`; the mint is writable
/// because its supply shrinks.
pub fn burn(
    programs: &ProgramIds,
    account: &Address,
    mint: &Address,
    owner: &Address,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: programs.token,
        accounts: vec![
            AccountMeta::writable(*account, false),
            AccountMeta::writable(*mint, false),
            AccountMeta::readonly(*owner, true),
        ],
        data: amount_payload(TokenInstruction::Burn, amount),
    }
}

/// Decode a Transfer/Burn style payload back into its opcode and amount.
pub fn decode_amount_instruction(data: &[u8]) -> Result<(TokenInstruction, u64), TxError> {
    if data.len() != 9 {
        return Err(TxError::Serialization(format!(
            "amount instruction must be 9 bytes, got {}",
            data.len()
        )));
    }
    let opcode = TokenInstruction::try_from(read_u8(data, 0)?)?;
    let amount = read_u64_le(data, 1)?;
    Ok((opcode, amount))
}

// ---------------------------------------------------------------------------
// Associated Token Account
// ---------------------------------------------------------------------------

/// Build the instruction that creates `owner`'s associated token account for
/// `mint`, paid for by `funder`.
///
/// Returns the instruction together with the address the account will have.
pub fn create_associated_token_account(
    programs: &ProgramIds,
    funder: &Address,
    owner: &Address,
    mint: &Address,
) -> Result<(Instruction, Address), TxError> {
    let (associated, _bump) = derive_associated_token_address(owner, mint, programs)?;

    let instruction = Instruction {
        program_id: programs.associated_token,
        accounts: vec![
            AccountMeta::writable(*funder, true),
            AccountMeta::writable(associated, false),
            AccountMeta::readonly(*owner, false),
            AccountMeta::readonly(*mint, false),
            AccountMeta::readonly(programs.system, false),
            AccountMeta::readonly(programs.token, false),
            AccountMeta::readonly(programs.associated_token, false),
        ],
        data: vec![AssociatedTokenInstruction::CreateIdempotent as u8],
    };

    Ok((instruction, associated))
}

// ---------------------------------------------------------------------------
// Compute Budget
// ---------------------------------------------------------------------------

/// Cap the compute units the transaction may consume.
pub fn set_compute_unit_limit(programs: &ProgramIds, units: u32) -> Instruction {
    let mut data = Vec::with_capacity(5);
    put_u8(&mut data, SET_COMPUTE_UNIT_LIMIT_OPCODE);
    put_u32_le(&mut data, units);

    Instruction {
        program_id: programs.compute_budget,
        accounts: Vec::new(),
        data,
    }
}

/// Set the priority fee, in micro-lamports per compute unit.
pub fn set_compute_unit_price(programs: &ProgramIds, micro_lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(9);
    put_u8(&mut data, SET_COMPUTE_UNIT_PRICE_OPCODE);
    put_u64_le(&mut data, micro_lamports);

    Instruction {
        program_id: programs.compute_budget,
        accounts: Vec::new(),
        data,
    }
}

// ---------------------------------------------------------------------------
// System Program
// ---------------------------------------------------------------------------

/// Build a System Program `Transfer` instruction moving native lamports.
pub fn transfer_native(
    programs: &ProgramIds,
    from: &Address,
    to: &Address,
    lamports: u64,
) -> Instruction {
    // u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    put_u32_le(&mut data, SYSTEM_TRANSFER_IX_INDEX);
    put_u64_le(&mut data, lamports);

    Instruction {
        program_id: programs.system,
        accounts: vec![
            AccountMeta::writable(*from, true),
            AccountMeta::writable(*to, false),
        ],
        data,
    }
}
