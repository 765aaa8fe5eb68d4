//! Versioned transaction decoder.
//!
//! # Wire layout (version 0)
//!
//! ```text
//! version   compact u8      only 0 is defined
//! principal [24]            paying account
//! method    compact u8      0 = spawn, 16 = spend, 17 = drain vault
//! template  [24]            only when method = spawn
//! nonce     compact u64
//! gas_price compact u64
//! args      template/method specific
//! sigs      n × [64]        n ≥ 1; n > 1 on a spend means multisig
//! ```

use parity_scale_codec::{Compact, Encode};
use serde::Serialize;

use crate::address::{compute_principal, Address, PublicKey, SIGNATURE_LENGTH};
use crate::error::DecodeError;
use crate::scale::ScaleReader;
use crate::template::{Method, Template};

/// Only transaction version understood by this decoder.
pub const SUPPORTED_VERSION: u8 = 0;
/// Maximum number of public keys in multisig/vesting spawn arguments.
pub const MAX_PUBLIC_KEYS: usize = 10;

/// Typed payload of a decoded transaction, one variant per dispatch row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxContents {
    SingleSigSpawn {
        public_key: PublicKey,
    },
    MultiSigSpawn {
        required: u8,
        public_keys: Vec<PublicKey>,
    },
    VestingSpawn {
        required: u8,
        public_keys: Vec<PublicKey>,
    },
    VaultSpawn {
        owner: Address,
        total_amount: u64,
        initial_unlock_amount: u64,
        vesting_start: u32,
        vesting_end: u32,
    },
    Send {
        destination: Address,
        amount: u64,
    },
    MultiSigSend {
        destination: Address,
        amount: u64,
    },
    DrainVault {
        vault: Address,
        destination: Address,
        amount: u64,
    },
}

impl TxContents {
    /// Template the arguments belong to.
    pub fn template(&self) -> Template {
        match self {
            Self::SingleSigSpawn { .. } | Self::Send { .. } | Self::MultiSigSend { .. } => {
                Template::Wallet
            }
            Self::MultiSigSpawn { .. } => Template::MultiSig,
            Self::VestingSpawn { .. } | Self::DrainVault { .. } => Template::Vesting,
            Self::VaultSpawn { .. } => Template::Vault,
        }
    }

    pub fn is_spawn(&self) -> bool {
        matches!(
            self,
            Self::SingleSigSpawn { .. }
                | Self::MultiSigSpawn { .. }
                | Self::VestingSpawn { .. }
                | Self::VaultSpawn { .. }
        )
    }

    /// SCALE encoding of the argument fields, exactly as they appear on the
    /// wire.
    pub fn encode_args(&self) -> Vec<u8> {
        match self {
            Self::SingleSigSpawn { public_key } => public_key.encode(),
            Self::MultiSigSpawn {
                required,
                public_keys,
            }
            | Self::VestingSpawn {
                required,
                public_keys,
            } => (Compact(*required), public_keys).encode(),
            Self::VaultSpawn {
                owner,
                total_amount,
                initial_unlock_amount,
                vesting_start,
                vesting_end,
            } => (
                owner,
                Compact(*total_amount),
                Compact(*initial_unlock_amount),
                Compact(*vesting_start),
                Compact(*vesting_end),
            )
                .encode(),
            Self::Send {
                destination,
                amount,
            }
            | Self::MultiSigSend {
                destination,
                amount,
            } => (destination, Compact(*amount)).encode(),
            Self::DrainVault {
                vault,
                destination,
                amount,
            } => (vault, destination, Compact(*amount)).encode(),
        }
    }

    /// Address of the account a spawn creates; `None` for non-spawn payloads.
    pub fn spawn_principal(&self) -> Option<Address> {
        self.is_spawn()
            .then(|| compute_principal(&self.template().address(), &self.encode_args()))
    }
}

/// A fully decoded transaction. Only ever constructed by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTransaction {
    pub version: u8,
    pub method: Method,
    /// Template resolved from the wire or implied by the method.
    pub template: Template,
    pub principal: Address,
    pub nonce: u64,
    pub gas_price: u64,
    pub contents: TxContents,
    /// Number of trailing signature blocks.
    pub signatures: usize,
}

/// Decode a raw transaction.
///
/// Signatures are counted, not verified. A spend is reported as
/// [`TxContents::MultiSigSend`] only when more than one signature block
/// follows the arguments, so a multisig spend cut exactly at a signature
/// boundary decodes as a plain [`TxContents::Send`] with fewer signatures.
/// Callers that need to tell the two apart reliably must check
/// [`DecodedTransaction::signatures`] against the principal's key set.
pub fn decode(raw: &[u8]) -> Result<DecodedTransaction, DecodeError> {
    let mut r = ScaleReader::new(raw);

    let version = r.read_compact::<u8>("version")?;
    if version != SUPPORTED_VERSION {
        return Err(DecodeError::UnsupportedVersion { version });
    }

    let principal = r.read::<Address>("principal")?;

    let selector = r.read_compact::<u8>("method")?;
    let method =
        Method::from_selector(selector).ok_or(DecodeError::UnknownMethod { method: selector })?;

    let template = match method.implied_template() {
        Some(t) => t,
        None => {
            let address = r.read::<Address>("template")?;
            Template::lookup(&address).ok_or(DecodeError::UnknownTemplate {
                template: address,
                method: selector,
            })?
        }
    };

    let nonce = r.read_compact::<u64>("nonce")?;
    let gas_price = r.read_compact::<u64>("gas_price")?;

    // Spend and DrainVault always carry their implied template, so only
    // spawns dispatch on it.
    let contents = match method {
        Method::Spawn => match template {
            Template::Wallet => TxContents::SingleSigSpawn {
                public_key: r.read("public_key")?,
            },
            Template::MultiSig => TxContents::MultiSigSpawn {
                required: r.read_compact::<u8>("required")?,
                public_keys: r.read_public_keys("public_keys", MAX_PUBLIC_KEYS)?,
            },
            Template::Vesting => TxContents::VestingSpawn {
                required: r.read_compact::<u8>("required")?,
                public_keys: r.read_public_keys("public_keys", MAX_PUBLIC_KEYS)?,
            },
            Template::Vault => TxContents::VaultSpawn {
                owner: r.read("owner")?,
                total_amount: r.read_compact::<u64>("total_amount")?,
                initial_unlock_amount: r.read_compact::<u64>("initial_unlock_amount")?,
                vesting_start: r.read_compact::<u32>("vesting_start")?,
                vesting_end: r.read_compact::<u32>("vesting_end")?,
            },
        },
        // Single vs multi signer is settled once the signatures are counted.
        Method::Spend => TxContents::Send {
            destination: r.read("destination")?,
            amount: r.read_compact::<u64>("amount")?,
        },
        Method::DrainVault => TxContents::DrainVault {
            vault: r.read("vault")?,
            destination: r.read("destination")?,
            amount: r.read_compact::<u64>("amount")?,
        },
    };

    let signatures = read_signatures(&mut r)?;

    let contents = match contents {
        TxContents::Send {
            destination,
            amount,
        } if signatures > 1 => TxContents::MultiSigSend {
            destination,
            amount,
        },
        other => other,
    };

    Ok(DecodedTransaction {
        version,
        method,
        template,
        principal,
        nonce,
        gas_price,
        contents,
        signatures,
    })
}

/// Decode many transactions independently; one failure does not affect the
/// others.
pub fn decode_batch<'a, I>(raws: I) -> Vec<Result<DecodedTransaction, DecodeError>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    raws.into_iter().map(decode).collect()
}

/// Consume the trailing signature blocks and return how many there were.
fn read_signatures(r: &mut ScaleReader<'_>) -> Result<usize, DecodeError> {
    let remaining = r.remaining();
    if remaining < SIGNATURE_LENGTH {
        return Err(DecodeError::truncated("signature", SIGNATURE_LENGTH, remaining));
    }
    if remaining % SIGNATURE_LENGTH != 0 {
        return Err(DecodeError::malformed(
            "signature",
            format!("{remaining} trailing bytes are not whole signatures"),
        ));
    }
    r.read_bytes("signature", remaining)?;
    Ok(remaining / SIGNATURE_LENGTH)
}
