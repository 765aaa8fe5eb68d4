//! Account templates and method selectors.
//!
//! Template addresses are fixed: zero everywhere except the last byte.
//! The lookup table from address to [`Template`] is built once per process
//! and shared read-only by every decode call.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::address::{Address, ADDRESS_LENGTH};

/// A pre-defined account-behavior template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Single-signer wallet.
    Wallet,
    /// k-of-n multisig wallet.
    MultiSig,
    /// Multisig account able to drain a vault.
    Vesting,
    /// Time-locked vault.
    Vault,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Wallet,
        Template::MultiSig,
        Template::Vesting,
        Template::Vault,
    ];

    /// Fixed address identifying this template on chain.
    pub fn address(self) -> Address {
        let mut raw = [0u8; ADDRESS_LENGTH];
        raw[ADDRESS_LENGTH - 1] = match self {
            Template::Wallet => 1,
            Template::MultiSig => 2,
            Template::Vesting => 3,
            Template::Vault => 4,
        };
        Address(raw)
    }

    /// Resolve a template address, `None` if it is not a known template.
    pub fn lookup(address: &Address) -> Option<Template> {
        registry().get(address).copied()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wallet => write!(f, "wallet"),
            Self::MultiSig => write!(f, "multisig"),
            Self::Vesting => write!(f, "vesting"),
            Self::Vault => write!(f, "vault"),
        }
    }
}

fn registry() -> &'static HashMap<Address, Template> {
    static REGISTRY: OnceLock<HashMap<Address, Template>> = OnceLock::new();
    REGISTRY.get_or_init(|| Template::ALL.iter().map(|t| (t.address(), *t)).collect())
}

/// Method selector embedded in every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Instantiate an account from a template.
    Spawn,
    /// Transfer value.
    Spend,
    /// Move funds out of a vault (vesting template only).
    DrainVault,
}

impl Method {
    pub const SPAWN: u8 = 0;
    pub const SPEND: u8 = 16;
    pub const DRAIN_VAULT: u8 = 17;

    pub fn from_selector(selector: u8) -> Option<Method> {
        match selector {
            Self::SPAWN => Some(Method::Spawn),
            Self::SPEND => Some(Method::Spend),
            Self::DRAIN_VAULT => Some(Method::DrainVault),
            _ => None,
        }
    }

    pub fn selector(self) -> u8 {
        match self {
            Method::Spawn => Self::SPAWN,
            Method::Spend => Self::SPEND,
            Method::DrainVault => Self::DRAIN_VAULT,
        }
    }

    /// Template implied by methods that do not carry one on the wire.
    pub fn implied_template(self) -> Option<Template> {
        match self {
            Method::Spawn => None,
            Method::Spend => Some(Template::Wallet),
            Method::DrainVault => Some(Template::Vesting),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn => write!(f, "spawn"),
            Self::Spend => write!(f, "spend"),
            Self::DrainVault => write!(f, "drain_vault"),
        }
    }
}
