//! Reference encoder used by the integration tests.
//!
//! Signatures are opaque 64-byte blocks here; the decoder never verifies
//! them, it only counts them.

#![allow(dead_code)]

use meshindex_codec::address::{Address, PublicKey, SIGNATURE_LENGTH};
use meshindex_codec::{compute_principal, Method, Template};
use parity_scale_codec::{Compact, Encode};

/// A co-signer identified by a deterministic public key.
#[derive(Clone, Copy)]
pub struct Signer {
    pub public_key: PublicKey,
}

impl Signer {
    pub fn new(seed: u8) -> Self {
        let mut pk = [seed; 32];
        pk[0] = 0xed;
        Self {
            public_key: PublicKey(pk),
        }
    }

    /// Address of this signer's single-sig wallet.
    pub fn wallet_address(&self) -> Address {
        compute_principal(&Template::Wallet.address(), self.public_key.as_ref())
    }

    pub fn sign(&self, index: usize) -> [u8; SIGNATURE_LENGTH] {
        let mut sig = [self.public_key.0[1]; SIGNATURE_LENGTH];
        sig[0] = index as u8;
        sig
    }
}

pub fn address(seed: u8) -> Address {
    let mut raw = [seed; 24];
    raw[..4].copy_from_slice(&[0; 4]);
    Address(raw)
}

/// Transaction under construction: header, payload and signatures.
pub struct TxEncoder {
    principal: Address,
    method: u8,
    template: Option<Address>,
    nonce: u64,
    gas_price: u64,
    args: Vec<u8>,
    signatures: Vec<[u8; SIGNATURE_LENGTH]>,
}

impl TxEncoder {
    pub fn new(principal: Address, method: u8) -> Self {
        Self {
            principal,
            method,
            template: None,
            nonce: 0,
            gas_price: 1,
            args: Vec::new(),
            signatures: vec![],
        }
    }

    pub fn spawn(principal: Address, template: Address) -> Self {
        let mut enc = Self::new(principal, Method::SPAWN);
        enc.template = Some(template);
        enc
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn arg_bytes(mut self, bytes: &[u8]) -> Self {
        self.args.extend_from_slice(bytes);
        self
    }

    pub fn arg_compact(mut self, value: u64) -> Self {
        Compact(value).encode_to(&mut self.args);
        self
    }

    /// Compact length prefix followed by the raw keys.
    pub fn arg_keys(mut self, keys: &[PublicKey]) -> Self {
        keys.encode_to(&mut self.args);
        self
    }

    pub fn signed_by(mut self, signers: &[Signer]) -> Self {
        for (i, s) in signers.iter().enumerate() {
            self.signatures.push(s.sign(i));
        }
        self
    }

    /// Length of everything before the signatures.
    pub fn body_len(&self) -> usize {
        self.body().len()
    }

    fn body(&self) -> Vec<u8> {
        let mut out = (Compact(0u8), self.principal, Compact(self.method)).encode();
        if let Some(template) = &self.template {
            template.encode_to(&mut out);
        }
        (Compact(self.nonce), Compact(self.gas_price)).encode_to(&mut out);
        out.extend_from_slice(&self.args);
        out
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.body();
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out
    }
}

// ─── Shapes ───────────────────────────────────────────────────────────────────

pub fn spend(from: &Signer, to: Address, amount: u64, nonce: u64, gas_price: u64) -> Vec<u8> {
    TxEncoder::new(from.wallet_address(), Method::SPEND)
        .nonce(nonce)
        .gas_price(gas_price)
        .arg_bytes(to.as_ref())
        .arg_compact(amount)
        .signed_by(&[*from])
        .encode()
}

pub fn multisig_spawn(principal: Address, required: u8, signers: &[Signer]) -> Vec<u8> {
    let keys: Vec<PublicKey> = signers.iter().map(|s| s.public_key).collect();
    TxEncoder::spawn(principal, Template::MultiSig.address())
        .arg_compact(u64::from(required))
        .arg_keys(&keys)
        .signed_by(signers)
        .encode()
}
