//! # ABI Codec
//!
//! Minimal contract ABI support: 4-byte function selectors, head/tail
//! encoding of call arguments, and word-level decoding of event data.
//! Only the types the contracts actually use are supported (uint256, uint8,
//! address, bytes16, string, bytes).

use mm_01_signature_verification::keccak256;
use primitive_types::U256;
use shared_types::Address;

use super::errors::LedgerError;

pub const WORD: usize = 32;

/// First four bytes of the keccak256 of a function signature string,
/// e.g. `"transfer(address,uint256)"`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// keccak256 of an event signature string; this is `topics[0]` of every log
/// the event emits.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

// ============================================================================
// Encoding
// ============================================================================

/// One call argument, pre-classified as static (one word) or dynamic
/// (offset in the head, length-prefixed payload in the tail).
enum Arg {
    Static([u8; WORD]),
    Dynamic(Vec<u8>),
}

/// Head/tail ABI encoder for a single function call.
pub struct AbiEncoder {
    selector: [u8; 4],
    args: Vec<Arg>,
}

impl AbiEncoder {
    pub fn new(signature: &str) -> Self {
        Self {
            selector: selector(signature),
            args: Vec::new(),
        }
    }

    pub fn push_u256(&mut self, value: U256) -> &mut Self {
        let mut word = [0u8; WORD];
        value.to_big_endian(&mut word);
        self.args.push(Arg::Static(word));
        self
    }

    pub fn push_u64(&mut self, value: u64) -> &mut Self {
        self.push_u256(U256::from(value))
    }

    pub fn push_u8(&mut self, value: u8) -> &mut Self {
        self.push_u256(U256::from(value))
    }

    /// Addresses are left-padded to 32 bytes.
    pub fn push_address(&mut self, adr: &Address) -> &mut Self {
        let mut word = [0u8; WORD];
        word[12..].copy_from_slice(adr);
        self.args.push(Arg::Static(word));
        self
    }

    /// Fixed-size byte arrays are right-padded.
    pub fn push_bytes16(&mut self, id: &[u8; 16]) -> &mut Self {
        let mut word = [0u8; WORD];
        word[..16].copy_from_slice(id);
        self.args.push(Arg::Static(word));
        self
    }

    pub fn push_string(&mut self, s: &str) -> &mut Self {
        self.push_bytes(s.as_bytes())
    }

    /// Dynamic `bytes`: length word followed by the payload padded to a
    /// word boundary.
    pub fn push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let mut tail = Vec::with_capacity(WORD + data.len().div_ceil(WORD) * WORD);
        let mut len_word = [0u8; WORD];
        U256::from(data.len()).to_big_endian(&mut len_word);
        tail.extend_from_slice(&len_word);
        tail.extend_from_slice(data);
        let pad = data.len().div_ceil(WORD) * WORD - data.len();
        tail.extend(std::iter::repeat(0u8).take(pad));
        self.args.push(Arg::Dynamic(tail));
        self
    }

    /// Produce `selector || head || tail`. Dynamic arguments carry their
    /// offset from the start of the head in their head slot.
    pub fn finish(&self) -> Vec<u8> {
        let head_len = self.args.len() * WORD;
        let mut head = Vec::with_capacity(head_len);
        let mut tail: Vec<u8> = Vec::new();

        for arg in &self.args {
            match arg {
                Arg::Static(word) => head.extend_from_slice(word),
                Arg::Dynamic(payload) => {
                    let mut offset = [0u8; WORD];
                    U256::from(head_len + tail.len()).to_big_endian(&mut offset);
                    head.extend_from_slice(&offset);
                    tail.extend_from_slice(payload);
                }
            }
        }

        let mut out = Vec::with_capacity(4 + head.len() + tail.len());
        out.extend_from_slice(&self.selector);
        out.extend_from_slice(&head);
        out.extend_from_slice(&tail);
        out
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Word-level reader over an event's data section.
pub struct AbiReader<'a> {
    data: &'a [u8],
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word(&self, index: usize) -> Result<&'a [u8], LedgerError> {
        let start = index * WORD;
        let end = start + WORD;
        if end > self.data.len() {
            return Err(LedgerError::AbiDecode {
                message: format!(
                    "word {} out of range (data is {} bytes)",
                    index,
                    self.data.len()
                ),
            });
        }
        Ok(&self.data[start..end])
    }

    pub fn u256_at(&self, index: usize) -> Result<U256, LedgerError> {
        Ok(U256::from_big_endian(self.word(index)?))
    }

    pub fn u64_at(&self, index: usize) -> Result<u64, LedgerError> {
        let v = self.u256_at(index)?;
        if v > U256::from(u64::MAX) {
            return Err(LedgerError::AbiDecode {
                message: format!("word {} does not fit in u64", index),
            });
        }
        Ok(v.as_u64())
    }

    pub fn u8_at(&self, index: usize) -> Result<u8, LedgerError> {
        let v = self.u256_at(index)?;
        if v > U256::from(u8::MAX) {
            return Err(LedgerError::AbiDecode {
                message: format!("word {} does not fit in u8", index),
            });
        }
        Ok(v.as_u32() as u8)
    }

    pub fn address_at(&self, index: usize) -> Result<Address, LedgerError> {
        let word = self.word(index)?;
        let mut adr = [0u8; 20];
        adr.copy_from_slice(&word[12..]);
        Ok(adr)
    }

    pub fn bytes16_at(&self, index: usize) -> Result<[u8; 16], LedgerError> {
        let word = self.word(index)?;
        let mut id = [0u8; 16];
        id.copy_from_slice(&word[..16]);
        Ok(id)
    }

    pub fn bytes32_at(&self, index: usize) -> Result<[u8; 32], LedgerError> {
        let word = self.word(index)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(word);
        Ok(out)
    }

    /// Follow the offset in head slot `index` to a length-prefixed string in
    /// the tail.
    pub fn string_at(&self, index: usize) -> Result<String, LedgerError> {
        let bytes = self.dynamic_at(index)?;
        String::from_utf8(bytes).map_err(|_| LedgerError::AbiDecode {
            message: format!("string at word {} is not valid utf-8", index),
        })
    }

    fn dynamic_at(&self, index: usize) -> Result<Vec<u8>, LedgerError> {
        let offset = self.u256_at(index)?;
        if offset > U256::from(self.data.len()) {
            return Err(LedgerError::AbiDecode {
                message: format!("offset at word {} out of range", index),
            });
        }
        let offset = offset.as_usize();
        if offset + WORD > self.data.len() {
            return Err(LedgerError::AbiDecode {
                message: "dynamic length word out of range".to_string(),
            });
        }
        let len = U256::from_big_endian(&self.data[offset..offset + WORD]);
        if len > U256::from(self.data.len()) {
            return Err(LedgerError::AbiDecode {
                message: "dynamic payload length out of range".to_string(),
            });
        }
        let len = len.as_usize();
        let start = offset + WORD;
        if start + len > self.data.len() {
            return Err(LedgerError::AbiDecode {
                message: "dynamic payload truncated".to_string(),
            });
        }
        Ok(self.data[start..start + len].to_vec())
    }
}

/// Extract an address from a 32-byte indexed topic.
pub fn address_from_topic(topic: &[u8; 32]) -> Address {
    let mut adr = [0u8; 20];
    adr.copy_from_slice(&topic[12..]);
    adr
}

/// Extract a 16-byte id from a 32-byte indexed topic.
pub fn bytes16_from_topic(topic: &[u8; 32]) -> [u8; 16] {
    let mut id = [0u8; 16];
    id.copy_from_slice(&topic[..16]);
    id
}
