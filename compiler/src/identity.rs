//! Stable 32-bit identities for types and structs.
//!
//! Identities are shared with generated code in every target language, so they
//! are computed from an explicit byte encoding rather than from in-memory
//! representations:
//!
//! ```text
//! type:   [ENCODING_VERSION, b'T', discriminant, nested ids (u32 LE)..., optional]
//! struct: [ENCODING_VERSION, b'S', package bytes..., 0, struct name bytes...]
//! ```
//!
//! The encoding is hashed with BLAKE3 and the first four bytes of the digest are
//! read as a little-endian `u32`. Default values never take part in it.

use crate::types::TypeKind;

pub const ENCODING_VERSION: u8 = 1;

const TYPE_DOMAIN:   u8 = b'T';
const STRUCT_DOMAIN: u8 = b'S';

/// Identity of a type descriptor with the given variant and optionality.
pub fn type_id(kind: &TypeKind, is_optional: bool) -> u32 {
    let mut bytes = vec![ENCODING_VERSION, TYPE_DOMAIN, kind.discriminant()];
    match kind {
        TypeKind::List { value } => {
            bytes.extend_from_slice(&value.id().to_le_bytes());
        }
        TypeKind::Map { key, value } => {
            bytes.extend_from_slice(&key.id().to_le_bytes());
            bytes.extend_from_slice(&value.id().to_le_bytes());
        }
        TypeKind::UserDefined { target } => {
            bytes.extend_from_slice(&target.id.to_le_bytes());
        }
        _ => {}
    }
    bytes.push(is_optional as u8);
    digest(&bytes)
}

/// Identity of a struct. Depends on the owning package and the struct name only.
pub fn struct_identity(package: &str, name: &str) -> u32 {
    let mut bytes = Vec::with_capacity(package.len() + name.len() + 3);
    bytes.push(ENCODING_VERSION);
    bytes.push(STRUCT_DOMAIN);
    bytes.extend_from_slice(package.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(name.as_bytes());
    digest(&bytes)
}

fn digest(bytes: &[u8]) -> u32 {
    let hash = blake3::hash(bytes);
    let b = hash.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
