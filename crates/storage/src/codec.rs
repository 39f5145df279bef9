//! Payload byte packing
//!
//! Stored vectors keep their values as bytes, the way a relational store
//! keeps them in a blob column. Doubles are packed as little-endian `f64`;
//! booleans as one byte each (`0` or `1`).

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use exprvec_core::{Error, Payload, PrimitiveType, Result};
use std::io::Cursor;

const F64_WIDTH: usize = std::mem::size_of::<f64>();

/// Packs and unpacks vector payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    /// Create a codec
    pub const fn new() -> Self {
        PayloadCodec
    }

    /// Pack a payload into bytes
    pub fn encode(&self, payload: &Payload) -> Vec<u8> {
        match payload {
            Payload::Doubles(values) => {
                let mut out = vec![0u8; values.len() * F64_WIDTH];
                LittleEndian::write_f64_into(values, &mut out);
                out
            }
            Payload::Booleans(values) => values.iter().map(|&b| u8::from(b)).collect(),
        }
    }

    /// Unpack bytes stored with the given representation
    ///
    /// # Errors
    /// - `Corruption` if the byte count does not fit the representation,
    ///   or a boolean byte is neither 0 nor 1
    /// - `Store` if the representation cannot be stored by this codec
    pub fn decode(&self, bytes: &[u8], representation: PrimitiveType) -> Result<Payload> {
        match representation {
            PrimitiveType::Double => {
                if bytes.len() % F64_WIDTH != 0 {
                    return Err(Error::Corruption(format!(
                        "double payload of {} bytes is not a multiple of {}",
                        bytes.len(),
                        F64_WIDTH
                    )));
                }
                let mut reader = Cursor::new(bytes);
                let mut values = Vec::with_capacity(bytes.len() / F64_WIDTH);
                for _ in 0..bytes.len() / F64_WIDTH {
                    let v = reader
                        .read_f64::<LittleEndian>()
                        .map_err(|e| Error::Corruption(e.to_string()))?;
                    values.push(v);
                }
                Ok(Payload::Doubles(values))
            }
            PrimitiveType::Boolean => bytes
                .iter()
                .map(|&b| match b {
                    0 => Ok(false),
                    1 => Ok(true),
                    other => Err(Error::Corruption(format!("invalid boolean byte {}", other))),
                })
                .collect::<Result<Vec<bool>>>()
                .map(Payload::Booleans),
            other => Err(Error::store(format!(
                "payload representation {:?} is not supported",
                other
            ))),
        }
    }
}
