//! Persisted index container format
//!
//! The file an index serializes to is a small self-describing container:
//! a magic tag, a format version, the engine kind, and a length-prefixed
//! opaque payload owned by the engine. This layer never interprets the
//! payload bytes - it only needs to know which engine to hand them to.
//!
//! Layout (little-endian):
//!
//! ```text
//! [0..4)   magic "QVIX"
//! [4]      format version (currently 1)
//! [5]      engine kind byte
//! [6]      metric byte
//! [7..15)  payload length, u64
//! [15..)   engine payload
//! ```
//!
//! The metric byte duplicates what the payload carries; decode checks the
//! two agree, so a header cannot claim one metric over another's payload.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use quay_core::{Error, MetricType, Result};
use std::io::Read;

use crate::flat::FlatEngine;
use crate::traits::{EngineKind, VectorEngine};

/// Container magic tag
pub const MAGIC: &[u8; 4] = b"QVIX";

/// Current container format version
pub const FORMAT_VERSION: u8 = 1;

/// Serialize an engine into a self-describing container
pub fn encode_index(engine: &dyn VectorEngine) -> Result<Vec<u8>> {
    let payload = engine.encode()?;

    let mut out = Vec::with_capacity(MAGIC.len() + 11 + payload.len());
    out.extend_from_slice(MAGIC);
    out.write_u8(FORMAT_VERSION)?;
    out.write_u8(engine.kind().to_byte())?;
    out.write_u8(engine.metric().to_byte())?;
    out.write_u64::<LittleEndian>(payload.len() as u64)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Deserialize an engine from container bytes
pub fn decode_index(bytes: &[u8]) -> Result<Box<dyn VectorEngine>> {
    let mut cursor = bytes;

    let mut magic = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .map_err(|_| Error::Serialization("truncated container header".into()))?;
    if &magic != MAGIC {
        return Err(Error::Serialization("bad container magic".into()));
    }

    let version = cursor
        .read_u8()
        .map_err(|_| Error::Serialization("truncated container header".into()))?;
    if version != FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported container version: {}",
            version
        )));
    }

    let kind_byte = cursor
        .read_u8()
        .map_err(|_| Error::Serialization("truncated container header".into()))?;
    let kind = EngineKind::from_byte(kind_byte).ok_or_else(|| {
        Error::Serialization(format!("unknown engine kind: {}", kind_byte))
    })?;

    let metric_byte = cursor
        .read_u8()
        .map_err(|_| Error::Serialization("truncated container header".into()))?;
    let metric = MetricType::from_byte(metric_byte).ok_or_else(|| {
        Error::Serialization(format!("unknown metric: {}", metric_byte))
    })?;

    let payload_len = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| Error::Serialization("truncated container header".into()))?
        as usize;
    if cursor.len() != payload_len {
        return Err(Error::Serialization(format!(
            "payload length mismatch: header says {}, found {}",
            payload_len,
            cursor.len()
        )));
    }

    let engine: Box<dyn VectorEngine> = match kind {
        EngineKind::Flat => Box::new(FlatEngine::from_payload(cursor)?),
    };
    if engine.metric() != metric {
        return Err(Error::Serialization(format!(
            "metric mismatch: header says {}, payload says {}",
            metric.name(),
            engine.metric().name()
        )));
    }
    Ok(engine)
}
