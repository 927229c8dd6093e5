//! Length-prefixed tagged binary framing for push/pull payloads and the
//! persisted buffer log.
//!
//! Layout per delta: op tag, then `table`, `rowId`, `clientId`, `deltaId` as
//! u32-length-prefixed UTF-8, the HLC as an unsigned big-endian u64, then a
//! u32 column count followed by `name, value` pairs. Values carry a one-byte
//! type tag. Encoder and decoder form a bijection over the delta value
//! space; strict decoding additionally recomputes and checks the id.

use lakesync_core::errors::{CodecError, SyncResult};
use lakesync_core::models::delta::{ColumnValue, DeltaOp, RowDelta, Scalar};
use lakesync_core::models::hlc::HlcTimestamp;

use crate::delta_id::verify_delta_id;

/// Upper bound on a single frame; anything larger is a corrupt stream.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

const OP_INSERT: u8 = 0;
const OP_UPDATE: u8 = 1;
const OP_DELETE: u8 = 2;

const VAL_NULL: u8 = 0;
const VAL_BOOL: u8 = 1;
const VAL_I64: u8 = 2;
const VAL_F64: u8 = 3;
const VAL_TEXT: u8 = 4;
const VAL_BYTES: u8 = 5;
const VAL_JSON: u8 = 6;

/// Encode one delta without a frame prefix.
pub fn encode_delta(delta: &RowDelta) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.push(match delta.op {
        DeltaOp::Insert => OP_INSERT,
        DeltaOp::Update => OP_UPDATE,
        DeltaOp::Delete => OP_DELETE,
    });
    put_str(&mut out, &delta.table);
    put_str(&mut out, &delta.row_id);
    put_str(&mut out, &delta.client_id);
    put_str(&mut out, &delta.delta_id);
    out.extend_from_slice(&delta.hlc.as_u64().to_be_bytes());
    out.extend_from_slice(&(delta.columns.len() as u32).to_be_bytes());
    for col in &delta.columns {
        put_str(&mut out, &col.column);
        put_scalar(&mut out, &col.value);
    }
    out
}

/// Encode one delta as a `[u32 length | payload]` frame.
pub fn encode_frame(delta: &RowDelta) -> Vec<u8> {
    let payload = encode_delta(delta);
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Encode a batch: u32 count, then one frame per delta, in order.
pub fn encode_batch(deltas: &[RowDelta]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(deltas.len() as u32).to_be_bytes());
    for delta in deltas {
        out.extend_from_slice(&encode_frame(delta));
    }
    out
}

/// Decode one delta occupying the whole buffer.
pub fn decode_delta(buf: &[u8]) -> SyncResult<RowDelta> {
    let mut reader = Reader::new(buf);
    let delta = reader.delta()?;
    Ok(delta)
}

/// Decode one delta and verify its transmitted id.
pub fn decode_delta_strict(buf: &[u8]) -> SyncResult<RowDelta> {
    let delta = decode_delta(buf)?;
    verify_delta_id(&delta)?;
    Ok(delta)
}

/// Decode one frame from the front of `buf`; returns the delta and the
/// number of bytes consumed.
pub fn decode_frame(buf: &[u8]) -> SyncResult<(RowDelta, usize)> {
    let mut reader = Reader::new(buf);
    let len = reader.u32()? as usize;
    if len > MAX_FRAME_BYTES {
        return Err(CodecError::FrameTooLarge {
            len,
            limit: MAX_FRAME_BYTES,
        }
        .into());
    }
    let payload = reader.take(len)?;
    let delta = decode_delta(payload)?;
    Ok((delta, 4 + len))
}

/// Decode a batch produced by [`encode_batch`].
pub fn decode_batch(buf: &[u8]) -> SyncResult<Vec<RowDelta>> {
    let mut reader = Reader::new(buf);
    let count = reader.u32()? as usize;
    let mut deltas = Vec::with_capacity(count.min(1024));
    let mut rest = reader.remaining();
    for _ in 0..count {
        let (delta, used) = decode_frame(rest)?;
        deltas.push(delta);
        rest = &rest[used..];
    }
    Ok(deltas)
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn put_scalar(out: &mut Vec<u8>, value: &Scalar) {
    match value {
        Scalar::Null => out.push(VAL_NULL),
        Scalar::Bool(b) => {
            out.push(VAL_BOOL);
            out.push(u8::from(*b));
        }
        Scalar::I64(n) => {
            out.push(VAL_I64);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Scalar::F64(f) => {
            out.push(VAL_F64);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Scalar::Text(s) => {
            out.push(VAL_TEXT);
            put_str(out, s);
        }
        Scalar::Bytes(bytes) => {
            out.push(VAL_BYTES);
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        Scalar::Json(v) => {
            out.push(VAL_JSON);
            put_str(out, &v.to_string());
        }
    }
}

/// Positioned reader over a byte slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.buf.len() - self.pos;
        if remaining < n {
            return Err(CodecError::Truncated {
                needed: n - remaining,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("length checked")))
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().expect("length checked")))
    }

    fn string(&mut self, field: &'static str) -> Result<String, CodecError> {
        let len = self.u32()? as usize;
        if len > MAX_FRAME_BYTES {
            return Err(CodecError::FrameTooLarge {
                len,
                limit: MAX_FRAME_BYTES,
            });
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field })
    }

    fn scalar(&mut self) -> Result<Scalar, CodecError> {
        let tag = self.u8()?;
        Ok(match tag {
            VAL_NULL => Scalar::Null,
            VAL_BOOL => Scalar::Bool(self.u8()? != 0),
            VAL_I64 => Scalar::I64(i64::from_be_bytes(
                self.take(8)?.try_into().expect("length checked"),
            )),
            VAL_F64 => Scalar::F64(f64::from_bits(self.u64()?)),
            VAL_TEXT => Scalar::Text(self.string("text value")?),
            VAL_BYTES => {
                let len = self.u32()? as usize;
                Scalar::Bytes(self.take(len)?.to_vec())
            }
            VAL_JSON => {
                let raw = self.string("json value")?;
                let value =
                    serde_json::from_str(&raw).map_err(|e| CodecError::InvalidJson {
                        reason: e.to_string(),
                    })?;
                Scalar::Json(value)
            }
            other => {
                return Err(CodecError::UnknownTag {
                    kind: "scalar",
                    tag: other,
                })
            }
        })
    }

    fn delta(&mut self) -> Result<RowDelta, CodecError> {
        let op = match self.u8()? {
            OP_INSERT => DeltaOp::Insert,
            OP_UPDATE => DeltaOp::Update,
            OP_DELETE => DeltaOp::Delete,
            other => {
                return Err(CodecError::UnknownTag {
                    kind: "op",
                    tag: other,
                })
            }
        };
        let table = self.string("table")?;
        let row_id = self.string("rowId")?;
        let client_id = self.string("clientId")?;
        let delta_id = self.string("deltaId")?;
        let hlc = HlcTimestamp::from_u64(self.u64()?);
        let count = self.u32()? as usize;
        let mut columns = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let column = self.string("column name")?;
            let value = self.scalar()?;
            columns.push(ColumnValue { column, value });
        }
        Ok(RowDelta {
            op,
            table,
            row_id,
            client_id,
            hlc,
            columns,
            delta_id,
        })
    }
}
