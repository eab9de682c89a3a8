//! Mutation log record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole frame including this field)
//! +------------------+
//! | Op Tag           | (u8)
//! +------------------+
//! | Version          | (u64 LE)
//! +------------------+
//! | Row              | (u32 LE length + bytes)
//! +------------------+
//! | Column           | (u32 LE length + bytes)
//! +------------------+
//! | Value            | (u32 LE length + bytes, data writes only)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 of everything before it)
//! +------------------+
//! ```

use std::io::{self, Read};

use crate::mvcc::{CellMutation, CellPayload};

const TAG_WRITE_DATA: u8 = 1;
const TAG_WRITE_TOMBSTONE: u8 = 2;
const TAG_POINT_DELETE: u8 = 3;
const TAG_DELETE_ALL: u8 = 4;
const TAG_UNDELETE_ALL: u8 = 5;

/// Smallest well-formed frame: length, tag, version, two empty keys, checksum.
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 1 + 8 + 4 + 4 + 4;

/// One logged cell mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub row: Vec<u8>,
    pub column: Vec<u8>,
    pub mutation: CellMutation,
}

impl LogRecord {
    pub fn new(row: &[u8], column: &[u8], mutation: CellMutation) -> Self {
        Self {
            row: row.to_vec(),
            column: column.to_vec(),
            mutation,
        }
    }

    fn tag(&self) -> u8 {
        match &self.mutation {
            CellMutation::Write {
                payload: CellPayload::Data(_),
                ..
            } => TAG_WRITE_DATA,
            CellMutation::Write {
                payload: CellPayload::Tombstone,
                ..
            } => TAG_WRITE_TOMBSTONE,
            CellMutation::PointDelete { .. } => TAG_POINT_DELETE,
            CellMutation::DeleteAll { .. } => TAG_DELETE_ALL,
            CellMutation::UndeleteAll { .. } => TAG_UNDELETE_ALL,
        }
    }

    /// Serializes the complete frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(64 + self.row.len() + self.column.len());
        body.push(self.tag());
        body.extend_from_slice(&self.mutation.version().to_le_bytes());
        put_bytes(&mut body, &self.row);
        put_bytes(&mut body, &self.column);
        if let CellMutation::Write {
            payload: CellPayload::Data(value),
            ..
        } = &self.mutation
        {
            put_bytes(&mut body, value);
        }

        let record_length = (4 + body.len() + 4) as u32;
        let mut frame = Vec::with_capacity(record_length as usize);
        frame.extend_from_slice(&record_length.to_le_bytes());
        frame.extend_from_slice(&body);
        let checksum = crc32fast::hash(&frame);
        frame.extend_from_slice(&checksum.to_le_bytes());
        frame
    }

    /// Decodes one complete frame, verifying its checksum.
    pub fn decode(frame: &[u8]) -> io::Result<Self> {
        if frame.len() < MIN_RECORD_SIZE {
            return Err(invalid(format!("record too short: {} bytes", frame.len())));
        }

        let record_length = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        if record_length != frame.len() {
            return Err(invalid(format!(
                "record length {} does not match frame of {} bytes",
                record_length,
                frame.len()
            )));
        }

        let checksum_offset = record_length - 4;
        let stored = u32::from_le_bytes([
            frame[checksum_offset],
            frame[checksum_offset + 1],
            frame[checksum_offset + 2],
            frame[checksum_offset + 3],
        ]);
        let computed = crc32fast::hash(&frame[..checksum_offset]);
        if computed != stored {
            return Err(invalid(format!(
                "checksum mismatch: computed {:08x}, stored {:08x}",
                computed, stored
            )));
        }

        let mut cursor = io::Cursor::new(&frame[4..checksum_offset]);
        let mut tag = [0u8; 1];
        cursor.read_exact(&mut tag)?;
        let mut version = [0u8; 8];
        cursor.read_exact(&mut version)?;
        let version = u64::from_le_bytes(version);
        let row = read_bytes(&mut cursor)?;
        let column = read_bytes(&mut cursor)?;

        let mutation = match tag[0] {
            TAG_WRITE_DATA => CellMutation::Write {
                version,
                payload: CellPayload::Data(read_bytes(&mut cursor)?),
            },
            TAG_WRITE_TOMBSTONE => CellMutation::Write {
                version,
                payload: CellPayload::Tombstone,
            },
            TAG_POINT_DELETE => CellMutation::PointDelete { version },
            TAG_DELETE_ALL => CellMutation::DeleteAll { version },
            TAG_UNDELETE_ALL => CellMutation::UndeleteAll { version },
            other => return Err(invalid(format!("unknown op tag {}", other))),
        };

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(invalid("trailing bytes after record body"));
        }

        Ok(Self {
            row,
            column,
            mutation,
        })
    }
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}
