// src/entry/wire.rs
//! Binary record layout
//!
//! ```text
//! record := magic:u16 version:u8 field_count:u8 field*
//! field  := name_len:u8 name kind:u8 value
//!
//! kind 0  null
//! kind 1  timestamp  secs:i64 nanos:u32
//! kind 2  int        i32
//! kind 3  text       len:u32 utf8
//! kind 4  bytes      len:u32 raw
//! ```
//!
//! Integers are little-endian. Field names are embedded so readers can skip
//! fields they do not know and accept any field order.

pub const MAGIC: u16 = 0x4C42; // "BL"
pub const VERSION: u8 = 1;

/// magic + version + field count
pub const HEADER_LEN: usize = 4;

/// Field names as they appear on the wire
pub mod field {
    pub const HEADER: &str = "header";
    pub const TIMESTAMP: &str = "timestamp";
    pub const LEVEL: &str = "level";
    pub const THREAD_NAME: &str = "thread_name";
    pub const LOGGER_NAME: &str = "logger_name";
    pub const CONTENT: &str = "content";
    pub const CONTENT_TYPE: &str = "content_type";
    pub const CONTENT_ENCODING: &str = "content_encoding";
}

/// Value kind tag following each field name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    Null = 0,
    Timestamp = 1,
    Int = 2,
    Text = 3,
    Bytes = 4,
}

impl Kind {
    pub fn from_u8(tag: u8) -> Option<Kind> {
        match tag {
            0 => Some(Kind::Null),
            1 => Some(Kind::Timestamp),
            2 => Some(Kind::Int),
            3 => Some(Kind::Text),
            4 => Some(Kind::Bytes),
            _ => None,
        }
    }
}
