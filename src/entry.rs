//! Filesystem entry types
//!
//! These types represent the metadata records streamed out of a snapshot
//! backend. The diff engine only reads them: a full path used as the merge
//! key, the POSIX mode, and a map of typed extended attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mask selecting the file type bits of a mode
pub const S_IFMT: u32 = 0o170000;

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryType {
    /// Regular file
    File = 0,
    /// Directory
    Directory = 1,
    /// Symbolic link
    Symlink = 2,
    /// Block device
    BlockDevice = 3,
    /// Character device
    CharDevice = 4,
    /// Named pipe (FIFO)
    Fifo = 5,
    /// Unix socket
    Socket = 6,
    /// Unknown type
    Unknown = 255,
}

impl EntryType {
    /// Convert from mode bits
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            0o100000 => EntryType::File,        // S_IFREG
            0o040000 => EntryType::Directory,   // S_IFDIR
            0o120000 => EntryType::Symlink,     // S_IFLNK
            0o060000 => EntryType::BlockDevice, // S_IFBLK
            0o020000 => EntryType::CharDevice,  // S_IFCHR
            0o010000 => EntryType::Fifo,        // S_IFIFO
            0o140000 => EntryType::Socket,      // S_IFSOCK
            _ => EntryType::Unknown,
        }
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        *self == EntryType::File
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }

    /// Get database integer representation
    pub fn as_db_int(&self) -> i32 {
        *self as i32
    }
}

/// A typed extended attribute value
///
/// Snapshot stores record attribute values with their type, so a checksum
/// stored as a string is distinguishable from one stored as raw bytes, and
/// both are distinguishable from a value of the wrong kind altogether.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum XattrValue {
    Boolean(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    String(String),
    Binary(Vec<u8>),
    Sequence(Vec<XattrValue>),
}

impl XattrValue {
    /// Short name of the value kind, as stored in the `xattrs.kind` column
    pub fn kind(&self) -> &'static str {
        match self {
            XattrValue::Boolean(_) => "boolean",
            XattrValue::Int32(_) => "int32",
            XattrValue::UInt32(_) => "uint32",
            XattrValue::Int64(_) => "int64",
            XattrValue::UInt64(_) => "uint64",
            XattrValue::String(_) => "string",
            XattrValue::Binary(_) => "binary",
            XattrValue::Sequence(_) => "sequence",
        }
    }
}

/// One filesystem object's metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEntry {
    /// Full path, the merge key
    pub path: String,

    /// File mode (type + permissions)
    pub mode: u32,

    /// Extended attributes by name
    #[serde(default)]
    pub xattrs: BTreeMap<String, XattrValue>,
}

impl FsEntry {
    /// Create an entry with no extended attributes
    pub fn new(path: impl Into<String>, mode: u32) -> Self {
        Self {
            path: path.into(),
            mode,
            xattrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_xattr(mut self, name: impl Into<String>, value: XattrValue) -> Self {
        self.xattrs.insert(name.into(), value);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Look up an extended attribute by name
    pub fn xattr(&self, name: &str) -> Option<&XattrValue> {
        self.xattrs.get(name)
    }

    /// Get the entry type from mode
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_mode(self.mode)
    }

    /// Check if this entry is a regular file
    pub fn is_regular_file(&self) -> bool {
        self.entry_type().is_file()
    }
}
