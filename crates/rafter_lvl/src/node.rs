//! Utilities for dealing with tagged nodes.
//!
//! Every Rafter file is a tree of nodes, each being a 4 byte name, a little endian `u32` payload
//! size and the payload itself. A payload is either raw packed data, or a list of child nodes.

use anyhow::ensure;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use rafter_utils::{
    ok,
    packed::{PackedData, PackedWriteExt},
    AnyResult, AsciiDisplay, SeekableTakeExt,
};
use std::{
    fmt::{self, Display},
    io::{self, Read, Seek, SeekFrom, Write},
};

/// Size of a node header in bytes.
pub const NODE_HEADER_SIZE: u64 = 8;

/// A 4-byte node name, usually a short uppercase ASCII tag like `TRFM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeName(pub [u8; 4]);

impl NodeName {
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl<'a> From<&'a [u8; 4]> for NodeName {
    fn from(value: &'a [u8; 4]) -> Self {
        Self(*value)
    }
}

impl AsRef<[u8]> for NodeName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<'a> PartialEq<&'a [u8; 4]> for NodeName {
    fn eq(&self, other: &&'a [u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", AsciiDisplay(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHeader {
    pub header_position: u64,
    pub name: NodeName,
    pub size: u32,
}

impl NodeHeader {
    pub fn seek_to_payload(&self, r: &mut impl Seek) -> io::Result<()> {
        r.seek(SeekFrom::Start(self.header_position + NODE_HEADER_SIZE))?;
        ok()
    }

    /// Position right past the end of the payload.
    pub fn end_position(&self) -> u64 {
        self.header_position + NODE_HEADER_SIZE + self.size as u64
    }
}

pub trait NodeRead: Sized {
    /// Processes the node's payload and returns this type's instance.
    ///
    /// The reader is placed at the first byte of the payload by the caller, and limited to the
    /// payload's size. Its final seek position is unspecified.
    fn read_node_payload<R: Read + Seek>(r: &mut R, meta: NodeHeader) -> AnyResult<Self>;

    /// Wrapper around [`Self::read_node_payload`], that seeks into the payload and limits the
    /// reader to it.
    fn read_node_at<R: Read + Seek>(r: &mut R, meta: NodeHeader) -> AnyResult<Self> {
        meta.seek_to_payload(r)?;
        Self::read_node_payload(&mut r.seekable_take(meta.size as u64)?, meta)
    }

    /// Reads a whole node starting at the reader's current position, checking its name.
    fn read_node<R: Read + Seek>(r: &mut R, expected: NodeName) -> AnyResult<Self> {
        let header = read_node_header(r)?;
        ensure!(
            header.name == expected,
            "expected a `{expected}` node, found `{}`",
            header.name
        );
        Self::read_node_at(r, header)
    }
}

pub trait NodeWrite {
    /// Writes the node's payload into the given writer. The caller must not call
    /// [`NodeWriter::finish`] by themselves.
    fn write_node<W: Write + Seek>(&self, w: &mut NodeWriter<W>) -> AnyResult;
}

/// Every [`PackedData`] can be a node, the payload being just the packed value.
impl<T: PackedData> NodeRead for T {
    fn read_node_payload<R: Read + Seek>(r: &mut R, _: NodeHeader) -> AnyResult<Self> {
        T::read_packed(r)
    }
}

impl<T: PackedData> NodeWrite for T {
    fn write_node<W: Write + Seek>(&self, writer: &mut NodeWriter<W>) -> AnyResult {
        writer.write_packed(self.clone())
    }
}

pub fn read_node_header<R: Read + Seek>(r: &mut R) -> io::Result<NodeHeader> {
    let header_position = r.stream_position()?;
    let mut name = NodeName([0; 4]);
    r.read_exact(&mut name.0)?;
    let size = r.read_u32::<LE>()?;

    Ok(NodeHeader {
        header_position,
        name,
        size,
    })
}

/// Parses the given node's payload as a list of child nodes. Children must fill the payload
/// exactly.
pub fn read_node_children<R: Read + Seek>(
    r: &mut R,
    header: NodeHeader,
) -> io::Result<Vec<NodeHeader>> {
    let payload_end = header.end_position();
    let mut position = header.header_position + NODE_HEADER_SIZE;
    let mut children = Vec::new();

    while position < payload_end {
        if payload_end - position < NODE_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated child node header",
            ));
        }

        r.seek(SeekFrom::Start(position))?;
        let child = read_node_header(r)?;
        if child.end_position() > payload_end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "child node went out of bounds",
            ));
        }

        position = child.end_position();
        children.push(child);
    }

    Ok(children)
}

/// A builder-style node writer.
///
///  1. [`NodeWriter::build_node`] creates a nested writer for a child node.
///  2. [`NodeWriter::write_node`] creates a child node filled with a [`NodeWrite`] object.
///  3. Raw payload bytes go through the [`Write`] implementation.
///  4. [`NodeWriter::finish`] patches the size field. Dropping the writer finishes it too, but
///     swallows errors, so call it manually.
pub struct NodeWriter<'w, W: Write + Seek> {
    w: &'w mut W,
    data_start: u64,
    finished: bool,
}

impl<'w, W: Write + Seek> NodeWriter<'w, W> {
    pub fn new(w: &'w mut W, name: impl Into<NodeName>) -> AnyResult<Self> {
        let data_start = w.stream_position()?;
        w.write_all(&name.into().0)?;
        w.write_u32::<LE>(0)?;

        Ok(Self {
            w,
            data_start,
            finished: false,
        })
    }

    /// Creates a child node with the payload written by `data`.
    pub fn write_node(&mut self, name: impl Into<NodeName>, data: &impl NodeWrite) -> AnyResult {
        self.build_node(name, |writer| data.write_node(writer))
    }

    /// Creates a nested node builder.
    pub fn build_node<N, F>(&mut self, name: N, f: F) -> AnyResult
    where
        N: Into<NodeName>,
        F: FnOnce(&mut NodeWriter<'_, W>) -> AnyResult,
    {
        ensure!(!self.finished, "writing into a finished node");

        let mut writer = NodeWriter::new(&mut *self.w, name)?;
        f(&mut writer)?;
        writer.finish()
    }

    /// Finishes writing the node, by marking its final size in the stream.
    pub fn finish(&mut self) -> AnyResult {
        if self.finished {
            return ok();
        }

        let data_end = self.w.stream_position()?;
        let data_size = data_end - self.data_start - NODE_HEADER_SIZE;
        ensure!(data_size <= u32::MAX.into(), "node too large");

        self.w.seek(SeekFrom::Start(self.data_start + 4))?;
        self.w.write_u32::<LE>(data_size as u32)?;
        self.w.seek(SeekFrom::Start(data_end))?;

        self.finished = true;
        ok()
    }
}

impl<'w, W: Write + Seek> Write for NodeWriter<'w, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.w.write_all(buf)
    }
}

impl<'w, W: Write + Seek> Drop for NodeWriter<'w, W> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish();
        }
    }
}

/// Writes a single root node into a fresh buffer.
pub fn write_root_node(name: impl Into<NodeName>, data: &impl NodeWrite) -> AnyResult<Vec<u8>> {
    let mut cursor = io::Cursor::new(Vec::new());
    let mut writer = NodeWriter::new(&mut cursor, name)?;
    data.write_node(&mut writer)?;
    writer.finish()?;
    drop(writer);
    Ok(cursor.into_inner())
}
