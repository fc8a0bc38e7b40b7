//! Rail assets.
//!
//! ```text
//! RAIL
//! ├── INFO  u32 version, f32 total time, f32 reliable distance
//! ├── PNTS  u32 count, count × (f32, f32, f32)
//! ├── WRAP  u8, optional, defaults to 1
//! └── NAME  string, optional
//! ```

use crate::node::{
    read_node_children, write_root_node, NodeHeader, NodeName, NodeRead, NodeWrite, NodeWriter,
};
use anyhow::{bail, ensure};
use glam::Vec3;
use rafter_utils::{
    ok,
    packed::{read_counted, write_counted, PackedReadExt, PackedWriteExt},
    AnyResult,
};
use std::io::{Read, Seek, Write};

pub const RAIL_NODE: NodeName = NodeName(*b"RAIL");
pub const RAIL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct RailDef {
    /// Optional display name, the asset is identified by its file stem regardless
    pub name: Option<String>,
    /// Seconds it takes to traverse the whole rail at its natural speed
    pub total_time: f32,
    /// Distance around joints in which the facing direction is smoothed
    pub reliable_distance: f32,
    pub points: Vec<Vec3>,
    pub wrap: bool,
}

impl RailDef {
    pub fn read<R: Read + Seek>(r: &mut R) -> AnyResult<Self> {
        Self::read_node(r, RAIL_NODE)
    }

    pub fn to_bytes(&self) -> AnyResult<Vec<u8>> {
        write_root_node(RAIL_NODE, self)
    }
}

impl NodeRead for RailDef {
    fn read_node_payload<R: Read + Seek>(r: &mut R, meta: NodeHeader) -> AnyResult<Self> {
        let mut info = None;
        let mut points = None;
        let mut wrap = true;
        let mut name = None;

        for child in read_node_children(r, meta)? {
            child.seek_to_payload(r)?;

            if child.name == b"INFO" {
                ensure!(info.is_none(), "duplicate rail info");
                let version: u32 = r.read_packed()?;
                ensure!(
                    version == RAIL_VERSION,
                    "unsupported rail version {version} (expected {RAIL_VERSION})"
                );
                let total_time: f32 = r.read_packed()?;
                let reliable_distance: f32 = r.read_packed()?;
                info = Some((total_time, reliable_distance));
            } else if child.name == b"PNTS" {
                ensure!(points.is_none(), "duplicate rail points");
                points = Some(read_counted::<Vec3, _>(r)?);
            } else if child.name == b"WRAP" {
                wrap = r.read_packed::<u8>()? != 0;
            } else if child.name == b"NAME" {
                name = Some(String::read_node_at(r, child)?);
            } else {
                bail!("unexpected rail node: `{}`", child.name);
            }
        }

        let Some((total_time, reliable_distance)) = info else {
            bail!("missing rail info");
        };
        let Some(points) = points else {
            bail!("missing rail points");
        };
        ensure!(!points.is_empty(), "rail has no points");
        ensure!(
            points.iter().all(|p| p.is_finite()),
            "rail has non-finite points"
        );

        Ok(Self {
            name,
            total_time,
            reliable_distance,
            points,
            wrap,
        })
    }
}

impl NodeWrite for RailDef {
    fn write_node<W: Write + Seek>(&self, w: &mut NodeWriter<W>) -> AnyResult {
        w.build_node(b"INFO", |w| {
            w.write_packed(RAIL_VERSION)?;
            w.write_packed(self.total_time)?;
            w.write_packed(self.reliable_distance)
        })?;
        w.build_node(b"PNTS", |w| write_counted(w, &self.points))?;
        w.write_node(b"WRAP", &(self.wrap as u8))?;
        if let Some(name) = &self.name {
            w.write_node(b"NAME", name)?;
        }
        ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn square() -> RailDef {
        RailDef {
            name: Some("square".into()),
            total_time: 8.0,
            reliable_distance: 0.5,
            points: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            wrap: false,
        }
    }

    #[test]
    fn rail_structure() {
        let bytes = square().to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"RAIL");
        assert_eq!(&bytes[8..12], b"INFO");

        let read = RailDef::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(read, square());
    }

    #[test]
    fn wrap_defaults_to_true() {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = NodeWriter::new(&mut cursor, RAIL_NODE).unwrap();
        writer
            .build_node(b"INFO", |w| {
                w.write_packed(RAIL_VERSION)?;
                w.write_packed(4.0f32)?;
                w.write_packed(0.0f32)
            })
            .unwrap();
        writer
            .build_node(b"PNTS", |w| write_counted(w, &[Vec3::ZERO, Vec3::X]))
            .unwrap();
        writer.finish().unwrap();
        drop(writer);

        let read = RailDef::read(&mut Cursor::new(cursor.into_inner())).unwrap();
        assert!(read.wrap);
        assert_eq!(read.name, None);
        assert_eq!(read.points.len(), 2);
    }

    #[test]
    fn incomplete_rails_are_rejected() {
        let mut rail = square();
        rail.points.clear();
        let bytes = rail.to_bytes().unwrap();
        assert!(RailDef::read(&mut Cursor::new(&bytes)).is_err());

        let mut bytes = square().to_bytes().unwrap();
        // Bump the version inside INFO
        bytes[16..20].copy_from_slice(&2u32.to_le_bytes());
        assert!(RailDef::read(&mut Cursor::new(&bytes)).is_err());
    }
}
