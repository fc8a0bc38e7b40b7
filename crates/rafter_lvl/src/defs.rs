//! Component definition blobs.
//!
//! A definition is a single node named after its component's tag. The payload starts with a
//! `u32` schema version, followed by the definition's fields in declaration order, packed as
//! little endian [`PackedData`](rafter_utils::packed::PackedData).

use crate::node::{NodeName, NodeWriter, NODE_HEADER_SIZE};
use byteorder::{ByteOrder, ReadBytesExt, LE};
use glam::{Quat, Vec3, Vec4};
use rafter_utils::{
    ok,
    packed::{PackedReadExt, PackedWriteExt},
    AnyResult,
};
use std::io::{Cursor, Read, Write};
use thiserror::Error;

/// A component's serialized form.
pub trait Definition: Sized + Clone {
    /// Tag of the definition's node
    const NODE: NodeName;
    /// Schema version, the only one accepted when reading
    const VERSION: u32;

    fn read_fields<R: Read>(r: &mut R) -> AnyResult<Self>;
    fn write_fields<W: Write>(&self, w: &mut W) -> AnyResult;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("expected a `{expected}` definition, found `{found}`")]
    WrongTag { expected: NodeName, found: NodeName },
    #[error("`{node}` definition has unsupported schema version {version} (expected {supported})")]
    UnsupportedVersion {
        node: NodeName,
        version: u32,
        supported: u32,
    },
    #[error("malformed `{node}` definition: {reason}")]
    Malformed { node: NodeName, reason: String },
}

/// Returns the node name of a definition blob, if it's long enough to have a header.
pub fn peek_definition_name(raw: &[u8]) -> Option<NodeName> {
    let name: [u8; 4] = raw.get(0..4)?.try_into().ok()?;
    Some(NodeName(name))
}

/// Parses a definition blob. The blob has to contain exactly one node, with no trailing bytes
/// either inside or after the payload.
pub fn read_definition<D: Definition>(raw: &[u8]) -> Result<D, DefinitionError> {
    let malformed = |reason: String| DefinitionError::Malformed {
        node: D::NODE,
        reason,
    };

    if raw.len() < NODE_HEADER_SIZE as usize {
        return Err(malformed(format!(
            "{} bytes is too short for a node header",
            raw.len()
        )));
    }

    let found = NodeName([raw[0], raw[1], raw[2], raw[3]]);
    if found != D::NODE {
        return Err(DefinitionError::WrongTag {
            expected: D::NODE,
            found,
        });
    }

    let size = LE::read_u32(&raw[4..8]) as usize;
    let payload = &raw[NODE_HEADER_SIZE as usize..];
    if payload.len() != size {
        return Err(malformed(format!(
            "declared payload size is {size}, got {} bytes",
            payload.len()
        )));
    }

    let mut cursor = Cursor::new(payload);
    let version = cursor
        .read_u32::<LE>()
        .map_err(|_| malformed("missing schema version".into()))?;
    if version != D::VERSION {
        return Err(DefinitionError::UnsupportedVersion {
            node: D::NODE,
            version,
            supported: D::VERSION,
        });
    }

    let definition = D::read_fields(&mut cursor).map_err(|e| malformed(format!("{e:#}")))?;

    let leftover = payload.len() - cursor.position() as usize;
    if leftover != 0 {
        return Err(malformed(format!("{leftover} trailing bytes")));
    }

    Ok(definition)
}

/// Serializes a definition into a standalone blob, readable with [`read_definition`].
pub fn write_definition<D: Definition>(definition: &D) -> AnyResult<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = NodeWriter::new(&mut cursor, D::NODE)?;
    writer.write_packed(D::VERSION)?;
    definition.write_fields(&mut writer)?;
    writer.finish()?;
    drop(writer);

    Ok(cursor.into_inner())
}

macro_rules! definitions {
    ($(
        $(#[$meta:meta])*
        pub struct $name:ident($tag:literal, version $version:literal) {
            $( $(#[$field_meta:meta])* pub $field:ident: $ty:ty, )*
        }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name {
                $( $(#[$field_meta])* pub $field: $ty, )*
            }

            impl Definition for $name {
                const NODE: NodeName = NodeName(*$tag);
                const VERSION: u32 = $version;

                fn read_fields<R: Read>(r: &mut R) -> AnyResult<Self> {
                    Ok(Self {
                        $( $field: r.read_packed()?, )*
                    })
                }

                fn write_fields<W: Write>(&self, w: &mut W) -> AnyResult {
                    $( w.write_packed(self.$field.clone())?; )*
                    ok()
                }
            }
        )*
    };
}

definitions! {
    pub struct TransformDef(b"TRFM", version 1) {
        pub position: Vec3,
        pub orientation: Quat,
        pub scale: Vec3,
    }

    pub struct SimpleMovementDef(b"SMOV", version 2) {
        /// Units per second
        pub velocity: Vec3,
        /// Seconds until the entity gets despawned, zero or less for no limit
        pub lifetime: f32,
    }

    pub struct RailDenizenDef(b"RDEN", version 2) {
        pub rail_name: String,
        pub distance: f32,
        /// Units per second, or a multiplier of the rail's natural speed if `timed` is set
        pub speed: f32,
        pub attach_offset: Vec3,
        pub enabled: bool,
        pub timed: bool,
        /// Last direction of travel, kept on rails that can't provide one. Zero means +Y.
        pub facing: Vec3,
    }

    pub struct PlayerDef(b"PLYR", version 2) {
        /// Aim yaw around +Z, in radians
        pub yaw: f32,
        /// Aim pitch, in radians
        pub pitch: f32,
        pub projectile_speed: f32,
        pub projectile_mesh: String,
        pub projectile_shader: String,
        /// Minimum time between two shots, in seconds
        pub fire_cooldown: f32,
        /// Seconds a projectile flies before it's despawned
        pub projectile_lifetime: f32,
    }

    pub struct RenderMeshDef(b"MESH", version 1) {
        pub mesh: String,
        pub shader: String,
        pub transparent: bool,
        pub visible: bool,
        pub casts_shadow: bool,
        pub tint: Vec4,
    }

    pub struct PhysicsDef(b"PHYS", version 1) {
        pub radius: f32,
        /// Collision sphere's offset from the transform's position
        pub offset: Vec3,
        pub velocity: Vec3,
        pub gravity_multiplier: f32,
        pub kinematic: bool,
    }

    pub struct LightDef(b"LITE", version 1) {
        pub ambient_color: Vec3,
        pub ambient_intensity: f32,
        pub diffuse_color: Vec3,
        pub diffuse_intensity: f32,
        pub specular_color: Vec3,
        pub specular_intensity: f32,
        pub specular_exponent: f32,
        pub shadow_intensity: f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denizen() -> RailDenizenDef {
        RailDenizenDef {
            rail_name: "river".into(),
            distance: 12.5,
            speed: -2.0,
            attach_offset: Vec3::new(0.0, 0.0, 1.0),
            enabled: true,
            timed: false,
            facing: Vec3::Y,
        }
    }

    #[test]
    fn definition_layout() {
        let raw = write_definition(&SimpleMovementDef {
            velocity: Vec3::new(1.0, 0.0, 0.0),
            lifetime: 2.5,
        })
        .unwrap();

        assert_eq!(&raw[0..4], b"SMOV");
        assert_eq!(LE::read_u32(&raw[4..8]), 20);
        assert_eq!(LE::read_u32(&raw[8..12]), 2);
        assert_eq!(LE::read_f32(&raw[12..16]), 1.0);
        assert_eq!(LE::read_f32(&raw[24..28]), 2.5);
        assert_eq!(raw.len(), 28);
    }

    #[test]
    fn strings_and_bools_survive() {
        let raw = write_definition(&denizen()).unwrap();
        let read: RailDenizenDef = read_definition(&raw).unwrap();
        assert_eq!(read, denizen());
    }

    #[test]
    fn wrong_tag_is_reported() {
        let raw = write_definition(&denizen()).unwrap();
        assert_eq!(
            read_definition::<TransformDef>(&raw),
            Err(DefinitionError::WrongTag {
                expected: NodeName(*b"TRFM"),
                found: NodeName(*b"RDEN"),
            })
        );
    }

    #[test]
    fn unsupported_version_is_reported() {
        let mut raw = write_definition(&denizen()).unwrap();
        raw[8..12].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            read_definition::<RailDenizenDef>(&raw),
            Err(DefinitionError::UnsupportedVersion { version: 7, .. })
        ));
    }

    #[test]
    fn size_mismatches_are_malformed() {
        let raw = write_definition(&denizen()).unwrap();

        let truncated = &raw[..raw.len() - 1];
        assert!(matches!(
            read_definition::<RailDenizenDef>(truncated),
            Err(DefinitionError::Malformed { .. })
        ));

        let mut extended = raw.clone();
        extended.push(0);
        assert!(matches!(
            read_definition::<RailDenizenDef>(&extended),
            Err(DefinitionError::Malformed { .. })
        ));

        // Declared size agrees with the buffer, but there's junk after the last field
        let mut padded = raw.clone();
        padded.extend_from_slice(&[0; 4]);
        let size = (padded.len() - 8) as u32;
        padded[4..8].copy_from_slice(&size.to_le_bytes());
        assert!(matches!(
            read_definition::<RailDenizenDef>(&padded),
            Err(DefinitionError::Malformed { .. })
        ));

        assert!(read_definition::<RailDenizenDef>(b"RDEN").is_err());
    }

    #[test]
    fn peeking_names() {
        // Reachable from the crate root, where the registry dispatches on it
        use crate::peek_definition_name;

        let raw = write_definition(&denizen()).unwrap();
        assert_eq!(peek_definition_name(&raw), Some(NodeName(*b"RDEN")));
        assert_eq!(peek_definition_name(b"RD"), None);
    }
}
