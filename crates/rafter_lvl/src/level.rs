//! Level files: a `LEVL` root node with one `ENTT` node per entity, each holding that entity's
//! definition blobs.

use crate::{
    defs::{peek_definition_name, write_definition, Definition},
    node::{read_node_children, write_root_node, NodeHeader, NodeName, NodeRead, NodeWrite, NodeWriter},
};
use anyhow::bail;
use rafter_utils::{ok, AnyResult, AnyhowResultExt};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom, Write},
    path::Path,
};

pub const LEVEL_NODE: NodeName = NodeName(*b"LEVL");
pub const ENTITY_NODE: NodeName = NodeName(*b"ENTT");

/// A single definition blob, header included. The contents aren't validated beyond the header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDefinition {
    name: NodeName,
    bytes: Vec<u8>,
}

impl RawDefinition {
    pub fn new(bytes: Vec<u8>) -> AnyResult<Self> {
        let name = peek_definition_name(&bytes).otherwise("definition blob is too short")?;
        Ok(Self { name, bytes })
    }

    pub fn from_definition<D: Definition>(definition: &D) -> AnyResult<Self> {
        Ok(Self {
            name: D::NODE,
            bytes: write_definition(definition)?,
        })
    }

    pub fn name(&self) -> NodeName {
        self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDef {
    pub components: Vec<RawDefinition>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component definition, builder style.
    pub fn with<D: Definition>(mut self, definition: &D) -> AnyResult<Self> {
        self.components
            .push(RawDefinition::from_definition(definition)?);
        Ok(self)
    }
}

impl NodeRead for EntityDef {
    fn read_node_payload<R: Read + Seek>(r: &mut R, meta: NodeHeader) -> AnyResult<Self> {
        let mut components = Vec::new();
        for child in read_node_children(r, meta)? {
            let mut bytes = vec![0; (child.end_position() - child.header_position) as usize];
            r.seek(SeekFrom::Start(child.header_position))?;
            r.read_exact(&mut bytes)?;
            components.push(RawDefinition::new(bytes)?);
        }
        Ok(Self { components })
    }
}

impl NodeWrite for EntityDef {
    fn write_node<W: Write + Seek>(&self, w: &mut NodeWriter<W>) -> AnyResult {
        for component in &self.components {
            w.write_all(component.bytes())?;
        }
        ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelDef {
    pub entities: Vec<EntityDef>,
}

impl LevelDef {
    pub fn read<R: Read + Seek>(r: &mut R) -> AnyResult<Self> {
        Self::read_node(r, LEVEL_NODE)
    }

    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let mut file = BufReader::new(
            File::open(path).otherwise(format!("couldn't open level `{}`", path.display()))?,
        );
        Self::read(&mut file)
    }

    pub fn to_bytes(&self) -> AnyResult<Vec<u8>> {
        write_root_node(LEVEL_NODE, self)
    }
}

impl NodeRead for LevelDef {
    fn read_node_payload<R: Read + Seek>(r: &mut R, meta: NodeHeader) -> AnyResult<Self> {
        let mut entities = Vec::new();
        for child in read_node_children(r, meta)? {
            if child.name != ENTITY_NODE {
                bail!("unexpected level node: `{}`", child.name);
            }
            entities.push(EntityDef::read_node_at(r, child)?);
        }
        Ok(Self { entities })
    }
}

impl NodeWrite for LevelDef {
    fn write_node<W: Write + Seek>(&self, w: &mut NodeWriter<W>) -> AnyResult {
        for entity in &self.entities {
            w.write_node(ENTITY_NODE, entity)?;
        }
        ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{read_definition, SimpleMovementDef, TransformDef};
    use glam::{Quat, Vec3};
    use std::io::Cursor;

    fn transform(x: f32) -> TransformDef {
        TransformDef {
            position: Vec3::new(x, 0.0, 0.0),
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[test]
    fn level_structure() {
        let level = LevelDef {
            entities: vec![
                EntityDef::new()
                    .with(&transform(1.0))
                    .unwrap()
                    .with(&SimpleMovementDef {
                        velocity: Vec3::X,
                        lifetime: 0.0,
                    })
                    .unwrap(),
                EntityDef::new().with(&transform(2.0)).unwrap(),
                EntityDef::new(),
            ],
        };

        let bytes = level.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"LEVL");

        let read = LevelDef::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(read, level);

        let first = &read.entities[0].components;
        assert_eq!(first[0].name(), NodeName(*b"TRFM"));
        assert_eq!(first[1].name(), NodeName(*b"SMOV"));
        let second: TransformDef = read_definition(read.entities[1].components[0].bytes()).unwrap();
        assert_eq!(second, transform(2.0));
    }

    #[test]
    fn foreign_nodes_are_rejected() {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = NodeWriter::new(&mut cursor, LEVEL_NODE).unwrap();
        writer.write_node(b"JUNK", &1u32).unwrap();
        writer.finish().unwrap();
        drop(writer);

        let bytes = cursor.into_inner();
        assert!(LevelDef::read(&mut Cursor::new(&bytes)).is_err());
        assert!(LevelDef::read(&mut Cursor::new(b"RAIL\0\0\0\0")).is_err());
    }
}
