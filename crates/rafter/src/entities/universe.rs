use super::{
    Command, ComponentKind, Components, Entity, KindSet, RegisteredComponent, UpdateContext,
    UpdateOrder,
};
use crate::entities::Component;
use log::*;
use rafter_lvl::{
    peek_definition_name, write_definition, DefinitionError, EntityDef, NodeName,
    RawDefinition,
};
use std::{num::NonZeroU32, time::Duration};
use thiserror::Error;

/// Amount of [`Universe`] slots to grow by whenever the containers run out of space.
const GROW_AMOUNT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttachError {
    #[error("entity {0} is not alive")]
    InvalidEntity(Entity),
    #[error("no component uses the `{0}` definition tag")]
    UnknownTag(NodeName),
    #[error("definition blob is too short to have a tag")]
    MissingTag,
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// The entity registry: live handles, the kinds attached to each of them, and the components
/// holding their data.
pub struct Universe {
    top_generation: NonZeroU32,
    free_indices: Vec<u32>,
    generations: Vec<Option<NonZeroU32>>,
    kinds: Vec<KindSet>,

    components: Components,
    update_order: UpdateOrder,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    /// Creates a blank, empty universe with the default update order.
    pub fn new() -> Self {
        Self::with_update_order(UpdateOrder::default())
    }

    pub fn with_update_order(update_order: UpdateOrder) -> Self {
        Self {
            top_generation: NonZeroU32::MIN,
            free_indices: vec![],
            generations: vec![],
            kinds: vec![],
            components: Components::new(),
            update_order,
        }
    }

    pub fn update_order(&self) -> &UpdateOrder {
        &self.update_order
    }

    pub fn set_update_order(&mut self, update_order: UpdateOrder) {
        self.update_order = update_order;
    }

    /// Allocates a new entity slot.
    ///
    /// ## Panics
    ///  - on index overflow
    ///  - on generation overflow
    pub fn create_entity(&mut self) -> Entity {
        if self.free_indices.is_empty() {
            self.alloc_blank_indices(GROW_AMOUNT);
        }

        let index = self
            .free_indices
            .pop()
            .expect("free index list was just refilled");
        let generation = self.top_generation;
        self.top_generation = generation
            .checked_add(1)
            .expect("entity generation overflow");

        self.generations[index as usize] = Some(generation);
        self.kinds[index as usize] = KindSet::empty();

        Entity { index, generation }
    }

    /// Allocates new blank indices in the free index list.
    fn alloc_blank_indices(&mut self, amount: u32) {
        let top_index = self.generations.len() as u32;
        let new_top_index = top_index
            .checked_add(amount)
            .expect("entity index overflow");
        self.free_indices.extend((top_index..new_top_index).rev());
        // Keep the per-index tables covering every handed out index
        self.generations.resize(new_top_index as usize, None);
        self.kinds.resize(new_top_index as usize, KindSet::empty());
    }

    /// Checks whether provided [`Entity`] constitutes a valid handle.
    #[inline]
    pub fn validate_entity(&self, entity: Entity) -> bool {
        matches!(
            self.generations.get(entity.index as usize),
            Some(&Some(generation)) if generation == entity.generation
        )
    }

    /// Destroys the entity along with every component record attached to it. Does nothing for
    /// invalid handles.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.validate_entity(entity) {
            return;
        }

        let index = entity.index as usize;
        for kind in self.kinds[index].kinds() {
            self.components.remove_record(kind, entity);
        }

        self.kinds[index] = KindSet::empty();
        self.generations[index] = None;
        self.free_indices.push(entity.index);
    }

    /// Destroys every entity. Handles issued before stay invalid afterwards.
    pub fn clear(&mut self) {
        let live = self.iter_entities().collect::<Vec<_>>();
        for entity in live {
            self.destroy_entity(entity);
        }
        self.components.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.generations.iter().filter(|g| g.is_some()).count()
    }

    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.generations
            .iter()
            .enumerate()
            .filter_map(|(index, generation)| {
                Some(Entity {
                    index: index as u32,
                    generation: (*generation)?,
                })
            })
    }

    /// Kinds attached to the entity, empty for invalid handles.
    pub fn kinds_of(&self, entity: Entity) -> KindSet {
        if self.validate_entity(entity) {
            self.kinds[entity.index as usize]
        } else {
            KindSet::empty()
        }
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    pub fn component<T: RegisteredComponent>(&self) -> &T {
        T::get(&self.components)
    }

    pub fn component_mut<T: RegisteredComponent>(&mut self) -> &mut T {
        T::get_mut(&mut self.components)
    }

    /// Attaches `kind` with its default record, dependencies first. Returns `false` if it was
    /// already attached.
    fn attach_kind(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        let index = entity.index as usize;
        if self.kinds[index].contains(kind.flag()) {
            return false;
        }

        for &dependency in kind.dependencies() {
            self.attach_kind(entity, dependency);
        }

        self.components.attach_default(kind, entity);
        self.kinds[index].insert(kind.flag());
        true
    }

    /// Attaches the component to the entity with its default record. Attaching a component that's
    /// already there keeps the existing record. Returns whether anything was attached.
    pub fn add_component<T: RegisteredComponent>(&mut self, entity: Entity) -> bool {
        self.validate_entity(entity) && self.attach_kind(entity, T::KIND)
    }

    /// Detaches the component. Dependent components stay attached. Returns whether anything was
    /// removed.
    pub fn remove_component<T: RegisteredComponent>(&mut self, entity: Entity) -> bool {
        self.remove_kind(entity, T::KIND)
    }

    pub fn remove_kind(&mut self, entity: Entity, kind: ComponentKind) -> bool {
        if !self.validate_entity(entity) {
            return false;
        }

        let index = entity.index as usize;
        if !self.kinds[index].contains(kind.flag()) {
            return false;
        }

        self.kinds[index].remove(kind.flag());
        self.components.remove_record(kind, entity)
    }

    pub fn has_component<T: RegisteredComponent>(&self, entity: Entity) -> bool {
        self.kinds_of(entity).contains(T::KIND.flag())
    }

    pub fn get_component_data<T: RegisteredComponent>(&self, entity: Entity) -> Option<&T::Data> {
        if !self.validate_entity(entity) {
            return None;
        }
        T::get(&self.components).storage().get(entity)
    }

    pub fn get_component_data_mut<T: RegisteredComponent>(
        &mut self,
        entity: Entity,
    ) -> Option<&mut T::Data> {
        if !self.validate_entity(entity) {
            return None;
        }
        T::get_mut(&mut self.components).storage_mut().get_mut(entity)
    }

    /// Parses a definition blob and attaches the matching component, overwriting its record if
    /// it was already attached. Dependencies are attached first, with default records.
    ///
    /// On error, the entity is left untouched.
    pub fn add_from_raw_data(
        &mut self,
        entity: Entity,
        raw: &[u8],
    ) -> Result<ComponentKind, AttachError> {
        let name = peek_definition_name(raw).ok_or(AttachError::MissingTag)?;
        let kind = ComponentKind::from_node_name(name).ok_or(AttachError::UnknownTag(name))?;
        self.import_kind(entity, kind, raw)?;
        Ok(kind)
    }

    /// Like [`Self::add_from_raw_data`], but only accepts `T`'s definitions.
    pub fn add_from_raw_data_as<T: RegisteredComponent>(
        &mut self,
        entity: Entity,
        raw: &[u8],
    ) -> Result<(), AttachError> {
        self.import_kind(entity, T::KIND, raw)
    }

    /// Attaches a component from an already parsed definition.
    pub fn add_from_def<T: RegisteredComponent>(
        &mut self,
        entity: Entity,
        def: T::Def,
    ) -> Result<(), AttachError> {
        if !self.validate_entity(entity) {
            return Err(AttachError::InvalidEntity(entity));
        }

        self.attach_kind(entity, T::KIND);
        let component = T::get_mut(&mut self.components);
        let data = component.data_from_def(def);
        component.storage_mut().insert(entity, data);
        Ok(())
    }

    fn import_kind(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
        raw: &[u8],
    ) -> Result<(), AttachError> {
        if !self.validate_entity(entity) {
            return Err(AttachError::InvalidEntity(entity));
        }

        // The record is only written once the blob parses, so errors leave the entity as it was
        self.components.import_record(kind, entity, raw)?;
        for &dependency in kind.dependencies() {
            self.attach_kind(entity, dependency);
        }
        self.kinds[entity.index as usize].insert(kind.flag());
        Ok(())
    }

    /// Serializes the entity's `T` record. `None` if there's no record, or if it can't be
    /// serialized (which gets logged).
    pub fn export_raw_data<T: RegisteredComponent>(&self, entity: Entity) -> Option<Vec<u8>> {
        let data = self.get_component_data::<T>(entity)?;
        let component = T::get(&self.components);

        match write_definition(&component.def_from_data(data)) {
            Ok(raw) => Some(raw),
            Err(error) => {
                error!("couldn't export {} of {entity}: {error:#}", T::KIND);
                None
            }
        }
    }

    /// Serializes every component of the entity, in registration order.
    pub fn export_entity(&self, entity: Entity) -> Option<EntityDef> {
        if !self.validate_entity(entity) {
            return None;
        }

        let mut definition = EntityDef::new();
        for kind in self.kinds_of(entity).kinds() {
            let exported = self
                .components
                .export_record(kind, entity)
                .map(|result| result.and_then(RawDefinition::new));

            match exported {
                Some(Ok(raw)) => definition.components.push(raw),
                Some(Err(error)) => error!("couldn't export {kind} of {entity}: {error:#}"),
                None => error!("{entity} is marked with {kind}, but has no record"),
            }
        }
        Some(definition)
    }

    /// Creates an entity out of definition blobs. Malformed blobs are logged and skipped.
    pub fn spawn_entity(&mut self, definition: &EntityDef) -> Entity {
        let entity = self.create_entity();
        for raw in &definition.components {
            if let Err(error) = self.add_from_raw_data(entity, raw.bytes()) {
                warn!(
                    "skipping `{}` definition of spawned entity {entity}: {error}",
                    raw.name()
                );
            }
        }
        entity
    }

    /// Updates every component kind in the configured order, then applies the structural
    /// changes queued in the context. Entities spawned here get their first update next frame.
    pub fn update_all(&mut self, ctx: &mut UpdateContext<'_>, delta: Duration) {
        for &kind in self.update_order.kinds() {
            self.components.update(kind, ctx, delta);
        }

        self.apply_commands(ctx.commands.take());
    }

    fn apply_commands(&mut self, commands: Vec<Command>) {
        if !commands.is_empty() {
            trace!("applying {} queued entity commands", commands.len());
        }

        for command in commands {
            match command {
                Command::Spawn(definition) => {
                    self.spawn_entity(&definition);
                }
                Command::Despawn(entity) => self.destroy_entity(entity),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::*,
        input::{InputConfig, InputSnapshot},
        rails::{Rail, RailManager},
    };
    use glam::{Quat, Vec3, Vec4};
    use rafter_lvl::{
        defs::{PlayerDef, RailDenizenDef, SimpleMovementDef, TransformDef},
        read_definition, RailDef,
    };

    struct Frame {
        rails: RailManager,
        input: InputSnapshot,
        input_config: InputConfig,
    }

    impl Frame {
        fn new() -> Self {
            Self {
                rails: RailManager::new(),
                input: InputSnapshot::default(),
                input_config: InputConfig::default(),
            }
        }

        fn run(&self, universe: &mut Universe, millis: u64, active_player: Option<Entity>) {
            let mut ctx = UpdateContext::new(&self.rails, &self.input, &self.input_config);
            ctx.active_player = active_player;
            universe.update_all(&mut ctx, Duration::from_millis(millis));
        }
    }

    #[test]
    fn destroyed_handles_are_invalid() {
        let mut universe = Universe::new();
        let entity = universe.create_entity();
        assert!(universe.add_component::<SimpleMovementComponent>(entity));
        assert_eq!(universe.entity_count(), 1);

        universe.destroy_entity(entity);
        assert!(!universe.validate_entity(entity));
        assert!(universe
            .get_component_data::<TransformComponent>(entity)
            .is_none());
        assert_eq!(universe.kinds_of(entity), KindSet::empty());
        assert_eq!(universe.components().record_count(), 0);

        // Destroying twice is a no-op
        universe.destroy_entity(entity);

        let recycled = universe.create_entity();
        assert_eq!(recycled.index, entity.index);
        assert_ne!(recycled.generation, entity.generation);
        assert!(!universe.validate_entity(entity));
        assert!(!universe.has_component::<TransformComponent>(recycled));
    }

    #[test]
    fn dependencies_attach_first() {
        let mut universe = Universe::new();
        let entity = universe.create_entity();

        assert!(universe.add_component::<RailDenizenComponent>(entity));
        assert_eq!(
            universe.kinds_of(entity),
            KindSet::TRANSFORM | KindSet::RAIL_DENIZEN
        );

        // Attaching twice keeps the record
        universe
            .get_component_data_mut::<TransformComponent>(entity)
            .unwrap()
            .position = Vec3::ONE;
        assert!(!universe.add_component::<TransformComponent>(entity));
        assert_eq!(
            universe
                .get_component_data::<TransformComponent>(entity)
                .unwrap()
                .position,
            Vec3::ONE
        );

        // Removing a dependency leaves dependents alone
        assert!(universe.remove_component::<TransformComponent>(entity));
        assert!(!universe.remove_component::<TransformComponent>(entity));
        assert!(universe.has_component::<RailDenizenComponent>(entity));
    }

    #[test]
    fn raw_data_round_trip() {
        let mut universe = Universe::new();
        let original = universe.create_entity();

        let def = RailDenizenDef {
            rail_name: String::from("river"),
            distance: 12.5,
            speed: -2.0,
            attach_offset: Vec3::new(0.0, 0.0, 1.0),
            enabled: true,
            timed: false,
            facing: Vec3::Y,
        };
        universe
            .add_from_def::<RailDenizenComponent>(original, def.clone())
            .unwrap();

        let raw = universe
            .export_raw_data::<RailDenizenComponent>(original)
            .unwrap();
        assert_eq!(read_definition::<RailDenizenDef>(&raw), Ok(def));

        let copy = universe.create_entity();
        assert_eq!(
            universe.add_from_raw_data(copy, &raw),
            Ok(ComponentKind::RailDenizen)
        );
        assert_eq!(
            universe.get_component_data::<RailDenizenComponent>(copy),
            universe.get_component_data::<RailDenizenComponent>(original)
        );
        assert!(universe.has_component::<TransformComponent>(copy));

        assert!(universe
            .export_raw_data::<PlayerComponent>(original)
            .is_none());
    }

    #[test]
    fn whole_entities_round_trip() {
        let mut universe = Universe::new();
        let original = universe.create_entity();
        universe
            .add_from_def::<TransformComponent>(
                original,
                TransformDef {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    orientation: Quat::from_rotation_z(1.0),
                    scale: Vec3::splat(2.0),
                },
            )
            .unwrap();
        universe.add_component::<LightComponent>(original);

        let definition = universe.export_entity(original).unwrap();
        assert_eq!(definition.components.len(), 2);

        let copy = universe.spawn_entity(&definition);
        assert_eq!(universe.kinds_of(copy), universe.kinds_of(original));
        assert_eq!(
            universe.get_component_data::<TransformComponent>(copy),
            universe.get_component_data::<TransformComponent>(original)
        );
        assert_eq!(
            universe.get_component_data::<LightComponent>(copy),
            Some(&LightData::default())
        );
    }

    #[test]
    fn malformed_definitions_leave_entities_untouched() {
        let mut universe = Universe::new();
        let entity = universe.create_entity();

        let mut raw = write_definition(&SimpleMovementDef {
            velocity: Vec3::X,
            lifetime: 0.0,
        })
        .unwrap();
        raw.push(0);
        assert!(matches!(
            universe.add_from_raw_data(entity, &raw),
            Err(AttachError::Definition(DefinitionError::Malformed { .. }))
        ));
        assert_eq!(universe.kinds_of(entity), KindSet::empty());

        assert_eq!(
            universe.add_from_raw_data(entity, b"NOPE\0\0\0\0"),
            Err(AttachError::UnknownTag(NodeName(*b"NOPE")))
        );
        assert_eq!(
            universe.add_from_raw_data(entity, b"TR"),
            Err(AttachError::MissingTag)
        );

        let raw = write_definition(&SimpleMovementDef { velocity: Vec3::X, lifetime: 0.0 }).unwrap();
        assert!(matches!(
            universe.add_from_raw_data_as::<TransformComponent>(entity, &raw),
            Err(AttachError::Definition(DefinitionError::WrongTag { .. }))
        ));
        assert_eq!(universe.kinds_of(entity), KindSet::empty());

        universe.destroy_entity(entity);
        assert_eq!(
            universe.add_from_raw_data(entity, &raw),
            Err(AttachError::InvalidEntity(entity))
        );
    }

    #[test]
    fn simple_movement_scenario() {
        let mut universe = Universe::new();
        let entity = universe.create_entity();
        universe
            .add_from_def::<SimpleMovementComponent>(entity, SimpleMovementDef { velocity: Vec3::X, lifetime: 0.0 })
            .unwrap();

        Frame::new().run(&mut universe, 1000, None);

        let transform = universe
            .get_component_data::<TransformComponent>(entity)
            .unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn missing_dependencies_are_skipped() {
        let mut universe = Universe::new();
        let entity = universe.create_entity();
        universe.add_component::<SimpleMovementComponent>(entity);
        universe.remove_component::<TransformComponent>(entity);

        Frame::new().run(&mut universe, 1000, None);
        Frame::new().run(&mut universe, 1000, None);

        let movement = universe.component::<SimpleMovementComponent>().storage();
        assert!(movement.was_reported(entity));
        assert!(!universe.has_component::<TransformComponent>(entity));
    }

    #[test]
    fn rail_scenario() {
        let mut frame = Frame::new();
        let rail = RailDef {
            name: None,
            total_time: 10.0,
            reliable_distance: 0.0,
            points: vec![Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0), Vec3::new(10.0, 10.0, 0.0)],
            wrap: false,
        };
        frame.rails.insert(Rail::from_def("river", &rail).unwrap());

        let mut universe = Universe::new();
        let raft = universe.create_entity();
        universe
            .add_from_def::<RailDenizenComponent>(
                raft,
                RailDenizenDef {
                    rail_name: String::from("river"),
                    distance: 0.0,
                    speed: 4.0,
                    attach_offset: Vec3::new(0.0, 0.0, 0.5),
                    enabled: true,
                    timed: false,
                    facing: Vec3::Y,
                },
            )
            .unwrap();

        frame.run(&mut universe, 1000, None);
        let transform = universe
            .get_component_data::<TransformComponent>(raft)
            .unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::new(0.0, 4.0, 0.5), 1e-5));
        assert!(transform.facing().abs_diff_eq(Vec3::Y, 1e-5));

        // Past the corner, then clamped at the end of the open rail
        frame.run(&mut universe, 2000, None);
        let transform = universe
            .get_component_data::<TransformComponent>(raft)
            .unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::new(2.0, 10.0, 0.5), 1e-4));
        assert!(transform.facing().abs_diff_eq(Vec3::X, 1e-4));

        frame.run(&mut universe, 10_000, None);
        let denizen = universe
            .get_component_data::<RailDenizenComponent>(raft)
            .unwrap();
        assert_eq!(denizen.distance, 20.0);

        // Unknown rails are skipped, and reported once
        universe
            .get_component_data_mut::<RailDenizenComponent>(raft)
            .unwrap()
            .rail_name = String::from("lake");
        frame.run(&mut universe, 1000, None);
        assert!(universe
            .component::<RailDenizenComponent>()
            .storage()
            .was_reported(raft));
        assert_eq!(
            universe
                .get_component_data::<TransformComponent>(raft)
                .unwrap()
                .position,
            Vec3::new(10.0, 10.0, 0.5)
        );
    }

    #[test]
    fn timed_rails_use_natural_speed() {
        let mut frame = Frame::new();
        let rail = RailDef {
            name: None,
            total_time: 5.0,
            reliable_distance: 0.0,
            points: vec![Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)],
            wrap: true,
        };
        frame.rails.insert(Rail::from_def("loop", &rail).unwrap());
        // Closed with a segment back to the start, 40 units in 5 seconds
        assert_eq!(frame.rails.get_rail("loop").unwrap().natural_speed(), 8.0);

        let mut universe = Universe::new();
        let entity = universe.create_entity();
        universe
            .add_from_def::<RailDenizenComponent>(
                entity,
                RailDenizenDef {
                    rail_name: String::from("loop"),
                    distance: 0.0,
                    speed: 0.5,
                    attach_offset: Vec3::ZERO,
                    enabled: true,
                    timed: true,
                    facing: Vec3::Y,
                },
            )
            .unwrap();

        frame.run(&mut universe, 1000, None);
        let denizen = universe
            .get_component_data::<RailDenizenComponent>(entity)
            .unwrap();
        assert!((denizen.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn spawns_appear_next_frame() {
        let mut frame = Frame::new();
        frame.input.fire = true;

        let mut universe = Universe::new();
        let player = universe.create_entity();
        universe
            .add_from_def::<PlayerComponent>(
                player,
                PlayerDef {
                    yaw: 0.0,
                    pitch: 0.0,
                    projectile_speed: 10.0,
                    projectile_mesh: String::from("meshes/projectile"),
                    projectile_shader: String::from("shaders/textured"),
                    fire_cooldown: 0.5,
                    projectile_lifetime: 0.25,
                },
            )
            .unwrap();

        // Not the active player, no reaction to input
        frame.run(&mut universe, 100, None);
        assert_eq!(universe.entity_count(), 1);

        frame.run(&mut universe, 100, Some(player));
        assert_eq!(universe.entity_count(), 2);

        let projectile = universe.iter_entities().find(|&e| e != player).unwrap();
        let transform = universe
            .get_component_data::<TransformComponent>(projectile)
            .unwrap();
        // Spawned this frame, so it hasn't moved yet
        assert!(transform.position.abs_diff_eq(Vec3::Y, 1e-5));
        assert_eq!(
            universe
                .get_component_data::<RenderMeshComponent>(projectile)
                .unwrap()
                .tint,
            Vec4::ONE
        );

        // Cooling down
        frame.run(&mut universe, 100, Some(player));
        assert_eq!(universe.entity_count(), 2);
        let transform = universe
            .get_component_data::<TransformComponent>(projectile)
            .unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn projectiles_despawn_after_their_lifetime() {
        let mut frame = Frame::new();
        frame.input.fire = true;

        let mut universe = Universe::new();
        let player = universe.create_entity();
        universe.add_component::<PlayerComponent>(player);
        universe
            .get_component_data_mut::<PlayerComponent>(player)
            .unwrap()
            .projectile_lifetime = 0.25;

        frame.run(&mut universe, 100, Some(player));
        assert_eq!(universe.entity_count(), 2);
        let projectile = universe.iter_entities().find(|&e| e != player).unwrap();

        frame.input.fire = false;
        frame.run(&mut universe, 200, Some(player));
        assert!(universe.validate_entity(projectile));

        frame.run(&mut universe, 100, Some(player));
        assert_eq!(universe.entity_count(), 1);
        assert!(!universe.validate_entity(projectile));
        assert!(universe
            .get_component_data::<TransformComponent>(projectile)
            .is_none());
    }

    #[test]
    fn denizen_facing_survives_export() {
        let mut frame = Frame::new();
        let rail = RailDef {
            name: None,
            total_time: 0.0,
            reliable_distance: 0.0,
            points: vec![Vec3::new(5.0, 0.0, 0.0)],
            wrap: false,
        };
        frame.rails.insert(Rail::from_def("buoy", &rail).unwrap());

        let mut universe = Universe::new();
        let entity = universe.create_entity();
        universe
            .add_from_def::<RailDenizenComponent>(
                entity,
                RailDenizenDef {
                    rail_name: String::from("buoy"),
                    distance: 0.0,
                    speed: 1.0,
                    attach_offset: Vec3::ZERO,
                    enabled: true,
                    timed: false,
                    facing: Vec3::new(2.0, 0.0, 0.0),
                },
            )
            .unwrap();

        // The rail has no direction to offer, so the stored one is used
        frame.run(&mut universe, 100, None);
        let transform = universe
            .get_component_data::<TransformComponent>(entity)
            .unwrap();
        assert!(transform.facing().abs_diff_eq(Vec3::X, 1e-5));

        let definition = universe.export_entity(entity).unwrap();
        universe.destroy_entity(entity);
        let copy = universe.spawn_entity(&definition);

        frame.run(&mut universe, 100, None);
        let transform = universe
            .get_component_data::<TransformComponent>(copy)
            .unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!(transform.facing().abs_diff_eq(Vec3::X, 1e-5));

        // No usable direction at all falls back to +Y
        let denizen = universe
            .get_component_data::<RailDenizenComponent>(copy)
            .cloned()
            .unwrap();
        let mut def = RailDenizenComponent::default().def_from_data(&denizen);
        def.facing = Vec3::ZERO;
        let other = universe.create_entity();
        universe
            .add_from_def::<RailDenizenComponent>(other, def)
            .unwrap();
        assert_eq!(
            universe
                .get_component_data::<RailDenizenComponent>(other)
                .unwrap()
                .facing,
            FORWARD
        );
    }

    #[test]
    fn update_order_is_configurable() {
        let mut frame = Frame::new();
        let rail = RailDef {
            name: None,
            total_time: 0.0,
            reliable_distance: 0.0,
            points: vec![Vec3::ZERO, Vec3::new(0.0, 100.0, 0.0)],
            wrap: false,
        };
        frame.rails.insert(Rail::from_def("river", &rail).unwrap());

        let setup = |order: UpdateOrder| {
            let mut universe = Universe::with_update_order(order);
            let entity = universe.create_entity();
            universe
                .add_from_def::<RailDenizenComponent>(
                    entity,
                    RailDenizenDef {
                        rail_name: String::from("river"),
                        distance: 10.0,
                        speed: 0.0,
                        attach_offset: Vec3::ZERO,
                        enabled: true,
                        timed: false,
                        facing: Vec3::Y,
                    },
                )
                .unwrap();
            universe
                .add_from_def::<SimpleMovementComponent>(entity, SimpleMovementDef { velocity: Vec3::Z, lifetime: 0.0 })
                .unwrap();
            (universe, entity)
        };

        // By default the rail places the entity, then movement applies on top
        let (mut universe, entity) = setup(UpdateOrder::default());
        frame.run(&mut universe, 1000, None);
        let position = universe
            .get_component_data::<TransformComponent>(entity)
            .unwrap()
            .position;
        assert!(position.abs_diff_eq(Vec3::new(0.0, 10.0, 1.0), 1e-5));

        // The other way around the rail has the last word
        let reversed = UpdateOrder::new(&[
            ComponentKind::Player,
            ComponentKind::SimpleMovement,
            ComponentKind::RailDenizen,
            ComponentKind::Transform,
            ComponentKind::Physics,
            ComponentKind::Light,
            ComponentKind::RenderMesh,
        ])
        .unwrap();
        let (mut universe, entity) = setup(reversed);
        frame.run(&mut universe, 1000, None);
        let position = universe
            .get_component_data::<TransformComponent>(entity)
            .unwrap()
            .position;
        assert!(position.abs_diff_eq(Vec3::new(0.0, 10.0, 0.0), 1e-5));
    }

    #[test]
    fn physics_follows_transforms() {
        let mut universe = Universe::new();
        let body = universe.create_entity();
        universe.add_component::<PhysicsComponent>(body);
        {
            let data = universe
                .get_component_data_mut::<PhysicsComponent>(body)
                .unwrap();
            data.kinematic = false;
            data.offset = Vec3::Z;
        }

        Frame::new().run(&mut universe, 500, None);

        let data = universe
            .get_component_data::<PhysicsComponent>(body)
            .unwrap();
        assert!(data.velocity.abs_diff_eq(Vec3::new(0.0, 0.0, -9.81 * 0.5), 1e-4));
        let position = universe
            .get_component_data::<TransformComponent>(body)
            .unwrap()
            .position;
        assert!(position.abs_diff_eq(data.velocity * 0.5, 1e-4));
        assert!(data.body_position.abs_diff_eq(position + Vec3::Z, 1e-5));
    }

    #[test]
    fn clearing_invalidates_everything() {
        let mut universe = Universe::new();
        let entities = (0..60).map(|_| universe.create_entity()).collect::<Vec<_>>();
        for &entity in &entities {
            universe.add_component::<RenderMeshComponent>(entity);
        }
        assert_eq!(universe.entity_count(), 60);

        universe.clear();
        assert_eq!(universe.entity_count(), 0);
        assert_eq!(universe.components().record_count(), 0);
        assert!(entities.iter().all(|&e| !universe.validate_entity(e)));
    }
}
