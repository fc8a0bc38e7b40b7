//! Registry-defined macros

/// Creates [`ComponentKind`](crate::entities::ComponentKind),
/// [`KindSet`](crate::entities::KindSet), [`Components`](crate::entities::Components) and the
/// kind-dispatched functions operating on them.
///
/// It should **only** be used in `entities/registry.rs`. The generic per-kind operations it
/// dispatches to (`attach_default`, `remove_record`, ...) must be in scope at the invocation.
#[macro_export]
macro_rules! create_components {
    (
        components {
            $($kind:ident: $type:ty),* $(,)*
        }
    ) => {
        paste::paste! {
            /// A registered component kind.
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub enum ComponentKind {
                $($kind,)*
            }

            impl ComponentKind {
                /// Every kind, in registration order.
                pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$kind,)*];

                pub const fn name(self) -> &'static str {
                    match self {
                        $(ComponentKind::$kind => stringify!($kind),)*
                    }
                }

                /// Tag of the kind's definition blobs.
                pub fn node_name(self) -> rafter_lvl::NodeName {
                    match self {
                        $(
                            ComponentKind::$kind => {
                                <<$type as $crate::entities::Component>::Def
                                    as rafter_lvl::Definition>::NODE
                            }
                        )*
                    }
                }

                pub fn from_node_name(name: rafter_lvl::NodeName) -> Option<Self> {
                    Self::ALL.iter().copied().find(|kind| kind.node_name() == name)
                }

                pub fn from_name(name: &str) -> Option<Self> {
                    Self::ALL.iter().copied().find(|kind| kind.name() == name)
                }

                pub fn dependencies(self) -> &'static [ComponentKind] {
                    match self {
                        $(ComponentKind::$kind => <$type as $crate::entities::Component>::DEPENDENCIES,)*
                    }
                }

                pub fn flag(self) -> KindSet {
                    match self {
                        $(ComponentKind::$kind => KindSet::[<$kind:snake:upper>],)*
                    }
                }
            }

            impl std::fmt::Display for ComponentKind {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.name())
                }
            }

            bitflags::bitflags! {
                /// Set of component kinds attached to an entity.
                #[derive(Default)]
                pub struct KindSet: u32 {
                    $(const [<$kind:snake:upper>] = 1 << (ComponentKind::$kind as u32);)*
                }
            }

            impl KindSet {
                /// Iterates over the contained kinds, in registration order.
                pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
                    ComponentKind::ALL
                        .iter()
                        .copied()
                        .filter(move |kind| self.contains(kind.flag()))
                }
            }

            /// One instance of every registered component.
            #[derive(Default)]
            pub struct Components {
                $(pub [<$kind:snake>]: $type,)*
            }

            impl Components {
                pub(super) fn attach_default(&mut self, kind: ComponentKind, entity: Entity) {
                    match kind {
                        $(ComponentKind::$kind => attach_default::<$type>(self, entity),)*
                    }
                }

                pub(super) fn remove_record(&mut self, kind: ComponentKind, entity: Entity) -> bool {
                    match kind {
                        $(ComponentKind::$kind => remove_record::<$type>(self, entity),)*
                    }
                }

                pub(super) fn import_record(
                    &mut self,
                    kind: ComponentKind,
                    entity: Entity,
                    raw: &[u8],
                ) -> Result<(), rafter_lvl::DefinitionError> {
                    match kind {
                        $(ComponentKind::$kind => import_record::<$type>(self, entity, raw),)*
                    }
                }

                pub(super) fn export_record(
                    &self,
                    kind: ComponentKind,
                    entity: Entity,
                ) -> Option<rafter_utils::AnyResult<Vec<u8>>> {
                    match kind {
                        $(ComponentKind::$kind => export_record::<$type>(self, entity),)*
                    }
                }

                pub(super) fn update(
                    &mut self,
                    kind: ComponentKind,
                    ctx: &mut UpdateContext<'_>,
                    delta: std::time::Duration,
                ) {
                    match kind {
                        $(
                            ComponentKind::$kind => {
                                <$type as $crate::entities::Component>::update_all_entities(
                                    self, ctx, delta,
                                )
                            }
                        )*
                    }
                }

                pub fn record_count_of(&self, kind: ComponentKind) -> usize {
                    match kind {
                        $(
                            ComponentKind::$kind => {
                                $crate::entities::Component::storage(&self.[<$kind:snake>]).len()
                            }
                        )*
                    }
                }

                pub(super) fn clear(&mut self) {
                    $(
                        $crate::entities::Component::storage_mut(&mut self.[<$kind:snake>])
                            .clear();
                    )*
                }
            }

            $(
                impl RegisteredComponent for $type {
                    const KIND: ComponentKind = ComponentKind::$kind;

                    #[inline]
                    fn get(components: &Components) -> &Self {
                        &components.[<$kind:snake>]
                    }

                    #[inline]
                    fn get_mut(components: &mut Components) -> &mut Self {
                        &mut components.[<$kind:snake>]
                    }
                }
            )*
        }
    };
}
