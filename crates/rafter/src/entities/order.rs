use super::ComponentKind;
use smallvec::SmallVec;
use thiserror::Error;

/// Order in which [`super::Universe::update_all`] updates the component kinds. Always a
/// permutation of [`ComponentKind::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrder(SmallVec<[ComponentKind; 8]>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateOrderError {
    #[error("unknown component kind `{0}` in the update order")]
    Unknown(String),
    #[error("component kind `{0}` is listed more than once in the update order")]
    Duplicate(ComponentKind),
    #[error("component kind `{0}` is missing from the update order")]
    Missing(ComponentKind),
}

impl Default for UpdateOrder {
    /// Input handling runs first, consumers of final transforms run last.
    fn default() -> Self {
        Self(SmallVec::from_slice(&[
            ComponentKind::Player,
            ComponentKind::RailDenizen,
            ComponentKind::SimpleMovement,
            ComponentKind::Transform,
            ComponentKind::Physics,
            ComponentKind::Light,
            ComponentKind::RenderMesh,
        ]))
    }
}

impl UpdateOrder {
    pub fn new(kinds: &[ComponentKind]) -> Result<Self, UpdateOrderError> {
        let mut order = SmallVec::<[ComponentKind; 8]>::new();
        for &kind in kinds {
            if order.contains(&kind) {
                return Err(UpdateOrderError::Duplicate(kind));
            }
            order.push(kind);
        }

        if let Some(&missing) = ComponentKind::ALL.iter().find(|k| !order.contains(k)) {
            return Err(UpdateOrderError::Missing(missing));
        }

        Ok(Self(order))
    }

    /// Parses kind names, as written in the config file.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, UpdateOrderError> {
        let kinds = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                ComponentKind::from_name(name)
                    .ok_or_else(|| UpdateOrderError::Unknown(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&kinds)
    }

    pub fn kinds(&self) -> &[ComponentKind] {
        &self.0
    }

    pub fn position(&self, kind: ComponentKind) -> Option<usize> {
        self.0.iter().position(|&k| k == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order() {
        let order = UpdateOrder::default();
        assert_eq!(order.kinds().len(), ComponentKind::ALL.len());
        assert!(
            order.position(ComponentKind::RailDenizen) < order.position(ComponentKind::Transform)
        );
        assert!(order.position(ComponentKind::Transform) < order.position(ComponentKind::Physics));
        assert_eq!(UpdateOrder::new(order.kinds()), Ok(order.clone()));
    }

    #[test]
    fn invalid_orders() {
        assert_eq!(
            UpdateOrder::from_names(&["Transform", "Rocket"]),
            Err(UpdateOrderError::Unknown("Rocket".into()))
        );
        assert_eq!(
            UpdateOrder::new(&[ComponentKind::Transform, ComponentKind::Transform]),
            Err(UpdateOrderError::Duplicate(ComponentKind::Transform))
        );
        assert!(matches!(
            UpdateOrder::new(&[ComponentKind::Transform]),
            Err(UpdateOrderError::Missing(_))
        ));
    }

    #[test]
    fn names_from_config() {
        let names = [
            "Transform",
            "Player",
            "RailDenizen",
            "SimpleMovement",
            "Physics",
            "RenderMesh",
            "Light",
        ];
        let order = UpdateOrder::from_names(&names).unwrap();
        assert_eq!(order.kinds()[0], ComponentKind::Transform);
    }
}
