//! Rails: predefined paths entities travel along, see [`crate::components::RailDenizenComponent`].

use ahash::AHashMap;
use log::*;
use rafter_lvl::RailDef;
use rafter_utils::{AnyResult, AnyhowResultExt};
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

mod rail;
pub use rail::*;

/// File extension of rail assets.
pub const RAIL_EXTENSION: &str = "rail";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RailError {
    #[error("`{0}` is not a .rail file")]
    WrongExtension(PathBuf),
    #[error("rail `{0}` has no waypoints")]
    NoWaypoints(String),
    #[error("rail `{rail}` has a non-finite waypoint at index {index}")]
    InvalidWaypoint { rail: String, index: usize },
    #[error("rail `{rail}` has an invalid total time ({total_time})")]
    InvalidTotalTime { rail: String, total_time: f32 },
}

/// Owns every loaded rail. Rails are immutable once loaded and handed out as [`Arc`]s.
#[derive(Debug, Default)]
pub struct RailManager {
    rails: AHashMap<String, Arc<Rail>>,
}

impl RailManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `.rail` file. The rail is registered under the file's stem.
    pub fn load_rail(&mut self, path: impl AsRef<Path>) -> AnyResult<Arc<Rail>> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some(RAIL_EXTENSION) {
            return Err(RailError::WrongExtension(path.to_path_buf()).into());
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .otherwise(format!("rail path `{}` has no usable name", path.display()))?
            .to_string();

        let file = File::open(path).otherwise(format!("couldn't open `{}`", path.display()))?;
        self.load_rail_from_reader(name, &mut BufReader::new(file))
    }

    pub fn load_rail_from_reader<R: Read + Seek>(
        &mut self,
        name: impl Into<String>,
        r: &mut R,
    ) -> AnyResult<Arc<Rail>> {
        let name = name.into();
        let def = RailDef::read(r).map_err(|e| e.context(format!("couldn't read rail `{name}`")))?;
        Ok(self.insert(Rail::from_def(name, &def)?))
    }

    /// Registers a rail, replacing any rail with the same name.
    pub fn insert(&mut self, rail: Rail) -> Arc<Rail> {
        let rail = Arc::new(rail);
        info!(
            "loaded rail `{}` ({} waypoints, {:.1} units)",
            rail.name(),
            rail.points().len(),
            rail.length()
        );

        let name = rail.name().to_string();
        if self.rails.insert(name, rail.clone()).is_some() {
            warn!("rail `{}` was loaded twice, keeping the newer one", rail.name());
        }
        rail
    }

    /// Loads every listed rail, stopping at the first failure.
    pub fn load_rails<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> AnyResult {
        for path in paths {
            self.load_rail(path)?;
        }
        Ok(())
    }

    pub fn get_rail(&self, name: &str) -> Option<&Arc<Rail>> {
        self.rails.get(name)
    }

    pub fn len(&self) -> usize {
        self.rails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rails.is_empty()
    }

    pub fn clear(&mut self) {
        self.rails.clear();
    }
}
