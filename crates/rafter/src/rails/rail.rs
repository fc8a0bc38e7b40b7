use super::RailError;
use glam::Vec3;
use itertools::Itertools;
use rafter_lvl::RailDef;

/// A point on a rail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailSample {
    pub position: Vec3,
    /// `None` on rails without any length, in which case the caller keeps its last facing
    pub facing: Option<Vec3>,
}

/// A polyline entities can be attached to, evaluated by distance travelled along it.
///
/// Wrapping rails are closed with an extra segment from the last waypoint back to the first one,
/// unless those already coincide.
#[derive(Debug, Clone)]
pub struct Rail {
    name: String,
    points: Vec<Vec3>,
    /// Distance from the start to each point, `cumulative[0] == 0`
    cumulative: Vec<f32>,
    total_length: f32,
    total_time: f32,
    reliable_distance: f32,
    wrap: bool,
}

impl Rail {
    pub fn from_def(name: impl Into<String>, def: &RailDef) -> Result<Self, RailError> {
        let name = name.into();

        if def.points.is_empty() {
            return Err(RailError::NoWaypoints(name));
        }
        if let Some(index) = def.points.iter().position(|p| !p.is_finite()) {
            return Err(RailError::InvalidWaypoint { rail: name, index });
        }
        if !def.total_time.is_finite() || def.total_time < 0.0 {
            return Err(RailError::InvalidTotalTime {
                rail: name,
                total_time: def.total_time,
            });
        }

        let mut points = def.points.clone();
        if def.wrap && points.len() > 1 && points.first() != points.last() {
            points.push(points[0]);
        }

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        for (a, b) in points.iter().tuple_windows() {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + a.distance(*b));
        }

        let reliable_distance = if def.reliable_distance.is_finite() {
            def.reliable_distance.max(0.0)
        } else {
            0.0
        };

        Ok(Self {
            name,
            total_length: cumulative[cumulative.len() - 1],
            points,
            cumulative,
            total_time: def.total_time,
            reliable_distance,
            wrap: def.wrap,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waypoints, including the closing one of wrapping rails.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.total_length
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn reliable_distance(&self) -> f32 {
        self.reliable_distance
    }

    pub fn wraps(&self) -> bool {
        self.wrap
    }

    /// Speed at which the whole rail is traversed in its total time. Zero for untimed rails.
    pub fn natural_speed(&self) -> f32 {
        if self.total_time > 0.0 {
            self.total_length / self.total_time
        } else {
            0.0
        }
    }

    /// Maps any distance onto the rail: modulo the length for wrapping rails, clamped to
    /// `0..=length` otherwise.
    pub fn normalize_distance(&self, distance: f32) -> f32 {
        let length = self.total_length;
        if length <= 0.0 || distance.is_nan() {
            return 0.0;
        }

        if self.wrap {
            if !distance.is_finite() {
                return 0.0;
            }
            let wrapped = distance.rem_euclid(length);
            // rem_euclid may round up to the divisor itself
            if wrapped >= length {
                0.0
            } else {
                wrapped
            }
        } else {
            distance.clamp(0.0, length)
        }
    }

    pub fn position_at(&self, distance: f32) -> Vec3 {
        if self.points.len() < 2 || self.total_length <= 0.0 {
            return self.points[0];
        }

        let distance = self.normalize_distance(distance);
        let segment = self.segment_at(distance);
        let start = self.cumulative[segment];
        let segment_length = self.cumulative[segment + 1] - start;

        let t = if segment_length > 0.0 {
            ((distance - start) / segment_length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.points[segment].lerp(self.points[segment + 1], t)
    }

    /// Direction of travel at the distance, smoothed within half the reliable distance of
    /// every joint. Exactly at a joint it's the average of both segments' directions.
    pub fn facing_at(&self, distance: f32) -> Option<Vec3> {
        if self.points.len() < 2 || self.total_length <= 0.0 {
            return None;
        }

        let distance = self.normalize_distance(distance);
        let mut segment = self.segment_at(distance);
        if self.direction(segment).is_none() {
            // Only a trailing run of duplicate waypoints can land here
            segment = self.previous_segment(segment)?;
        }
        let current = self.direction(segment)?;

        let start = self.cumulative[segment];
        let end = self.cumulative[segment + 1];
        let reach = (self.reliable_distance * 0.5).min((end - start) * 0.5);
        if reach <= 0.0 {
            return Some(current);
        }

        let from_start = distance - start;
        let to_end = end - distance;

        let neighbour = if from_start < reach {
            self.previous_segment(segment)
                .map(|s| (s, from_start))
        } else if to_end < reach {
            self.next_segment(segment).map(|s| (s, to_end))
        } else {
            None
        };

        let Some((neighbour, away)) = neighbour else {
            return Some(current);
        };
        let Some(other) = self.direction(neighbour) else {
            return Some(current);
        };

        let weight = 0.5 + 0.5 * (away / reach);
        let blended = current * weight + other * (1.0 - weight);
        Some(blended.try_normalize().unwrap_or(current))
    }

    pub fn sample(&self, distance: f32) -> RailSample {
        RailSample {
            position: self.position_at(distance),
            facing: self.facing_at(distance),
        }
    }

    fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    /// Segment containing the (normalized) distance. Joints belong to the later segment.
    fn segment_at(&self, distance: f32) -> usize {
        self.cumulative
            .partition_point(|&c| c <= distance)
            .saturating_sub(1)
            .min(self.segment_count() - 1)
    }

    /// Unit direction of the segment, `None` for zero length segments.
    fn direction(&self, segment: usize) -> Option<Vec3> {
        (self.points[segment + 1] - self.points[segment]).try_normalize()
    }

    /// Closest earlier segment with a length, crossing the seam of wrapping rails.
    fn previous_segment(&self, segment: usize) -> Option<usize> {
        let count = self.segment_count();
        let mut current = segment;
        for _ in 1..count {
            current = match current {
                0 if self.wrap => count - 1,
                0 => return None,
                _ => current - 1,
            };
            if self.direction(current).is_some() {
                return Some(current);
            }
        }
        None
    }

    /// Closest later segment with a length, crossing the seam of wrapping rails.
    fn next_segment(&self, segment: usize) -> Option<usize> {
        let count = self.segment_count();
        let mut current = segment;
        for _ in 1..count {
            current = match current + 1 {
                next if next < count => next,
                _ if self.wrap => 0,
                _ => return None,
            };
            if self.direction(current).is_some() {
                return Some(current);
            }
        }
        None
    }
}
