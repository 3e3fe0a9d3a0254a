use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn distance_to(&self, other: &Pose) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub is_charger: bool,
}

impl Waypoint {
    pub fn position(&self) -> Pose {
        Pose::new(self.x, self.y, 0.0)
    }
}

/// Directed travel lane between two waypoint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavGraph {
    pub waypoints: Vec<Waypoint>,
    pub lanes: Vec<Lane>,
}

impl NavGraph {
    pub fn find_waypoint(&self, name: &str) -> Option<usize> {
        self.waypoints.iter().position(|wp| wp.name == name)
    }

    pub fn waypoint(&self, index: usize) -> &Waypoint {
        &self.waypoints[index]
    }

    pub fn charging_waypoints(&self) -> Vec<usize> {
        self.waypoints
            .iter()
            .enumerate()
            .filter(|(_, wp)| wp.is_charger)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTraits {
    /// Nominal linear speed in m/s.
    pub linear_velocity: f64,
    /// Nominal angular speed in rad/s.
    pub angular_velocity: f64,
}

impl Default for VehicleTraits {
    fn default() -> Self {
        Self { linear_velocity: 0.7, angular_velocity: 0.6 }
    }
}

/// Set of closed lane indices. Lanes are open unless closed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneClosures {
    closed: HashSet<usize>,
}

impl LaneClosures {
    pub fn is_open(&self, lane: usize) -> bool {
        !self.closed.contains(&lane)
    }

    pub fn is_closed(&self, lane: usize) -> bool {
        self.closed.contains(&lane)
    }

    pub fn close(&mut self, lane: usize) {
        self.closed.insert(lane);
    }

    pub fn open(&mut self, lane: usize) {
        self.closed.remove(&lane);
    }
}

/// Immutable snapshot of everything the navigation planner needs. Updates
/// build a fresh configuration and rebind the shared planner reference.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub graph: Arc<NavGraph>,
    pub traits: VehicleTraits,
    pub lane_closures: LaneClosures,
}

/// A pose pinned to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub pose: Pose,
    pub time: DateTime<Utc>,
}

/// Timed path through space. A trajectory with fewer than two points has
/// no segments and describes no motion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn finish_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.time)
    }
}

/// Interpolates an ordered pose path into a timed trajectory using the
/// vehicle's nominal linear speed. Consecutive coincident poses collapse,
/// so a degenerate path yields a trajectory with zero segments.
pub fn interpolate_positions(
    traits: &VehicleTraits,
    start_time: DateTime<Utc>,
    path: &[Pose],
) -> Trajectory {
    let mut points: Vec<TrajectoryPoint> = Vec::new();
    let mut time = start_time;

    for pose in path {
        match points.last() {
            None => points.push(TrajectoryPoint { pose: *pose, time }),
            Some(last) => {
                let distance = last.pose.distance_to(pose);
                if distance <= f64::EPSILON {
                    continue;
                }
                let travel_secs = distance / traits.linear_velocity.max(1e-6);
                time += Duration::milliseconds((travel_secs * 1000.0) as i64);
                points.push(TrajectoryPoint { pose: *pose, time });
            }
        }
    }

    Trajectory { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_interpolates_to_zero_segments() {
        let trajectory =
            interpolate_positions(&VehicleTraits::default(), Utc::now(), &[]);
        assert!(trajectory.is_empty());
    }

    #[test]
    fn coincident_poses_collapse() {
        let pose = Pose::new(1.0, 1.0, 0.0);
        let trajectory = interpolate_positions(
            &VehicleTraits::default(),
            Utc::now(),
            &[pose, pose, pose],
        );
        assert!(trajectory.is_empty());
    }

    #[test]
    fn times_increase_along_the_path() {
        let start = Utc::now();
        let trajectory = interpolate_positions(
            &VehicleTraits { linear_velocity: 1.0, angular_velocity: 1.0 },
            start,
            &[
                Pose::new(0.0, 0.0, 0.0),
                Pose::new(3.0, 4.0, 0.0),
                Pose::new(3.0, 10.0, 0.0),
            ],
        );
        assert_eq!(trajectory.segment_count(), 2);
        let points = trajectory.points();
        assert_eq!(points[0].time, start);
        assert!(points[1].time > points[0].time);
        assert!(points[2].time > points[1].time);
        assert_eq!(trajectory.finish_time(), Some(points[2].time));
    }
}
