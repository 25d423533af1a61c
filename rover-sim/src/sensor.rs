use crate::{Layout, Rect};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_3;

/// Number of rays cast by the sensor.
pub const N_RAYS: usize = 3;

/// Configuration of [`RayCastSensor`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SensorConfig {
    /// Maximum sensing distance in world units.
    pub range: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { range: 200. }
    }
}

/// A three-ray distance sensor.
///
/// Rays are cast at -60, 0 and +60 degrees relative to the car heading.
/// Each ray marches outward in unit increments and stops at the first
/// sample point inside an obstacle or outside the arena, mimicking a
/// panning ultrasonic range finder. Readings are normalized by the sensor
/// range, so an unobstructed ray reads 1.0.
#[derive(Debug, Clone)]
pub struct RayCastSensor {
    range: f32,
}

impl RayCastSensor {
    /// Constructs a sensor.
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            range: config.range,
        }
    }

    /// Returns the maximum sensing distance.
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Returns normalized readings for the left, center and right rays.
    pub fn distances(&self, layout: &Layout, x: f32, y: f32, heading: f32) -> [f32; N_RAYS] {
        let mut readings = [0.; N_RAYS];
        for (i, offset) in [-FRAC_PI_3, 0., FRAC_PI_3].iter().enumerate() {
            let d = self.cast_ray(layout, x, y, heading + offset);
            readings[i] = (d.min(self.range) / self.range).min(1.);
        }
        readings
    }

    /// Casts a single ray and returns the distance to the first hit, or the
    /// full range when nothing is hit.
    pub fn cast_ray(&self, layout: &Layout, x: f32, y: f32, angle: f32) -> f32 {
        let (sin, cos) = angle.sin_cos();
        let mut dist = 1.;
        while dist < self.range {
            let px = x + dist * cos;
            let py = y + dist * sin;

            if px < 0. || px > layout.width || py < 0. || py > layout.height {
                return dist;
            }

            // A 2x2 probe around the sample point, robust to grazing hits
            let probe = Rect::new(px - 1., py - 1., 2., 2.);
            if layout.collides(&probe) {
                return dist;
            }

            dist += 1.;
        }
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::{RayCastSensor, SensorConfig};
    use crate::{Layout, LayoutConfig, Rect};
    use rand::{rngs::SmallRng, SeedableRng};

    fn empty_layout() -> Layout {
        let config = LayoutConfig::default().n_obstacles(0);
        Layout::generate(&config, &mut SmallRng::seed_from_u64(0))
    }

    #[test]
    fn full_range_in_open_space() {
        let layout = empty_layout();
        let sensor = RayCastSensor::new(&SensorConfig::default());

        // all walls are farther than the sensor range from the center
        let readings = sensor.distances(&layout, 400., 300., 0.3);
        assert_eq!(readings, [1., 1., 1.]);
    }

    #[test]
    fn readings_never_exceed_range() {
        let layout = empty_layout();
        let sensor = RayCastSensor::new(&SensorConfig::default());
        for i in 0..16 {
            let heading = i as f32 * 0.4;
            for r in sensor.distances(&layout, 700., 60., heading).iter() {
                assert!(*r >= 0. && *r <= 1.);
            }
        }
    }

    #[test]
    fn detects_an_obstacle_ahead() {
        let mut layout = empty_layout();
        layout.obstacles.push(Rect::new(500., 250., 40., 100.));
        let sensor = RayCastSensor::new(&SensorConfig::default());

        // center ray pointing east from (400, 300) hits the obstacle edge
        let d = sensor.cast_ray(&layout, 400., 300., 0.);
        assert!(d >= 98. && d <= 100., "distance was {}", d);

        let readings = sensor.distances(&layout, 400., 300., 0.);
        assert!(readings[1] < 1.);
    }
}
