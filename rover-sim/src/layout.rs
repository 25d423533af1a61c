use crate::Rect;
use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};

/// Configuration of the arena layout.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LayoutConfig {
    /// Arena width in world units.
    pub width: f32,

    /// Arena height in world units.
    pub height: f32,

    /// Thickness of the boundary walls.
    pub wall_thickness: f32,

    /// Number of random interior obstacles.
    pub n_obstacles: usize,

    /// Margin from the arena edges within which obstacle positions are drawn.
    pub obstacle_margin: f32,

    /// Minimum obstacle side length.
    pub obstacle_min_size: f32,

    /// Maximum obstacle side length.
    pub obstacle_max_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 800.,
            height: 600.,
            wall_thickness: 10.,
            n_obstacles: 8,
            obstacle_margin: 100.,
            obstacle_min_size: 40.,
            obstacle_max_size: 100.,
        }
    }
}

impl LayoutConfig {
    /// Sets the number of random interior obstacles.
    pub fn n_obstacles(mut self, n_obstacles: usize) -> Self {
        self.n_obstacles = n_obstacles;
        self
    }
}

/// The arena: boundary walls plus randomly placed interior obstacles.
///
/// A layout is generated once from a seeded RNG and stays fixed across
/// episode resets, so an agent trains against a persistent scene.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Arena width.
    pub width: f32,

    /// Arena height.
    pub height: f32,

    /// Walls and obstacles.
    pub obstacles: Vec<Rect>,
}

impl Layout {
    /// Generates a layout, drawing obstacle positions and sizes from `rng`.
    pub fn generate(config: &LayoutConfig, rng: &mut SmallRng) -> Self {
        let (w, h, t) = (config.width, config.height, config.wall_thickness);
        let mut obstacles = vec![
            Rect::new(0., 0., w, t),
            Rect::new(0., 0., t, h),
            Rect::new(0., h - t, w, t),
            Rect::new(w - t, 0., t, h),
        ];

        let m = config.obstacle_margin;
        for _ in 0..config.n_obstacles {
            let x = rng.gen_range(m..=(w - m));
            let y = rng.gen_range(m..=(h - m));
            let ow = rng.gen_range(config.obstacle_min_size..=config.obstacle_max_size);
            let oh = rng.gen_range(config.obstacle_min_size..=config.obstacle_max_size);
            obstacles.push(Rect::new(x, y, ow, oh));
        }

        Self {
            width: w,
            height: h,
            obstacles,
        }
    }

    /// Returns `true` when `rect` overlaps a wall or an obstacle.
    pub fn collides(&self, rect: &Rect) -> bool {
        self.obstacles.iter().any(|o| o.intersects(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::{Layout, LayoutConfig};
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn same_seed_same_layout() {
        let config = LayoutConfig::default();
        let a = Layout::generate(&config, &mut SmallRng::seed_from_u64(7));
        let b = Layout::generate(&config, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a.obstacles, b.obstacles);

        let c = Layout::generate(&config, &mut SmallRng::seed_from_u64(8));
        assert_ne!(a.obstacles, c.obstacles);
    }

    #[test]
    fn walls_and_obstacle_count() {
        let config = LayoutConfig::default().n_obstacles(8);
        let layout = Layout::generate(&config, &mut SmallRng::seed_from_u64(0));
        assert_eq!(layout.obstacles.len(), 4 + 8);

        // interior obstacles stay within the margins
        for o in layout.obstacles[4..].iter() {
            assert!(o.x >= 100. && o.x <= 700.);
            assert!(o.y >= 100. && o.y <= 500.);
            assert!(o.w >= 40. && o.w <= 100.);
            assert!(o.h >= 40. && o.h <= 100.);
        }
    }
}
