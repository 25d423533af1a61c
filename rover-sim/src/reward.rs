use crate::StepOutcome;
use serde::{Deserialize, Serialize};

/// Coefficients of the shaped reward.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RewardConfig {
    /// Reward per unit of distance moved.
    pub k_distance: f32,

    /// Normalized reading below which the proximity penalty applies.
    pub proximity_threshold: f32,

    /// Scale of the proximity penalty.
    pub k_proximity: f32,

    /// Penalty for a collision.
    pub k_collision: f32,

    /// Number of consecutive low-motion steps tolerated before the
    /// stall penalty applies.
    pub low_motion_patience: usize,

    /// Stall penalty.
    pub k_low_motion: f32,

    /// Speed level from which the speed bonus applies.
    pub speed_bonus_level: u8,

    /// Speed bonus.
    pub k_speed_bonus: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            k_distance: 0.1,
            proximity_threshold: 0.2,
            k_proximity: 5.,
            k_collision: 10.,
            low_motion_patience: 10,
            k_low_motion: 1.,
            speed_bonus_level: 3,
            k_speed_bonus: 0.1,
        }
    }
}

/// The five-term shaped reward of a step.
///
/// The terms are independent and summed: movement reward, proximity
/// penalty, collision penalty, stall penalty, speed bonus.
#[derive(Debug, Clone)]
pub struct RewardModel {
    config: RewardConfig,
}

impl RewardModel {
    /// Constructs a reward model.
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Computes the reward of a step.
    ///
    /// `min_reading` is the smallest normalized sensor reading after the
    /// move, `low_motion_steps` the consecutive low-motion counter after
    /// the move, and `speed_level` the current speed level.
    pub fn compute(
        &self,
        outcome: &StepOutcome,
        min_reading: f32,
        low_motion_steps: usize,
        speed_level: u8,
    ) -> f32 {
        let c = &self.config;
        let mut reward = 0.;

        reward += outcome.distance_moved * c.k_distance;

        if min_reading < c.proximity_threshold {
            reward -= (c.proximity_threshold - min_reading) * c.k_proximity;
        }

        if outcome.collision {
            reward -= c.k_collision;
        }

        if low_motion_steps > c.low_motion_patience {
            reward -= c.k_low_motion;
        }

        if speed_level >= c.speed_bonus_level {
            reward += c.k_speed_bonus;
        }

        reward
    }
}

#[cfg(test)]
mod tests {
    use super::{RewardConfig, RewardModel};
    use crate::StepOutcome;

    fn outcome(distance_moved: f32, collision: bool) -> StepOutcome {
        StepOutcome {
            distance_moved,
            collision,
            terminated: collision,
            truncated: false,
        }
    }

    #[test]
    fn clean_move_at_speed() {
        let model = RewardModel::new(RewardConfig::default());
        // 6 units moved, clear surroundings, speed level 3
        let r = model.compute(&outcome(6., false), 1., 0, 3);
        assert!((r - (0.6 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn proximity_penalty_scales_with_closeness() {
        let model = RewardModel::new(RewardConfig::default());
        let r = model.compute(&outcome(0., false), 0.1, 0, 1);
        assert!((r - (-0.5)).abs() < 1e-6);

        // at the threshold the penalty does not apply
        let r = model.compute(&outcome(0., false), 0.2, 0, 1);
        assert_eq!(r, 0.);
    }

    #[test]
    fn collision_and_stall_penalties() {
        let model = RewardModel::new(RewardConfig::default());
        let r = model.compute(&outcome(0., true), 1., 0, 1);
        assert!((r - (-10.)).abs() < 1e-6);

        let r = model.compute(&outcome(0., false), 1., 11, 1);
        assert!((r - (-1.)).abs() < 1e-6);

        // patience not yet exceeded
        let r = model.compute(&outcome(0., false), 1., 10, 1);
        assert_eq!(r, 0.);
    }

    #[test]
    fn terms_sum_independently() {
        let model = RewardModel::new(RewardConfig::default());
        // collision + close wall + stalled + fast, all at once
        let r = model.compute(&outcome(0., true), 0.1, 11, 5);
        let expected = -0.5 - 10. - 1. + 0.1;
        assert!((r - expected).abs() < 1e-6);
    }
}
