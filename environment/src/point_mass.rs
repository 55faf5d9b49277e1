use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::{BoxSpace, Environment, Frame, Step};

const BACKGROUND: [u8; 3] = [30, 30, 30];
const PLATFORM: [u8; 3] = [200, 200, 200];
const BALL: [u8; 3] = [220, 40, 40];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointMassOptions {
    pub platform_half_width: f64,
    pub dt: f64,
    pub friction: f64,
    pub max_speed: f64,
    pub frame_size: u32,
}

impl Default for PointMassOptions {
    fn default() -> Self {
        Self {
            platform_half_width: 5.0,
            dt: 0.1,
            friction: 0.05,
            max_speed: 2.0,
            frame_size: 64,
        }
    }
}

/// A ball rolling on a square platform. The episode ends when the ball falls off an edge.
///
/// Observations are `[X, -X, Y, -Y, X_speed, Y_speed]` where the signed position is split into
/// its positive and negative parts. The reward is the distance covered during the step.
pub struct PointMass {
    options: PointMassOptions,
    position: [f64; 2],
    velocity: [f64; 2],
    observation_space: BoxSpace,
    action_space: BoxSpace,
    terminated: bool,
}

impl PointMass {
    pub fn new(options: PointMassOptions) -> Result<Self> {
        if options.platform_half_width <= 0.0 || options.dt <= 0.0 || options.max_speed <= 0.0 {
            bail!("PointMass dimensions, dt and max_speed must be positive");
        }

        if !(0.0..1.0).contains(&options.friction) {
            bail!("PointMass friction must be in [0, 1)");
        }

        if options.frame_size == 0 {
            bail!("PointMass frame_size must be positive");
        }

        let bound = Self::position_bound(&options);
        let speed = options.max_speed;
        let observation_space = BoxSpace::new(
            vec![0.0, 0.0, 0.0, 0.0, -speed, -speed],
            vec![bound, bound, bound, bound, speed, speed],
        )?;
        let action_space = BoxSpace::uniform(2, -1.0, 1.0)?;

        Ok(Self {
            options,
            position: [0.0; 2],
            velocity: [0.0; 2],
            observation_space,
            action_space,
            terminated: false,
        })
    }

    // Furthest the ball can be from the centre before the episode is reported done.
    fn position_bound(options: &PointMassOptions) -> f64 {
        options.platform_half_width + options.max_speed * options.dt
    }

    fn observation(&self) -> Vec<f64> {
        let [x, y] = self.position;
        let [vx, vy] = self.velocity;

        vec![x.max(0.0), (-x).max(0.0), y.max(0.0), (-y).max(0.0), vx, vy]
    }

    fn ensure_live(&self) -> Result<()> {
        if self.terminated {
            bail!("PointMass has already been terminated");
        }

        Ok(())
    }

    fn to_pixel(&self, coord: f64) -> i64 {
        let bound = Self::position_bound(&self.options);
        let size = self.options.frame_size as f64;

        ((coord + bound) / (2.0 * bound) * size).floor() as i64
    }
}

impl Environment for PointMass {
    fn observation_space(&self) -> &BoxSpace {
        &self.observation_space
    }

    fn action_space(&self) -> &BoxSpace {
        &self.action_space
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.ensure_live()?;

        self.position = [0.0; 2];
        self.velocity = [0.0; 2];

        Ok(self.observation())
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        self.ensure_live()?;

        if action.len() != self.action_space.flat_dim() {
            bail!(
                "Expected an action of dimension {} but received {}",
                self.action_space.flat_dim(),
                action.len()
            );
        }

        let action = self.action_space.clip(action);
        let PointMassOptions {
            dt,
            friction,
            max_speed,
            platform_half_width,
            ..
        } = self.options;

        for (v, a) in self.velocity.iter_mut().zip(&action) {
            *v = *v * (1.0 - friction) + a * dt;
        }

        let speed = self.velocity[0].hypot(self.velocity[1]);
        if speed > max_speed {
            let scale = max_speed / speed;
            self.velocity.iter_mut().for_each(|v| *v *= scale);
        }

        let previous = self.position;
        for (p, v) in self.position.iter_mut().zip(&self.velocity) {
            *p += v * dt;
        }

        let reward = (self.position[0] - previous[0]).hypot(self.position[1] - previous[1]);
        let done = self.position.iter().any(|p| p.abs() > platform_half_width);

        let mut info = HashMap::new();
        info.insert("x".to_string(), self.position[0]);
        info.insert("y".to_string(), self.position[1]);

        Ok(Step {
            observation: self.observation(),
            reward,
            done,
            info,
        })
    }

    fn render(&mut self) -> Result<Frame> {
        self.ensure_live()?;

        let size = self.options.frame_size;
        let half = self.options.platform_half_width;
        let mut frame = Frame::filled(size, size, BACKGROUND);

        let platform_start = self.to_pixel(-half);
        let platform_end = self.to_pixel(half);
        frame.fill_rect(
            platform_start,
            platform_start,
            platform_end - platform_start,
            platform_end - platform_start,
            PLATFORM,
        );

        // Image rows grow downwards.
        let ball_x = self.to_pixel(self.position[0]);
        let ball_y = size as i64 - 1 - self.to_pixel(self.position[1]);
        frame.fill_rect(ball_x - 1, ball_y - 1, 3, 3, BALL);

        Ok(frame)
    }

    fn terminate(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.terminated = true;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn env() -> PointMass {
        PointMass::new(PointMassOptions::default()).unwrap()
    }

    #[test]
    fn test_reset_is_at_origin() {
        let mut env = env();
        let obs = env.reset().unwrap();

        assert_eq!(obs, vec![0.0; 6]);
        assert_eq!(env.observation_space().flat_dim(), 6);
    }

    #[test]
    fn test_step_moves_and_rewards_distance() {
        let mut env = env();
        env.reset().unwrap();

        let step = env.step(&[1.0, 0.0]).unwrap();

        // v = 0.1, dx = 0.01
        assert_approx_eq!(step.observation[0], 0.01);
        assert_approx_eq!(step.observation[4], 0.1);
        assert_approx_eq!(step.reward, 0.01);
        assert!(!step.done);
        assert!(env.observation_space().contains(&step.observation));
    }

    #[test]
    fn test_actions_are_clipped() {
        let mut env = env();
        env.reset().unwrap();

        let clipped = env.step(&[100.0, -100.0]).unwrap();

        assert_approx_eq!(clipped.observation[4], 0.1);
        assert_approx_eq!(clipped.observation[5], -0.1);
        assert_approx_eq!(clipped.observation[3], 0.01);
    }

    #[test]
    fn test_falling_off_the_platform_ends_the_episode() {
        let mut env = env();
        env.reset().unwrap();

        let mut steps = 0;
        loop {
            let step = env.step(&[1.0, 0.0]).unwrap();
            steps += 1;
            assert!(env.observation_space().contains(&step.observation));

            if step.done {
                assert!(step.info["x"] > 5.0);
                break;
            }

            assert!(steps < 10_000, "episode never terminated");
        }
    }

    #[test]
    fn test_wrong_action_dimension_is_an_error() {
        let mut env = env();
        env.reset().unwrap();

        assert!(env.step(&[1.0]).is_err());
    }

    #[test]
    fn test_render_draws_the_ball() {
        let mut env = env();
        env.reset().unwrap();

        let frame = env.render().unwrap();

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 64);
        assert!(frame.pixels().chunks(3).any(|px| px == BALL));
    }

    #[test]
    fn test_terminated_environment_rejects_calls() {
        let mut env = env();
        env.terminate().unwrap();

        assert!(env.reset().is_err());
        assert!(env.terminate().is_err());
    }
}
