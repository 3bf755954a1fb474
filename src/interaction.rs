//! Pointer driven tilt.
//!
//! The pointer position picks a target tilt; a short ease-out tween carries
//! the model from wherever it currently is towards that target. Horizontal
//! pointer motion turns the model about its vertical axis and vertical motion
//! about its horizontal axis.

use cgmath::Rad;
use instant::Duration;
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::{
    config::ViewerConfig,
    data_structures::{scene::ModelNode, tilt::Tilt},
};

/// Pointer position normalized to the viewport, `(0, 0)` top left and
/// `(1, 1)` bottom right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    /// Coordinates outside the viewport are clamped onto its edge.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: normalize(x),
            y: normalize(y),
        }
    }

    /// `None` while the window has no area.
    pub fn from_physical(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> Option<Self> {
        if size.width == 0 || size.height == 0 {
            return None;
        }
        Some(Self::new(
            (position.x / size.width as f64) as f32,
            (position.y / size.height as f64) as f32,
        ))
    }
}

fn normalize(value: f32) -> f32 {
    if value.is_nan() { 0.5 } else { value.clamp(0.0, 1.0) }
}

/// The tilt a pointer position asks for. The centre of the viewport is no
/// tilt, the edges are `max_tilt` in either direction.
pub fn target_for(pointer: Pointer, max_tilt: Rad<f32>) -> Tilt {
    Tilt::new(
        max_tilt * ((pointer.y - 0.5) * 2.0),
        max_tilt * ((pointer.x - 0.5) * 2.0),
    )
}

/// Decelerating curve, `0` at `t = 0` and `1` at `t = 1`.
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    from: Tilt,
    to: Tilt,
    elapsed: Duration,
    duration: Duration,
}

impl Tween {
    pub fn new(from: Tilt, to: Tilt, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Moves the tween forward by `dt` and returns the new value.
    pub fn advance(&mut self, dt: Duration) -> Tilt {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> Tilt {
        if self.duration.is_zero() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(self.to, ease_out(t))
    }

    pub fn target(&self) -> Tilt {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Turns pointer input into tilt changes on the model node.
#[derive(Debug)]
pub struct InteractionController {
    max_tilt: Rad<f32>,
    duration: Duration,
    tween: Option<Tween>,
}

impl InteractionController {
    pub fn new(max_tilt: Rad<f32>, duration: Duration) -> Self {
        Self {
            max_tilt,
            duration,
            tween: None,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.max_tilt, config.tween_duration)
    }

    pub fn target_for(&self, pointer: Pointer) -> Tilt {
        target_for(pointer, self.max_tilt)
    }

    /// Starts a tween from the node's current tilt to the tilt `pointer` asks
    /// for, replacing any tween in flight. Does nothing without a node.
    pub fn on_pointer_move<M>(&mut self, pointer: Pointer, node: Option<&ModelNode<M>>) {
        let Some(node) = node else {
            return;
        };
        let target = self.target_for(pointer);
        self.tween = Some(Tween::new(node.tilt, target, self.duration));
    }

    /// Advances the active tween and writes its value to the node.
    pub fn update<M>(&mut self, dt: Duration, node: Option<&mut ModelNode<M>>) {
        let (Some(node), Some(tween)) = (node, self.tween.as_mut()) else {
            return;
        };
        node.tilt = tween.advance(dt);
        if tween.is_finished() {
            self.tween = None;
        }
    }

    pub fn active_tween(&self) -> Option<&Tween> {
        self.tween.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_out_starts_at_zero_and_ends_at_one() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert_eq!(ease_out(0.5), 0.75);
    }

    #[test]
    fn ease_out_is_monotonic() {
        let samples: Vec<f32> = (0..=100).map(|i| ease_out(i as f32 / 100.0)).collect();
        assert!(samples.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn ease_out_clamps_its_input() {
        assert_eq!(ease_out(-1.0), 0.0);
        assert_eq!(ease_out(2.0), 1.0);
    }

    #[test]
    fn pointer_is_clamped_to_the_viewport() {
        let pointer = Pointer::new(-0.3, 1.7);
        assert_eq!(pointer, Pointer { x: 0.0, y: 1.0 });
    }

    #[test]
    fn pointer_ignores_empty_windows() {
        let pointer = Pointer::from_physical(PhysicalPosition::new(10.0, 10.0), PhysicalSize::new(0, 600));
        assert!(pointer.is_none());
    }

    #[test]
    fn pointer_is_normalized_by_window_size() {
        let pointer = Pointer::from_physical(PhysicalPosition::new(200.0, 150.0), PhysicalSize::new(800, 600));
        assert_eq!(pointer, Some(Pointer { x: 0.25, y: 0.25 }));
    }

    #[test]
    fn zero_length_tween_jumps_to_target() {
        let to = Tilt::new(Rad(0.2), Rad(-0.1));
        let tween = Tween::new(Tilt::ZERO, to, Duration::ZERO);
        assert_eq!(tween.value(), to);
        assert!(tween.is_finished());
    }
}
