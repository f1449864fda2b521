//! Time-based easing for input smoothing.
//!
//! The pointer position is not applied to the light directly. Every cursor
//! move retargets a fixed-duration tween and the render loop samples the
//! eased value once per frame, which gives the light a soft trailing motion.

use cgmath::Vector2;

/// Linearly remap `value` from `[in_start, in_end]` to `[out_start, out_end]`.
///
/// The input is not clamped, values outside the source range extrapolate.
pub fn map_range(value: f32, in_start: f32, in_end: f32, out_start: f32, out_end: f32) -> f32 {
    if in_end == in_start {
        return out_start;
    }
    out_start + (value - in_start) / (in_end - in_start) * (out_end - out_start)
}

/// Quadratic ease-out: fast start, decelerating arrival.
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// A 2D value easing towards a target over a fixed duration.
///
/// `retarget` restarts the tween from the current eased value, so rapid
/// pointer movement never causes jumps.
#[derive(Clone, Debug)]
pub struct Tween2 {
    from: Vector2<f32>,
    to: Vector2<f32>,
    elapsed: f32,
    duration: f32,
}

impl Tween2 {
    pub fn new(value: Vector2<f32>, duration: f32) -> Self {
        Self {
            from: value,
            to: value,
            elapsed: duration,
            duration: duration.max(f32::EPSILON),
        }
    }

    /// Ease towards a new target, starting from wherever the tween is now.
    pub fn retarget(&mut self, target: Vector2<f32>) {
        self.from = self.value();
        self.to = target;
        self.elapsed = 0.0;
    }

    /// Advance by `dt` seconds and return the eased value.
    pub fn advance(&mut self, dt: f32) -> Vector2<f32> {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    /// The current eased value without advancing time.
    pub fn value(&self) -> Vector2<f32> {
        let k = ease_out_quad(self.elapsed / self.duration);
        self.from + (self.to - self.from) * k
    }

    pub fn target(&self) -> Vector2<f32> {
        self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec2;

    #[test]
    fn map_range_hits_endpoints() {
        assert_eq!(map_range(0.0, 0.0, 100.0, -8.0, 8.0), -8.0);
        assert_eq!(map_range(100.0, 0.0, 100.0, -8.0, 8.0), 8.0);
        assert_eq!(map_range(50.0, 0.0, 100.0, -8.0, 8.0), 0.0);
    }

    #[test]
    fn map_range_degenerate_input_range() {
        assert_eq!(map_range(5.0, 3.0, 3.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn ease_out_quad_boundaries() {
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        // Ease-out is ahead of linear mid-way.
        assert!(ease_out_quad(0.5) > 0.5);
    }

    #[test]
    fn tween_arrives_at_target() {
        let mut tween = Tween2::new(vec2(0.0, 0.0), 1.0);
        tween.retarget(vec2(10.0, -4.0));
        tween.advance(1.0);
        assert_eq!(tween.value(), vec2(10.0, -4.0));
        // Advancing past the duration stays put.
        tween.advance(5.0);
        assert_eq!(tween.value(), vec2(10.0, -4.0));
    }

    #[test]
    fn tween_approach_is_monotone() {
        let mut tween = Tween2::new(vec2(0.0, 0.0), 1.0);
        tween.retarget(vec2(1.0, 0.0));
        let mut last = 0.0;
        for _ in 0..10 {
            let x = tween.advance(0.1).x;
            assert!(x >= last);
            last = x;
        }
        assert!((last - 1.0).abs() < 1e-6);
    }

    #[test]
    fn retarget_resumes_from_current_value() {
        let mut tween = Tween2::new(vec2(0.0, 0.0), 1.0);
        tween.retarget(vec2(1.0, 1.0));
        let mid = tween.advance(0.3);
        tween.retarget(vec2(-1.0, -1.0));
        // A retarget must not snap the value anywhere.
        assert_eq!(tween.value(), mid);
        assert_eq!(tween.target(), vec2(-1.0, -1.0));
    }
}
