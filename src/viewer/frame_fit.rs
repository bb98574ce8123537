//! Camera auto-framing.
//!
//! Pushes a camera back along its current camera-to-target axis until every
//! corner of an axis-aligned box lies inside both the vertical and the
//! horizontal half-angles of the view frustum.

use bevy::math::{Quat, Vec3};

/// Axis-aligned box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingVolume {
    /// Builds a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True when the box has no volume (a point, a segment or a flat slab).
    pub fn is_degenerate(&self) -> bool {
        self.size().cmple(Vec3::ZERO).any()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

/// The slice of camera state the fitter reads.
///
/// The camera looks down its local -Z axis, so a point in front of it has a
/// negative local `z` and a view depth of `-z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
}

impl CameraView {
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    pub fn horizontal_fov(&self) -> f32 {
        2.0 * ((0.5 * self.fov_y).tan() * self.aspect).atan()
    }

    fn has_valid_projection(&self) -> bool {
        self.fov_y > 0.0
            && self.fov_y < std::f32::consts::PI
            && self.aspect > 0.0
            && self.aspect.is_finite()
            && self.position.is_finite()
            && self.rotation.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Largest per-corner clearance before clamping. Negative when the box
    /// already fits with room to spare.
    pub raw_depth: f32,
    /// Distance the camera moves back; never negative.
    pub max_depth: f32,
    pub displacement: Vec3,
    pub position: Vec3,
}

impl FitResult {
    fn unchanged(position: Vec3) -> Self {
        Self {
            raw_depth: 0.0,
            max_depth: 0.0,
            displacement: Vec3::ZERO,
            position,
        }
    }
}

/// Largest distance the camera has to move back along its view axis so that
/// every corner of `bounds` satisfies both frustum half-angles.
///
/// Each corner is judged by its own lateral offset only, which is slightly
/// conservative for boxes far off the view axis.
pub fn required_depth(view: &CameraView, bounds: &BoundingVolume) -> f32 {
    let tan_half_v = (0.5 * view.fov_y).tan();
    let tan_half_h = (0.5 * view.horizontal_fov()).tan();

    let (max_v, max_h) = bounds
        .corners()
        .into_iter()
        .map(|corner| view.world_to_local(corner))
        .fold(
            (f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(max_v, max_h), local| {
                (
                    max_v.max(local.z + local.y.abs() / tan_half_v),
                    max_h.max(local.z + local.x.abs() / tan_half_h),
                )
            },
        );

    max_v.max(max_h)
}

/// Computes the camera position that frames `bounds`, moving only along the
/// existing target-to-camera direction. View direction and target are left
/// alone.
pub fn fit_camera(view: &CameraView, target: Vec3, bounds: &BoundingVolume) -> FitResult {
    if !view.has_valid_projection() || !bounds.min.is_finite() || !bounds.max.is_finite() {
        return FitResult::unchanged(view.position);
    }

    // Camera sitting on its target has no axis to back away along.
    let Some(axis) = (view.position - target).try_normalize() else {
        return FitResult::unchanged(view.position);
    };

    let raw_depth = required_depth(view, bounds);
    if !raw_depth.is_finite() {
        return FitResult::unchanged(view.position);
    }

    let max_depth = raw_depth.max(0.0);
    let displacement = axis * max_depth;

    FitResult {
        raw_depth,
        max_depth,
        displacement,
        position: view.position + displacement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::prelude::Transform;
    use proptest::prelude::*;
    use rstest::rstest;

    fn aimed_view(position: Vec3, target: Vec3, fov_deg: f32, aspect: f32) -> CameraView {
        let transform = Transform::from_translation(position).looking_at(target, Vec3::Y);
        CameraView {
            position,
            rotation: transform.rotation,
            fov_y: fov_deg.to_radians(),
            aspect,
        }
    }

    fn assert_inside_frustum(view: &CameraView, bounds: &BoundingVolume, tolerance: f32) {
        let tan_half_v = (0.5 * view.fov_y).tan();
        let tan_half_h = (0.5 * view.horizontal_fov()).tan();
        for corner in bounds.corners() {
            let local = view.world_to_local(corner);
            let depth = -local.z;
            assert!(
                local.y.abs() <= tan_half_v * depth + tolerance,
                "corner {corner} outside vertical frustum (local {local})"
            );
            assert!(
                local.x.abs() <= tan_half_h * depth + tolerance,
                "corner {corner} outside horizontal frustum (local {local})"
            );
        }
    }

    #[test]
    fn corners_cover_every_min_max_combination() {
        let bounds = BoundingVolume::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let corners = bounds.corners();

        assert_eq!(corners[0], bounds.min);
        assert_eq!(corners[7], bounds.max);
        for (i, a) in corners.iter().enumerate() {
            for b in &corners[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn new_orders_corners_componentwise() {
        let bounds = BoundingVolume::new(Vec3::new(3.0, -1.0, 2.0), Vec3::new(-3.0, 1.0, 0.0));
        assert_eq!(bounds.min, Vec3::new(-3.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 2.0));
        assert_eq!(bounds.center(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn from_points_and_union_accumulate() {
        let a = BoundingVolume::from_points([Vec3::ZERO, Vec3::new(1.0, -2.0, 0.5)]).unwrap();
        let b = BoundingVolume::new(Vec3::splat(-1.0), Vec3::splat(0.25));

        let merged = a.union(&b);
        assert_eq!(merged.min, Vec3::new(-1.0, -2.0, -1.0));
        assert_eq!(merged.max, Vec3::new(1.0, 0.25, 0.5));
        assert!(BoundingVolume::from_points(std::iter::empty()).is_none());
    }

    #[rstest]
    #[case(Vec3::ZERO, Vec3::ZERO, true)]
    #[case(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), true)]
    #[case(Vec3::ZERO, Vec3::ONE, false)]
    fn degenerate_detection(#[case] min: Vec3, #[case] max: Vec3, #[case] expected: bool) {
        assert_eq!(BoundingVolume::new(min, max).is_degenerate(), expected);
    }

    #[test]
    fn horizontal_fov_matches_aspect() {
        let view = aimed_view(Vec3::Z, Vec3::ZERO, 30.0, 16.0 / 9.0);
        let expected = (0.5 * view.fov_y).tan() * view.aspect;
        assert_relative_eq!(
            (0.5 * view.horizontal_fov()).tan(),
            expected,
            epsilon = 1e-6
        );
    }

    #[test]
    fn world_to_local_puts_target_on_negative_z() {
        let view = aimed_view(Vec3::new(7.0, 13.0, 7.0), Vec3::ZERO, 30.0, 1.0);
        let local = view.world_to_local(Vec3::ZERO);
        let distance = Vec3::new(7.0, 13.0, 7.0).length();

        assert_relative_eq!(local.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(local.z, -distance, epsilon = 1e-4);
    }

    #[test]
    fn example_box_already_fits_from_start_position() {
        let start = Vec3::new(7.0, 13.0, 7.0);
        let view = aimed_view(start, Vec3::ZERO, 30.0, 16.0 / 9.0);
        let bounds = BoundingVolume::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));

        let fit = fit_camera(&view, Vec3::ZERO, &bounds);

        assert!(fit.raw_depth.is_finite());
        assert!(fit.raw_depth < 0.0);
        assert_eq!(fit.max_depth, 0.0);
        assert_eq!(fit.position, start);
        assert_inside_frustum(&view, &bounds, 1e-4);
    }

    #[test]
    fn example_box_pushes_close_camera_back_along_axis() {
        let direction = Vec3::new(7.0, 13.0, 7.0).normalize();
        let start = direction * 2.5;
        let view = aimed_view(start, Vec3::ZERO, 30.0, 16.0 / 9.0);
        let bounds = BoundingVolume::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));

        let fit = fit_camera(&view, Vec3::ZERO, &bounds);

        assert!(fit.max_depth.is_finite());
        assert!(fit.max_depth > 0.0);
        assert!(fit.position.length() > start.length());
        assert_relative_eq!(fit.position.normalize().dot(direction), 1.0, epsilon = 1e-5);

        let fitted = CameraView {
            position: fit.position,
            ..view
        };
        assert_inside_frustum(&fitted, &bounds, 1e-4);
    }

    #[test]
    fn refit_is_a_no_op() {
        let start = Vec3::new(1.0, 2.0, 1.5);
        let target = Vec3::new(0.0, 1.0, 0.0);
        let view = aimed_view(start, target, 30.0, 16.0 / 9.0);
        let bounds = BoundingVolume::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));

        let first = fit_camera(&view, target, &bounds);
        let second = fit_camera(
            &CameraView {
                position: first.position,
                ..view
            },
            target,
            &bounds,
        );

        assert!(first.max_depth > 0.0);
        assert_relative_eq!(second.max_depth, 0.0, epsilon = 1e-3);
        assert_relative_eq!(second.raw_depth, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn point_box_gives_finite_non_negative_depth() {
        let view = aimed_view(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO, 45.0, 1.5);
        let point = BoundingVolume::new(Vec3::ZERO, Vec3::ZERO);

        let fit = fit_camera(&view, Vec3::ZERO, &point);

        assert!(fit.max_depth.is_finite());
        assert!(fit.max_depth >= 0.0);
        assert!(fit.position.is_finite());
    }

    #[test]
    fn camera_on_target_is_left_in_place() {
        let view = CameraView {
            position: Vec3::ONE,
            rotation: Quat::IDENTITY,
            fov_y: 30f32.to_radians(),
            aspect: 1.0,
        };
        let bounds = BoundingVolume::new(Vec3::splat(-5.0), Vec3::splat(5.0));

        let fit = fit_camera(&view, Vec3::ONE, &bounds);

        assert_eq!(fit.displacement, Vec3::ZERO);
        assert_eq!(fit.position, Vec3::ONE);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(180.0, 1.0)]
    #[case(30.0, 0.0)]
    #[case(30.0, f32::NAN)]
    fn invalid_projection_is_left_in_place(#[case] fov_deg: f32, #[case] aspect: f32) {
        let view = CameraView {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            fov_y: fov_deg.to_radians(),
            aspect,
        };
        let bounds = BoundingVolume::new(Vec3::splat(-5.0), Vec3::splat(5.0));

        let fit = fit_camera(&view, Vec3::ZERO, &bounds);

        assert_eq!(fit.position, view.position);
        assert_eq!(fit.max_depth, 0.0);
    }

    prop_compose! {
        fn arb_scene()(
            center in prop::array::uniform3(-10.0f32..10.0),
            half in prop::array::uniform3(0.0f32..5.0),
            target_offset in prop::array::uniform3(-1.0f32..1.0),
            yaw in -3.1f32..3.1,
            pitch in -1.3f32..1.3,
            distance in 0.5f32..40.0,
            fov_deg in 20.0f32..120.0,
            aspect in 0.4f32..3.0,
        ) -> (CameraView, Vec3, BoundingVolume) {
            let center = Vec3::from_array(center);
            let half = Vec3::from_array(half);
            let target = center + Vec3::from_array(target_offset);
            let direction = Vec3::new(
                yaw.cos() * pitch.cos(),
                pitch.sin(),
                yaw.sin() * pitch.cos(),
            );
            let view = aimed_view(target + direction * distance, target, fov_deg, aspect);
            (view, target, BoundingVolume::new(center - half, center + half))
        }
    }

    proptest! {
        #[test]
        fn fitted_camera_contains_every_corner((view, target, bounds) in arb_scene()) {
            let fit = fit_camera(&view, target, &bounds);
            prop_assert!(fit.max_depth.is_finite());
            prop_assert!(fit.max_depth >= 0.0);

            let fitted = CameraView { position: fit.position, ..view };
            let tolerance = 2e-3 * (1.0 + fit.position.distance(target));
            let tan_half_v = (0.5 * fitted.fov_y).tan();
            let tan_half_h = (0.5 * fitted.horizontal_fov()).tan();
            for corner in bounds.corners() {
                let local = fitted.world_to_local(corner);
                let depth = -local.z;
                prop_assert!(local.y.abs() <= tan_half_v * depth + tolerance);
                prop_assert!(local.x.abs() <= tan_half_h * depth + tolerance);
            }
        }

        #[test]
        fn second_fit_does_not_drift((view, target, bounds) in arb_scene()) {
            let first = fit_camera(&view, target, &bounds);
            let second = fit_camera(&CameraView { position: first.position, ..view }, target, &bounds);
            let tolerance = 2e-3 * (1.0 + first.position.distance(target));
            prop_assert!(second.max_depth <= tolerance);
        }
    }
}
