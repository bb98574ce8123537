use crate::viewer::frame_fit::{BoundingVolume, CameraView, FitResult, fit_camera};
use bevy::math::Vec3;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitPhase {
    AwaitingModel,
    PendingFit {
        bounds: BoundingVolume,
        target: Vec3,
    },
    Steady,
}

/// What a redraw needs from the engine. The shadow update always runs before
/// the frame is submitted.
pub trait RedrawHooks {
    fn camera_view(&self) -> CameraView;
    fn set_camera_position(&mut self, position: Vec3);
    fn update_shadows(&mut self);
    fn submit_frame(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RedrawReport {
    pub fit: Option<FitResult>,
}

#[derive(Debug)]
pub struct RenderLoopDriver {
    phase: FitPhase,
    redraws: u64,
}

impl Default for RenderLoopDriver {
    fn default() -> Self {
        Self {
            phase: FitPhase::AwaitingModel,
            redraws: 0,
        }
    }
}

impl RenderLoopDriver {
    pub fn phase(&self) -> FitPhase {
        self.phase
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Arms the one-shot auto-fit. Only honoured while no model has been
    /// accepted yet.
    pub fn model_ready(&mut self, bounds: BoundingVolume, target: Vec3) -> bool {
        match self.phase {
            FitPhase::AwaitingModel => {
                debug!(?bounds, %target, "auto-fit pending");
                self.phase = FitPhase::PendingFit { bounds, target };
                true
            }
            phase => {
                warn!(?phase, "ignoring model-ready signal, a model was already accepted");
                false
            }
        }
    }

    pub fn redraw<H: RedrawHooks>(&mut self, hooks: &mut H) -> RedrawReport {
        let mut report = RedrawReport::default();

        if let FitPhase::PendingFit { bounds, target } = self.phase {
            let fit = fit_camera(&hooks.camera_view(), target, &bounds);
            debug!(
                raw_depth = fit.raw_depth,
                max_depth = fit.max_depth,
                position = %fit.position,
                "camera framed to model"
            );
            hooks.set_camera_position(fit.position);
            self.phase = FitPhase::Steady;
            report.fit = Some(fit);
        }

        hooks.update_shadows();
        hooks.submit_frame();
        self.redraws += 1;

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::Transform;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        ReadCamera,
        MoveCamera(Vec3),
        UpdateShadows,
        Submit,
    }

    struct RecordingHooks {
        view: CameraView,
        calls: std::cell::RefCell<Vec<Call>>,
    }

    impl RecordingHooks {
        fn new(position: Vec3, target: Vec3) -> Self {
            let transform = Transform::from_translation(position).looking_at(target, Vec3::Y);
            Self {
                view: CameraView {
                    position,
                    rotation: transform.rotation,
                    fov_y: 30f32.to_radians(),
                    aspect: 16.0 / 9.0,
                },
                calls: Default::default(),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn fit_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, Call::MoveCamera(_)))
                .count()
        }
    }

    impl RedrawHooks for RecordingHooks {
        fn camera_view(&self) -> CameraView {
            self.calls.borrow_mut().push(Call::ReadCamera);
            self.view
        }

        fn set_camera_position(&mut self, position: Vec3) {
            self.calls.borrow_mut().push(Call::MoveCamera(position));
            self.view.position = position;
        }

        fn update_shadows(&mut self) {
            self.calls.borrow_mut().push(Call::UpdateShadows);
        }

        fn submit_frame(&mut self) {
            self.calls.borrow_mut().push(Call::Submit);
        }
    }

    fn sample_bounds() -> BoundingVolume {
        BoundingVolume::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0))
    }

    #[test]
    fn empty_room_redraws_without_fitting() {
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(7.0, 13.0, 7.0), Vec3::ZERO);

        let report = driver.redraw(&mut hooks);

        assert_eq!(report.fit, None);
        assert_eq!(driver.phase(), FitPhase::AwaitingModel);
        assert_eq!(hooks.calls(), vec![Call::UpdateShadows, Call::Submit]);
    }

    #[test]
    fn first_redraw_after_load_fits_then_settles() {
        let target = Vec3::new(0.0, 1.0, 0.0);
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(1.0, 2.0, 1.5), target);

        assert!(driver.model_ready(sample_bounds(), target));
        let report = driver.redraw(&mut hooks);

        let fit = report.fit.expect("pending fit should run");
        assert_eq!(driver.phase(), FitPhase::Steady);
        assert_eq!(
            hooks.calls(),
            vec![
                Call::ReadCamera,
                Call::MoveCamera(fit.position),
                Call::UpdateShadows,
                Call::Submit,
            ]
        );
    }

    #[test]
    fn fit_runs_exactly_once_across_many_redraws() {
        let target = Vec3::new(0.0, 1.0, 0.0);
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(1.0, 2.0, 1.5), target);
        driver.model_ready(sample_bounds(), target);

        driver.redraw(&mut hooks);
        driver.redraw(&mut hooks);
        let after_second = hooks.view.position;
        for _ in 0..8 {
            assert_eq!(driver.redraw(&mut hooks).fit, None);
        }

        assert_eq!(hooks.fit_count(), 1);
        assert_eq!(hooks.view.position, after_second);
        assert_eq!(driver.redraw_count(), 10);
    }

    #[test]
    fn shadows_update_before_every_submit() {
        let target = Vec3::new(0.0, 1.0, 0.0);
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(4.0, 3.0, 4.0), target);

        driver.redraw(&mut hooks);
        driver.model_ready(sample_bounds(), target);
        driver.redraw(&mut hooks);
        driver.redraw(&mut hooks);

        let calls = hooks.calls();
        let submits: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, call)| **call == Call::Submit)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(submits.len(), 3);
        for submit in submits {
            assert_eq!(calls[submit - 1], Call::UpdateShadows);
        }
    }

    #[test]
    fn second_model_ready_is_ignored() {
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(4.0, 3.0, 4.0), Vec3::ZERO);

        assert!(driver.model_ready(sample_bounds(), Vec3::ZERO));
        assert!(!driver.model_ready(sample_bounds(), Vec3::Y));
        driver.redraw(&mut hooks);
        assert!(!driver.model_ready(sample_bounds(), Vec3::Y));

        assert_eq!(driver.phase(), FitPhase::Steady);
        assert_eq!(hooks.fit_count(), 1);
    }

    #[test]
    fn redraws_without_a_model_never_move_the_camera() {
        let mut driver = RenderLoopDriver::default();
        let mut hooks = RecordingHooks::new(Vec3::new(7.0, 13.0, 7.0), Vec3::ZERO);

        for _ in 0..3 {
            driver.redraw(&mut hooks);
        }

        assert_eq!(driver.phase(), FitPhase::AwaitingModel);
        assert_eq!(hooks.fit_count(), 0);
        assert_eq!(hooks.view.position, Vec3::new(7.0, 13.0, 7.0));
    }
}
