//! The single owner of the camera.
//!
//! State machine: `Idle` when no transition is held, `Animating` while one is.
//! A new `animate_to*`, `set_immediate` or `cancel` call drops the held
//! transition synchronously, together with its completion callback, before
//! anything else happens. The dropped transition can therefore never publish
//! again or complete.
//!
//! Ordering contract:
//! - Snapshot times never decrease.
//! - Every transition publishes a `Start` snapshot equal to the camera at
//!   the moment it was requested (unless it completes on that same tick) and
//!   an `End` snapshot equal to its constrained target.
//! - Completion callbacks run after the `End` snapshot has reached every
//!   subscriber and after the animator is back to `Idle`.

use foundation::camera::{CameraConstraints, CameraState, LngLat};
use foundation::time::Time;
use runtime::{CancelToken, EventBus, Frame, SubscriptionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{DurationClass, MotionConfig};
use crate::easing::{Easing, lerp};
use crate::throttle::PublishThrottle;

/// Called once when a transition reaches its target.
pub type Completion = Box<dyn FnOnce(&CameraState)>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPhase {
    Start,
    Progress,
    End,
    /// Published by `set_immediate`, outside any transition.
    Immediate,
}

/// Read-only camera state handed to subscribers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub camera: CameraState,
    pub time: Time,
    pub transition: Option<TransitionId>,
    pub phase: SnapshotPhase,
}

/// The in-flight transition.
pub struct AnimationHandle {
    id: TransitionId,
    from: CameraState,
    to: CameraState,
    duration_s: f64,
    easing: Easing,
    /// Anchored on the first tick after the request.
    started_at: Option<Time>,
    cancel: CancelToken,
    throttle: PublishThrottle,
    on_complete: Option<Completion>,
}

impl std::fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_s", &self.duration_s)
            .field("started_at", &self.started_at)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_completion", &self.on_complete.is_some())
            .finish()
    }
}

impl AnimationHandle {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn target(&self) -> &CameraState {
        &self.to
    }

    /// Clone of the transition's cancellation flag. Cancelling it stops the
    /// transition at the next tick without completing it.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn sample(&self, progress: f64) -> CameraState {
        let e = self.easing.apply(progress);
        CameraState::new(
            LngLat::new(
                lerp(self.from.center.lng, self.to.center.lng, e),
                lerp(self.from.center.lat, self.to.center.lat, e),
            ),
            lerp(self.from.zoom, self.to.zoom, e),
        )
    }
}

#[derive(Debug)]
pub struct ViewportAnimator {
    camera: CameraState,
    default_view: CameraState,
    constraints: CameraConstraints,
    motion: MotionConfig,
    active: Option<AnimationHandle>,
    next_transition: u64,
    /// Latest time seen by `tick`; stamps `set_immediate` snapshots.
    now: Time,
    last_published: Option<CameraSnapshot>,
    bus: EventBus<CameraSnapshot>,
}

impl ViewportAnimator {
    /// Starts idle at the constrained `default_view`. Nothing is published
    /// until the first transition or `set_immediate`.
    pub fn new(default_view: CameraState, constraints: CameraConstraints, motion: MotionConfig) -> Self {
        let default_view = constraints.apply(default_view);
        Self {
            camera: default_view,
            default_view,
            constraints,
            motion,
            active: None,
            next_transition: 0,
            now: Time::ZERO,
            last_published: None,
            bus: EventBus::new(),
        }
    }

    /// The camera as of the last tick, published or not.
    pub fn camera(&self) -> CameraState {
        self.camera
    }

    /// Latest frame time seen, after monotonic clamping.
    pub fn now(&self) -> Time {
        self.now
    }

    pub fn last_published(&self) -> Option<&CameraSnapshot> {
        self.last_published.as_ref()
    }

    pub fn default_view(&self) -> CameraState {
        self.default_view
    }

    pub fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    /// `false` as soon as the held transition's token is cancelled, even
    /// before the next tick drops it.
    pub fn is_animating(&self) -> bool {
        self.active().is_some()
    }

    pub fn active(&self) -> Option<&AnimationHandle> {
        self.active.as_ref().filter(|h| !h.cancel.is_cancelled())
    }

    pub fn subscribe(&mut self, f: impl FnMut(&CameraSnapshot) + 'static) -> SubscriptionId {
        self.bus.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Eased transition over the zoom duration.
    pub fn animate_to(&mut self, target: CameraState) -> TransitionId {
        self.animate_to_with(target, DurationClass::Zoom, None)
    }

    pub fn animate_to_then(
        &mut self,
        target: CameraState,
        on_complete: impl FnOnce(&CameraState) + 'static,
    ) -> TransitionId {
        self.animate_to_with(target, DurationClass::Zoom, Some(Box::new(on_complete)))
    }

    pub fn animate_to_with(
        &mut self,
        target: CameraState,
        duration: DurationClass,
        on_complete: Option<Completion>,
    ) -> TransitionId {
        self.interrupt("superseded");

        let id = TransitionId(self.next_transition);
        self.next_transition += 1;
        let to = self.constraints.apply(target);
        let duration_s = self.motion.durations.seconds(duration);
        debug!(
            transition = id.0,
            from = ?self.camera,
            to = ?to,
            duration_s,
            "transition started"
        );

        self.active = Some(AnimationHandle {
            id,
            from: self.camera,
            to,
            duration_s,
            easing: self.motion.easing,
            started_at: None,
            cancel: CancelToken::new(),
            throttle: PublishThrottle::new(self.motion.throttle_interval_s, self.motion.epsilon),
            on_complete,
        });
        id
    }

    /// Transition back to the configured default view.
    pub fn reset_to_default(&mut self) -> TransitionId {
        self.animate_to(self.default_view)
    }

    /// Jumps to `state` without easing and publishes it synchronously.
    pub fn set_immediate(&mut self, state: CameraState) {
        self.interrupt("set_immediate");
        self.camera = self.constraints.apply(state);
        let snapshot = CameraSnapshot {
            camera: self.camera,
            time: self.now,
            transition: None,
            phase: SnapshotPhase::Immediate,
        };
        self.publish(snapshot);
    }

    /// Stops the in-flight transition where it is. Returns `true` if one was
    /// running.
    pub fn cancel(&mut self) -> bool {
        self.interrupt("cancelled")
    }

    fn interrupt(&mut self, reason: &'static str) -> bool {
        match self.active.take() {
            Some(handle) => {
                handle.cancel.cancel();
                debug!(transition = handle.id.0, reason, "transition interrupted");
                true
            }
            None => false,
        }
    }

    /// Advances the held transition to `frame.time`.
    pub fn tick(&mut self, frame: Frame) {
        let now = match self.last_published {
            Some(last) if frame.time.0 < last.time.0 => last.time,
            _ => frame.time,
        };
        let now = if now.0 < self.now.0 { self.now } else { now };
        self.now = now;

        let Some(handle) = self.active.as_mut() else {
            return;
        };
        if handle.cancel.is_cancelled() {
            self.interrupt("token cancelled");
            return;
        }

        let first_tick = handle.started_at.is_none();
        let started_at = *handle.started_at.get_or_insert(now);
        let elapsed = now.since(started_at);
        let progress = if handle.duration_s > 0.0 {
            (elapsed / handle.duration_s).min(1.0)
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.finish(now);
            return;
        }

        let camera = handle.sample(progress);
        self.camera = camera;
        let id = handle.id;
        let phase = if first_tick {
            SnapshotPhase::Start
        } else if handle.throttle.should_publish(now, &camera) {
            SnapshotPhase::Progress
        } else {
            trace!(transition = id.0, progress, "snapshot throttled");
            return;
        };
        handle.throttle.record(now, camera);
        self.publish(CameraSnapshot {
            camera,
            time: now,
            transition: Some(id),
            phase,
        });
    }

    fn finish(&mut self, now: Time) {
        let Some(mut handle) = self.active.take() else {
            return;
        };
        self.camera = handle.to;
        let on_complete = handle.on_complete.take();
        debug!(transition = handle.id.0, camera = ?handle.to, "transition complete");
        self.publish(CameraSnapshot {
            camera: handle.to,
            time: now,
            transition: Some(handle.id),
            phase: SnapshotPhase::End,
        });
        if let Some(cb) = on_complete {
            cb(&self.camera);
        }
    }

    fn publish(&mut self, snapshot: CameraSnapshot) {
        trace!(phase = ?snapshot.phase, time = snapshot.time.0, "publish");
        self.last_published = Some(snapshot);
        self.bus.emit(&snapshot);
    }
}

impl Default for ViewportAnimator {
    fn default() -> Self {
        Self::new(
            CameraState::default(),
            CameraConstraints::default(),
            MotionConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraSnapshot, SnapshotPhase, ViewportAnimator};
    use crate::config::{DurationClass, MotionConfig, MotionDurations};
    use foundation::camera::{CameraConstraints, CameraState, ZoomRange};
    use foundation::time::Time;
    use runtime::Frame;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn recorder(animator: &mut ViewportAnimator) -> Rc<RefCell<Vec<CameraSnapshot>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        animator.subscribe(move |s| sink.borrow_mut().push(*s));
        log
    }

    fn animator_at(camera: CameraState) -> ViewportAnimator {
        let mut a = ViewportAnimator::new(
            camera,
            CameraConstraints::new(ZoomRange::new(1.0, 5.0)),
            MotionConfig::default(),
        );
        a.set_immediate(camera);
        a
    }

    /// Ticks at 60 fps from `start` for `frames` frames.
    fn run(a: &mut ViewportAnimator, start: f64, frames: u64) {
        for i in 0..frames {
            a.tick(Frame::at(i, Time(start + i as f64 / 60.0), 1.0 / 60.0));
        }
    }

    #[test]
    fn lands_exactly_on_target() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(10.0, 10.0, 3.0));
        run(&mut a, 0.0, 60);

        assert!(!a.is_animating());
        let log = log.borrow();
        let last = log.last().unwrap();
        assert_eq!(last.phase, SnapshotPhase::End);
        assert_eq!(last.camera, CameraState::at(10.0, 10.0, 3.0));
        assert_eq!(a.camera(), CameraState::at(10.0, 10.0, 3.0));
    }

    #[test]
    fn first_snapshot_is_the_pre_transition_state() {
        let mut a = animator_at(CameraState::at(-5.0, 12.0, 2.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(30.0, 40.0, 4.0));
        run(&mut a, 1.0, 3);

        let first = log.borrow()[0];
        assert_eq!(first.phase, SnapshotPhase::Start);
        assert_eq!(first.camera, CameraState::at(-5.0, 12.0, 2.0));
    }

    #[test]
    fn snapshots_are_time_ordered_and_monotonic() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(40.0, -30.0, 4.0));
        run(&mut a, 0.0, 120);

        let log = log.borrow();
        assert!(log.len() > 2);
        for pair in log.windows(2) {
            assert!(pair[0].time.0 <= pair[1].time.0);
            assert!(pair[0].camera.center.lng <= pair[1].camera.center.lng);
            assert!(pair[0].camera.center.lat >= pair[1].camera.center.lat);
            assert!(pair[0].camera.zoom <= pair[1].camera.zoom);
        }
    }

    #[test]
    fn throttle_skips_frames_faster_than_the_interval() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(40.0, 0.0, 1.0));
        // 240 fps over the 0.6 s zoom duration.
        for i in 0..=150 {
            a.tick(Frame::at(i, Time(i as f64 / 240.0), 1.0 / 240.0));
        }
        let log = log.borrow();
        let progress = log
            .iter()
            .filter(|s| s.phase == SnapshotPhase::Progress)
            .count();
        assert!(progress < 144 / 8 + 1, "published {progress} intermediates");
        for pair in log.windows(2) {
            if pair[1].phase == SnapshotPhase::Progress {
                assert!(pair[1].time.since(pair[0].time) >= 0.033);
            }
        }
        assert_eq!(log.last().unwrap().phase, SnapshotPhase::End);
    }

    #[test]
    fn interruption_fires_one_completion() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        let completed_a = Rc::new(Cell::new(0));
        let completed_b = Rc::new(Cell::new(0));

        let ca = completed_a.clone();
        let first = a.animate_to_then(CameraState::at(50.0, 50.0, 5.0), move |_| ca.set(ca.get() + 1));
        run(&mut a, 0.0, 10);

        let cb = completed_b.clone();
        let second = a.animate_to_then(CameraState::at(-20.0, 5.0, 2.0), move |_| cb.set(cb.get() + 1));
        for i in 10..120 {
            a.tick(Frame::at(i, Time(i as f64 / 60.0), 1.0 / 60.0));
        }

        assert_eq!(completed_a.get(), 0);
        assert_eq!(completed_b.get(), 1);
        assert_eq!(a.camera(), CameraState::at(-20.0, 5.0, 2.0));

        let log = log.borrow();
        let after_b = log.iter().position(|s| s.transition == Some(second)).unwrap();
        assert!(log[after_b..].iter().all(|s| s.transition == Some(second)));
        assert!(log.iter().all(|s| !(s.transition == Some(first) && s.phase == SnapshotPhase::End)));
    }

    #[test]
    fn interrupted_transition_restarts_from_current_camera() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(50.0, 0.0, 1.0));
        run(&mut a, 0.0, 10);
        let mid = a.camera();
        let second = a.animate_to(CameraState::at(0.0, 0.0, 1.0));
        a.tick(Frame::at(10, Time(10.0 / 60.0), 1.0 / 60.0));

        let start = log
            .borrow()
            .iter()
            .find(|s| s.transition == Some(second))
            .copied()
            .unwrap();
        assert_eq!(start.phase, SnapshotPhase::Start);
        assert_eq!(start.camera, mid);
    }

    #[test]
    fn set_immediate_cancels_and_publishes_synchronously() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        a.animate_to_then(CameraState::at(10.0, 10.0, 3.0), move |_| flag.set(true));
        run(&mut a, 0.0, 5);

        a.set_immediate(CameraState::at(1.0, 2.0, 2.5));
        assert!(!a.is_animating());
        assert_eq!(log.borrow().last().unwrap().phase, SnapshotPhase::Immediate);
        assert_eq!(a.camera(), CameraState::at(1.0, 2.0, 2.5));

        let published = log.borrow().len();
        run(&mut a, 1.0, 60);
        assert_eq!(log.borrow().len(), published);
        assert!(!done.get());
    }

    #[test]
    fn cancel_token_stops_the_transition() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        a.animate_to(CameraState::at(10.0, 10.0, 3.0));
        let token = a.active().unwrap().cancel_token();
        run(&mut a, 0.0, 3);
        token.cancel();
        assert!(!a.is_animating());
        assert!(a.active().is_none());
        a.tick(Frame::at(3, Time(0.05), 1.0 / 60.0));
        assert!(!a.is_animating());
        assert_ne!(a.camera(), CameraState::at(10.0, 10.0, 3.0));
    }

    #[test]
    fn zero_duration_publishes_a_single_end() {
        let motion = MotionConfig {
            durations: MotionDurations {
                base: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut a = ViewportAnimator::new(CameraState::at(0.0, 0.0, 1.0), CameraConstraints::default(), motion);
        let log = recorder(&mut a);
        a.animate_to_with(CameraState::at(3.0, 4.0, 2.0), DurationClass::Base, None);
        a.tick(Frame::new(0, 1.0 / 60.0));

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].phase, SnapshotPhase::End);
        assert_eq!(log[0].camera, CameraState::at(3.0, 4.0, 2.0));
    }

    #[test]
    fn targets_are_constrained() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        a.animate_to(CameraState::at(0.0, 89.0, 12.0));
        assert_eq!(*a.active().unwrap().target(), CameraState::at(0.0, 85.0, 5.0));
        run(&mut a, 0.0, 60);
        assert_eq!(a.camera(), CameraState::at(0.0, 85.0, 5.0));
    }

    #[test]
    fn reset_returns_to_default_view() {
        let mut a = ViewportAnimator::default();
        a.set_immediate(CameraState::at(60.0, -10.0, 4.0));
        a.reset_to_default();
        run(&mut a, 0.0, 60);
        assert_eq!(a.camera(), CameraState::at(0.0, 20.0, 1.2));
    }

    #[test]
    fn backwards_frame_time_does_not_reorder_snapshots() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let log = recorder(&mut a);
        a.animate_to(CameraState::at(10.0, 0.0, 1.0));
        a.tick(Frame::at(0, Time(1.0), 0.0));
        a.tick(Frame::at(1, Time(0.5), 0.0));
        a.tick(Frame::at(2, Time(2.0), 0.0));
        let log = log.borrow();
        for pair in log.windows(2) {
            assert!(pair[0].time.0 <= pair[1].time.0);
        }
        assert_eq!(log.last().unwrap().phase, SnapshotPhase::End);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let mut a = animator_at(CameraState::at(0.0, 0.0, 1.0));
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = a.subscribe(move |_| c.set(c.get() + 1));
        a.set_immediate(CameraState::at(1.0, 1.0, 1.0));
        assert!(a.unsubscribe(id));
        a.set_immediate(CameraState::at(2.0, 2.0, 1.0));
        assert_eq!(count.get(), 1);
    }
}
