//! The paw detector: rule chain, shared buffer and hook lifecycle.
//!
//! ```text
//! hook thread ──▶ on_event ──▶ lock ─▶ push ─▶ rules ─▶ unlock ──▶ on_detect
//! ```
//!
//! The buffer lock is held only while the event is appended and the rules
//! run. The detection callback runs after the lock is released so a slow
//! action never blocks event delivery.

use crate::collector::hook::{HookError, HookRegistration, KeyHook};
use crate::collector::types::KeyEvent;
use crate::core::EventBuffer;
use crate::rules::RuleChain;
use crate::transparency::{create_shared_log, SharedTransparencyLog};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors raised by the start/stop toggle.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detection is already running")]
    AlreadyWatching,
    #[error("Detection must be started before it can be stopped")]
    NotWatching,
    #[error("Key hook error: {0}")]
    Hook(#[from] HookError),
}

/// Whether the detector is currently registered with its hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Watching,
}

/// Action run once all rules pass for an event.
pub type DetectCallback = Arc<dyn Fn() + Send + Sync>;

/// State shared with the hook callback.
struct Pipeline {
    chain: RuleChain,
    buffer: Mutex<EventBuffer>,
    on_detect: DetectCallback,
    transparency: SharedTransparencyLog,
}

impl Pipeline {
    fn lock_buffer(&self) -> MutexGuard<'_, EventBuffer> {
        // Rules never panic mid-update, so a poisoned buffer is still ordered.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, event: KeyEvent) -> bool {
        self.transparency.record_key_event();

        let (passed, rejected_by) = {
            let mut buffer = self.lock_buffer();
            buffer.push(event);
            self.transparency.record_buffer_len(buffer.len());

            let outcome = self.chain.evaluate(std::mem::take(&mut *buffer));
            *buffer = outcome.buffer;
            (outcome.passed, outcome.rejected_by)
        };

        if let Some(kind) = rejected_by {
            self.transparency.record_rejection(kind);
            return false;
        }
        if !passed {
            return false;
        }

        tracing::info!("Paw detected");
        self.transparency.record_detection();
        (self.on_detect)();
        true
    }
}

/// Watches key events from a hook and reports paws.
///
/// `start` and `stop` take `&mut self`, so toggling is serialized by whoever
/// owns the detector.
pub struct Detector<H: KeyHook> {
    hook: H,
    pipeline: Arc<Pipeline>,
    registration: Option<HookRegistration>,
}

impl<H: KeyHook> Detector<H> {
    pub fn new(hook: H, chain: RuleChain, on_detect: impl Fn() + Send + Sync + 'static) -> Self {
        Self::with_transparency_log(hook, chain, on_detect, create_shared_log())
    }

    pub fn with_transparency_log(
        hook: H,
        chain: RuleChain,
        on_detect: impl Fn() + Send + Sync + 'static,
        transparency: SharedTransparencyLog,
    ) -> Self {
        Self {
            hook,
            pipeline: Arc::new(Pipeline {
                chain,
                buffer: Mutex::new(EventBuffer::new()),
                on_detect: Arc::new(on_detect),
                transparency,
            }),
            registration: None,
        }
    }

    pub fn state(&self) -> DetectorState {
        if self.registration.is_some() {
            DetectorState::Watching
        } else {
            DetectorState::Idle
        }
    }

    pub fn is_watching(&self) -> bool {
        self.state() == DetectorState::Watching
    }

    /// Register with the hook and begin evaluating events.
    pub fn start(&mut self) -> Result<(), DetectorError> {
        if self.registration.is_some() {
            return Err(DetectorError::AlreadyWatching);
        }

        tracing::info!("Starting detection");
        let pipeline = self.pipeline.clone();
        let registration = self.hook.register(Arc::new(move |event| {
            pipeline.handle(event);
        }))?;
        self.registration = Some(registration);
        tracing::info!("Started detection");
        Ok(())
    }

    /// Deregister from the hook and forget buffered events.
    ///
    /// The detector is idle afterwards even if releasing the hook fails.
    pub fn stop(&mut self) -> Result<(), DetectorError> {
        let registration = self.registration.take().ok_or(DetectorError::NotWatching)?;

        tracing::info!("Stopping detection");
        let released = registration.release();
        self.pipeline.lock_buffer().clear();
        released?;
        tracing::info!("Stopped detection");
        Ok(())
    }

    /// Evaluate one event directly, bypassing the hook.
    ///
    /// Returns whether the event completed a detection.
    pub fn on_event(&self, event: KeyEvent) -> bool {
        self.pipeline.handle(event)
    }

    /// Copy of the events currently buffered.
    pub fn buffered_events(&self) -> EventBuffer {
        self.pipeline.lock_buffer().clone()
    }

    pub fn chain(&self) -> &RuleChain {
        &self.pipeline.chain
    }

    pub fn transparency_log(&self) -> &SharedTransparencyLog {
        &self.pipeline.transparency
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::hook::KeyCallback;
    use crate::core::{KeyboardLayout, MAX_BUFFERED_EVENTS};
    use crate::rules::{
        AdjacencyRule, RuleKind, SelfAdjacency, TimeWindowRule, UnreleasedCountRule,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hook that hands the callback back to the test instead of a thread.
    #[derive(Default)]
    struct ManualHook {
        callback: Arc<Mutex<Option<KeyCallback>>>,
        registrations: Arc<AtomicUsize>,
        releases: Arc<AtomicUsize>,
    }

    impl ManualHook {
        fn send(&self, event: KeyEvent) {
            let callback = self.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(event);
            }
        }
    }

    impl KeyHook for ManualHook {
        fn register(&self, callback: KeyCallback) -> Result<HookRegistration, HookError> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            *self.callback.lock().unwrap() = Some(callback);

            let slot = self.callback.clone();
            let releases = self.releases.clone();
            Ok(HookRegistration::new(move || {
                *slot.lock().unwrap() = None;
                releases.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
        }
    }

    struct FailingHook;

    impl KeyHook for FailingHook {
        fn register(&self, _callback: KeyCallback) -> Result<HookRegistration, HookError> {
            Err(HookError::PermissionDenied)
        }
    }

    /// Registers fine but fails to let go.
    struct StuckHook;

    impl KeyHook for StuckHook {
        fn register(&self, _callback: KeyCallback) -> Result<HookRegistration, HookError> {
            Ok(HookRegistration::new(|| Err(HookError::ThreadPanicked)))
        }
    }

    fn paw_chain() -> RuleChain {
        RuleChain::default()
            .with_rule(TimeWindowRule::new(0.05).unwrap())
            .with_rule(UnreleasedCountRule::new(3).unwrap())
            .with_rule(
                AdjacencyRule::new(&KeyboardLayout::qwerty(), 3, SelfAdjacency::Counted).unwrap(),
            )
    }

    fn counting_detector(hook: ManualHook) -> (Detector<ManualHook>, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let detector = Detector::new(hook, paw_chain(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (detector, fired)
    }

    #[test]
    fn test_stop_before_start_fails() {
        let (mut detector, _) = counting_detector(ManualHook::default());
        assert!(matches!(detector.stop(), Err(DetectorError::NotWatching)));
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn test_double_start_keeps_single_registration() {
        let (mut detector, _) = counting_detector(ManualHook::default());
        detector.start().unwrap();
        assert!(matches!(detector.start(), Err(DetectorError::AlreadyWatching)));

        assert_eq!(detector.hook().registrations.load(Ordering::SeqCst), 1);
        assert_eq!(detector.hook().releases.load(Ordering::SeqCst), 0);
        assert!(detector.is_watching());
    }

    #[test]
    fn test_start_stop_start() {
        let (mut detector, _) = counting_detector(ManualHook::default());
        detector.start().unwrap();
        detector.stop().unwrap();
        assert_eq!(detector.state(), DetectorState::Idle);
        assert_eq!(detector.hook().releases.load(Ordering::SeqCst), 1);

        detector.start().unwrap();
        assert_eq!(detector.hook().registrations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hook_failure_leaves_detector_idle() {
        let mut detector = Detector::new(FailingHook, paw_chain(), || {});
        assert!(matches!(
            detector.start(),
            Err(DetectorError::Hook(HookError::PermissionDenied))
        ));
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn test_three_adjacent_presses_fire_once() {
        let (mut detector, fired) = counting_detector(ManualHook::default());
        detector.start().unwrap();

        detector.hook().send(KeyEvent::press("s", 10.00));
        detector.hook().send(KeyEvent::press("d", 10.01));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        detector.hook().send(KeyEvent::press("f", 10.02));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(detector.transparency_log().stats().detections, 1);
    }

    #[test]
    fn test_slow_typing_never_fires() {
        let (detector, fired) = counting_detector(ManualHook::default());
        let mut t = 0.0;
        for key in ["h", "e", "l", "l", "o"] {
            detector.on_event(KeyEvent::press(key, t));
            detector.on_event(KeyEvent::release(key, t + 0.08));
            t += 0.2;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let stats = detector.transparency_log().stats();
        assert_eq!(stats.key_events, 10);
        assert!(stats.rejections.get(&RuleKind::TimeWindow).copied().unwrap_or(0) > 0);
    }

    #[test]
    fn test_buffer_persists_between_events() {
        let (detector, _) = counting_detector(ManualHook::default());
        detector.on_event(KeyEvent::press("s", 0.00));
        detector.on_event(KeyEvent::press("d", 0.01));
        detector.on_event(KeyEvent::press("f", 0.02));

        // The held-key rule trimmed the buffer to the three held keys.
        assert_eq!(detector.buffered_events().len(), 3);
    }

    #[test]
    fn test_stop_clears_buffer_and_events_stop_flowing() {
        let (mut detector, fired) = counting_detector(ManualHook::default());
        detector.start().unwrap();
        detector.hook().send(KeyEvent::press("s", 0.00));
        detector.hook().send(KeyEvent::press("d", 0.01));
        detector.stop().unwrap();
        assert!(detector.buffered_events().is_empty());

        detector.hook().send(KeyEvent::press("f", 0.02));
        assert!(detector.buffered_events().is_empty());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_runs_outside_buffer_lock() {
        let fired = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Arc<Pipeline>>>> = Arc::new(Mutex::new(None));

        let counter = fired.clone();
        let pipeline_slot = slot.clone();
        let detector = Detector::new(ManualHook::default(), paw_chain(), move || {
            // Would deadlock if the detector still held the buffer lock.
            if let Some(pipeline) = pipeline_slot.lock().unwrap().as_ref() {
                let _ = pipeline.lock_buffer().len();
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *slot.lock().unwrap() = Some(detector.pipeline.clone());

        detector.on_event(KeyEvent::press("s", 0.00));
        detector.on_event(KeyEvent::press("d", 0.01));
        assert!(detector.on_event(KeyEvent::press("f", 0.02)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_failure_is_reported_and_detector_goes_idle() {
        let mut detector = Detector::new(StuckHook, paw_chain(), || {});
        detector.start().unwrap();
        detector.on_event(KeyEvent::press("s", 0.00));
        detector.on_event(KeyEvent::press("d", 0.01));

        assert!(matches!(
            detector.stop(),
            Err(DetectorError::Hook(HookError::ThreadPanicked))
        ));
        assert_eq!(detector.state(), DetectorState::Idle);
        assert!(detector.buffered_events().is_empty());
    }

    #[test]
    fn test_poisoned_buffer_is_recovered() {
        let (detector, fired) = counting_detector(ManualHook::default());

        let pipeline = detector.pipeline.clone();
        let result = std::thread::spawn(move || {
            let _guard = pipeline.buffer.lock().unwrap();
            panic!("panic while holding the buffer");
        })
        .join();
        assert!(result.is_err());
        assert!(detector.pipeline.buffer.is_poisoned());

        detector.on_event(KeyEvent::press("s", 0.00));
        detector.on_event(KeyEvent::press("d", 0.01));
        assert!(detector.on_event(KeyEvent::press("f", 0.02)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_buffer_stays_bounded_without_truncating_rule() {
        // Adjacency first: an unknown key fails it before anything trims.
        let chain = RuleChain::default()
            .with_rule(
                AdjacencyRule::new(&KeyboardLayout::qwerty(), 3, SelfAdjacency::Counted).unwrap(),
            )
            .with_rule(TimeWindowRule::new(0.05).unwrap());
        let detector = Detector::new(ManualHook::default(), chain, || {});

        detector.on_event(KeyEvent::press("f13", 0.0));
        for i in 1..=1000 {
            detector.on_event(KeyEvent::press("a", i as f64 * 0.001));
        }

        assert!(detector.buffered_events().len() <= MAX_BUFFERED_EVENTS);
        assert_eq!(
            detector.transparency_log().stats().max_buffer_len,
            MAX_BUFFERED_EVENTS as u64
        );
    }
}
