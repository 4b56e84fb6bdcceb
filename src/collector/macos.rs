//! macOS key hook using a CGEvent tap.
//!
//! The tap runs on its own thread with a CoreFoundation run loop and calls the
//! registered callback for every key down, key up and modifier change. It
//! requires Input Monitoring permission.

use crate::collector::hook::{HookError, HookRegistration, KeyCallback, KeyHook};
use crate::collector::keynames::macos_key_id;
use crate::collector::types::{KeyAction, KeyEvent};
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    CallbackResult, EventField,
};
use crossbeam_channel::bounded;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// The macOS key hook.
#[derive(Debug, Default)]
pub struct MacOSCollector;

impl MacOSCollector {
    pub fn new() -> Self {
        Self
    }
}

impl KeyHook for MacOSCollector {
    fn register(&self, callback: KeyCallback) -> Result<HookRegistration, HookError> {
        let running = Arc::new(AtomicBool::new(true));
        let (status_tx, status_rx) = bounded::<Result<(), HookError>>(1);

        let thread_running = running.clone();
        let handle = thread::Builder::new()
            .name("paws-event-tap".into())
            .spawn(move || {
                let result = run_event_loop(callback, thread_running.clone(), |status| {
                    let _ = status_tx.send(status);
                });
                if let Err(e) = result {
                    tracing::error!(error = %e, "Event tap loop exited with error");
                }
                thread_running.store(false, Ordering::SeqCst);
            })?;

        // Wait for the tap thread to report whether the tap could be created.
        match status_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(HookError::ThreadExited);
            }
        }

        tracing::info!("CGEvent tap installed");
        Ok(HookRegistration::new(move || {
            running.store(false, Ordering::SeqCst);
            handle.join().map_err(|_| HookError::ThreadPanicked)?;
            tracing::info!("CGEvent tap removed");
            Ok(())
        }))
    }
}

/// Run the Core Graphics event loop until `running` is cleared.
///
/// `report` is called exactly once, after the tap has been created or has
/// failed to be created.
fn run_event_loop(
    callback: KeyCallback,
    running: Arc<AtomicBool>,
    report: impl FnOnce(Result<(), HookError>),
) -> Result<(), HookError> {
    // Modifier keys only produce FlagsChanged; track which ones are down.
    let held_modifiers: RefCell<HashSet<u16>> = RefCell::new(HashSet::new());

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        |_proxy, event_type, event: &CGEvent| {
            if let Some(key_event) = process_cg_event(event_type, event, &held_modifiers) {
                callback(key_event);
            }
            CallbackResult::Keep
        },
    );

    let tap = match tap {
        Ok(tap) => tap,
        Err(_) => {
            report(Err(HookError::TapCreationFailed));
            return Ok(());
        }
    };

    let source = match tap.mach_port().create_runloop_source(0) {
        Ok(source) => source,
        Err(_) => {
            report(Err(HookError::RunLoopSourceFailed));
            return Ok(());
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();
    report(Ok(()));

    while running.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopDefaultMode },
            Duration::from_millis(100),
            false,
        );
    }

    Ok(())
}

/// Convert a CGEvent into a key event.
fn process_cg_event(
    event_type: CGEventType,
    event: &CGEvent,
    held_modifiers: &RefCell<HashSet<u16>>,
) -> Option<KeyEvent> {
    let code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
    let key = macos_key_id(code);

    match event_type {
        CGEventType::KeyDown => Some(KeyEvent::now(key, KeyAction::Press)),
        CGEventType::KeyUp => Some(KeyEvent::now(key, KeyAction::Release)),
        CGEventType::FlagsChanged => {
            let mut held = held_modifiers.borrow_mut();
            let action = if held.remove(&code) {
                KeyAction::Release
            } else {
                held.insert(code);
                KeyAction::Press
            };
            Some(KeyEvent::now(key, action))
        }
        _ => None,
    }
}

/// Check if the application has Input Monitoring permission.
///
/// macOS has no direct query for this; creating a passive tap fails when the
/// permission is missing.
pub fn check_permission() -> bool {
    CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::KeyDown],
        |_proxy, _type, _event| CallbackResult::Keep,
    )
    .is_ok()
}
