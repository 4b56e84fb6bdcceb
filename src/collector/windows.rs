//! Windows key hook using a low-level keyboard hook (`WH_KEYBOARD_LL`).
//!
//! The hook is installed on a dedicated thread that pumps messages; Windows
//! calls the hook procedure on that same thread, so the callback lives in a
//! thread-local. Releasing the registration posts `WM_QUIT` to the thread.

use crate::collector::hook::{HookError, HookRegistration, KeyCallback, KeyHook};
use crate::collector::keynames::windows_key_id;
use crate::collector::types::{KeyAction, KeyEvent};
use crossbeam_channel::bounded;
use std::cell::RefCell;
use std::thread;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx,
    HHOOK, KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

/// The Windows key hook.
#[derive(Debug, Default)]
pub struct WindowsCollector;

impl WindowsCollector {
    pub fn new() -> Self {
        Self
    }
}

thread_local! {
    static KEY_CALLBACK: RefCell<Option<KeyCallback>> = const { RefCell::new(None) };
}

impl KeyHook for WindowsCollector {
    fn register(&self, callback: KeyCallback) -> Result<HookRegistration, HookError> {
        let (status_tx, status_rx) = bounded::<Result<u32, HookError>>(1);

        let handle = thread::Builder::new()
            .name("paws-keyboard-hook".into())
            .spawn(move || {
                KEY_CALLBACK.with(|cell| *cell.borrow_mut() = Some(callback));
                run_hook_loop(|status| {
                    let _ = status_tx.send(status);
                });
                KEY_CALLBACK.with(|cell| *cell.borrow_mut() = None);
            })?;

        let thread_id = match status_rx.recv() {
            Ok(Ok(thread_id)) => thread_id,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(HookError::ThreadExited);
            }
        };

        tracing::info!(thread_id, "Windows keyboard hook installed");
        Ok(HookRegistration::new(move || {
            unsafe {
                let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
            handle.join().map_err(|_| HookError::ThreadPanicked)?;
            tracing::info!("Windows keyboard hook removed");
            Ok(())
        }))
    }
}

/// Low-level keyboard hook callback.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        let kb_struct = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let action = match w_param.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyAction::Press),
            WM_KEYUP | WM_SYSKEYUP => Some(KeyAction::Release),
            _ => None,
        };

        if let Some(action) = action {
            let key = windows_key_id(kb_struct.vkCode, kb_struct.scanCode);
            let event = KeyEvent::now(key, action);
            KEY_CALLBACK.with(|cell| {
                if let Some(callback) = cell.borrow().as_ref() {
                    callback(event);
                }
            });
        }
    }

    CallNextHookEx(HHOOK::default(), n_code, w_param, l_param)
}

/// Install the hook and pump messages until `WM_QUIT`.
fn run_hook_loop(report: impl FnOnce(Result<u32, HookError>)) {
    unsafe {
        let hook = match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
            Ok(hook) => hook,
            Err(_) => {
                report(Err(HookError::HookInstallationFailed));
                return;
            }
        };
        report(Ok(GetCurrentThreadId()));

        let mut msg = MSG::default();
        // GetMessageW returns 0 on WM_QUIT and -1 on error.
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {}

        let _ = UnhookWindowsHookEx(hook);
    }
}

/// Low-level hooks need no explicit permission; verify one can be installed.
pub fn check_permission() -> bool {
    unsafe {
        match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0) {
            Ok(hook) => {
                let _ = UnhookWindowsHookEx(hook);
                true
            }
            Err(_) => false,
        }
    }
}
