//! Windows WinEvent hook implementation.
//!
//! This module installs two out-of-context WinEvent hooks using
//! `SetWinEventHook`: one covering the object show/hide/destroy range and
//! one for `EVENT_SYSTEM_MOVESIZEEND`. Both hooks share a dedicated Win32
//! message-loop thread.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::OnceLock;
use std::thread;

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PostThreadMessageW, CHILDID_SELF, EVENT_OBJECT_DESTROY,
    EVENT_OBJECT_HIDE, EVENT_OBJECT_SHOW, EVENT_SYSTEM_MOVESIZEEND, MSG, OBJID_WINDOW,
    WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS, WM_QUIT,
};

use zone_core::WindowId;

use super::{HookError, WindowEvent, WindowEventSource};

/// Global sender used by hook callbacks to deliver events to the engine.
/// Initialized once by [`WindowsWindowEventSource::start`].
static EVENT_SENDER: OnceLock<Sender<WindowEvent>> = OnceLock::new();

/// Thread id of the hook message loop, for posting WM_QUIT on stop.
static HOOK_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Windows WinEvent-based window event source.
///
/// Installs object lifecycle and move-size hooks and runs a dedicated Win32
/// message loop thread.
pub struct WindowsWindowEventSource;

impl WindowsWindowEventSource {
    /// Creates a new (unstarted) event source instance.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsWindowEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowEventSource for WindowsWindowEventSource {
    fn start(&self) -> Result<mpsc::Receiver<WindowEvent>, HookError> {
        let (tx, rx) = mpsc::channel::<WindowEvent>();

        // Register the global sender. This will fail if called a second time.
        EVENT_SENDER
            .set(tx)
            .map_err(|_| HookError::AlreadyStarted)?;

        // Spawn the Win32 message loop thread that installs the hooks, then
        // block until it reports whether SetWinEventHook succeeded. A hook
        // that never installs must surface here, not as a silent log line,
        // so the caller can fall back to poll-only membership tracking.
        let (install_tx, install_rx) = mpsc::channel::<Result<(), HookError>>();
        thread::Builder::new()
            .name("zone-winevent-loop".to_string())
            .spawn(move || run_hook_message_loop(install_tx))
            .map_err(|e| HookError::InstallFailed(e.to_string()))?;

        match install_rx.recv() {
            Ok(Ok(())) => Ok(rx),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(HookError::InstallFailed(
                "hook thread exited before reporting".to_string(),
            )),
        }
    }

    fn stop(&self) {
        let thread_id = HOOK_THREAD_ID.load(Ordering::SeqCst);
        if thread_id != 0 {
            // SAFETY: Posting WM_QUIT to the hook thread makes GetMessageW
            // return FALSE; the thread then unhooks and exits.
            unsafe {
                let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
        }
    }
}

/// Entry point for the dedicated Win32 message loop thread. Reports hook
/// installation success or failure over `install_tx` before pumping.
fn run_hook_message_loop(install_tx: Sender<Result<(), HookError>>) {
    // SAFETY: GetCurrentThreadId has no preconditions.
    HOOK_THREAD_ID.store(unsafe { GetCurrentThreadId() }, Ordering::SeqCst);

    // SAFETY: SetWinEventHook requires the calling thread to run a message
    // loop for out-of-context hooks. A null module handle with
    // WINEVENT_OUTOFCONTEXT means the callback runs in this process.
    // EVENT_OBJECT_DESTROY..EVENT_OBJECT_HIDE covers destroy, show and hide.
    let lifecycle_hook: HWINEVENTHOOK = unsafe {
        SetWinEventHook(
            EVENT_OBJECT_DESTROY,
            EVENT_OBJECT_HIDE,
            None,
            Some(win_event_proc),
            0,
            0,
            WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
        )
    };
    // SAFETY: Same contract, single event id for move-size completion.
    let movesize_hook: HWINEVENTHOOK = unsafe {
        SetWinEventHook(
            EVENT_SYSTEM_MOVESIZEEND,
            EVENT_SYSTEM_MOVESIZEEND,
            None,
            Some(win_event_proc),
            0,
            0,
            WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
        )
    };

    if lifecycle_hook.is_invalid() || movesize_hook.is_invalid() {
        // SAFETY: only valid hook handles are unhooked.
        unsafe {
            if !lifecycle_hook.is_invalid() {
                let _ = UnhookWinEvent(lifecycle_hook);
            }
            if !movesize_hook.is_invalid() {
                let _ = UnhookWinEvent(movesize_hook);
            }
        }
        let _ = install_tx.send(Err(HookError::InstallFailed(
            "SetWinEventHook returned a null hook".to_string(),
        )));
        return;
    }
    let _ = install_tx.send(Ok(()));

    // Win32 message loop – blocks until WM_QUIT is posted
    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            DispatchMessageW(&msg);
        }
        let _ = UnhookWinEvent(lifecycle_hook);
        let _ = UnhookWinEvent(movesize_hook);
    }
}

/// WinEvent hook callback.
///
/// # Safety
///
/// Called by Windows from the hook message loop thread. Must return quickly;
/// all work is deferred through the channel.
unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    id_child: i32,
    _id_event_thread: u32,
    _time_ms: u32,
) {
    // Only whole top-level windows are interesting; child objects and UI
    // elements inside a window fire the same event ids.
    if hwnd.0.is_null() || id_object != OBJID_WINDOW.0 || id_child != CHILDID_SELF as i32 {
        return;
    }

    let id = WindowId::from_raw(hwnd.0 as usize as u64);
    let window_event = match event {
        e if e == EVENT_OBJECT_SHOW => WindowEvent::Shown(id),
        e if e == EVENT_OBJECT_HIDE => WindowEvent::Hidden(id),
        e if e == EVENT_OBJECT_DESTROY => WindowEvent::Destroyed(id),
        e if e == EVENT_SYSTEM_MOVESIZEEND => WindowEvent::MoveResizeEnded(id),
        _ => return,
    };

    // Send the event to the engine. Ignore send errors (channel closed
    // during shutdown).
    if let Some(sender) = EVENT_SENDER.get() {
        let _ = sender.send(window_event);
    }
}
