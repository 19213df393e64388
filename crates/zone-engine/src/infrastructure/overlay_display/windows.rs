//! Windows overlay window implementation.
//!
//! Creates a borderless black `WS_POPUP` window with
//! `WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_TRANSPARENT | WS_EX_NOACTIVATE`:
//! always on top, absent from the taskbar and Alt-Tab, click-through, and
//! never activated. The window lives on a dedicated message-loop thread;
//! `show`/`hide` publish the desired state and wake the thread with a
//! posted message, so no window call ever happens off its owning thread.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::warn;

use windows::core::w;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{GetStockObject, BLACK_BRUSH, HBRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    PostThreadMessageW, RegisterClassW, SetWindowPos, ShowWindow, HWND_TOPMOST, MSG,
    SWP_NOACTIVATE, SWP_SHOWWINDOW, SW_HIDE, WM_APP, WM_QUIT, WNDCLASSW, WS_EX_NOACTIVATE,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

use zone_core::Rect;

use super::{OverlayDisplay, OverlayError};

/// Posted to the overlay thread when the desired state changed.
const WM_APPLY_OVERLAY: u32 = WM_APP + 1;

/// Renders the exclusion zone as a native topmost black window.
///
/// The window thread is spawned lazily on the first `show`; `hide` before
/// any `show` is a no-op.
pub struct WindowsOverlayDisplay {
    /// Desired overlay rect; `None` means hidden.
    target: Arc<Mutex<Option<Rect>>>,
    /// Thread id of the overlay message loop; 0 until the first `show`.
    thread_id: Mutex<u32>,
}

impl WindowsOverlayDisplay {
    pub fn new() -> Self {
        Self {
            target: Arc::new(Mutex::new(None)),
            thread_id: Mutex::new(0),
        }
    }

    /// Spawns the overlay window thread on first use and returns its id.
    /// The `thread_id` lock is held across the spawn so concurrent callers
    /// never create two windows.
    fn ensure_window_thread(&self) -> Result<u32, OverlayError> {
        let mut slot = self.thread_id.lock().unwrap_or_else(PoisonError::into_inner);
        if *slot != 0 {
            return Ok(*slot);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, OverlayError>>();
        let target = Arc::clone(&self.target);
        thread::Builder::new()
            .name("zone-overlay-window".to_string())
            .spawn(move || run_overlay_window_loop(target, ready_tx))
            .map_err(|e| OverlayError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                *slot = thread_id;
                Ok(thread_id)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(OverlayError::Thread(
                "overlay thread exited before reporting".to_string(),
            )),
        }
    }

    fn post_apply(&self, thread_id: u32) -> Result<(), OverlayError> {
        // SAFETY: the overlay thread pumps messages for its whole lifetime.
        unsafe { PostThreadMessageW(thread_id, WM_APPLY_OVERLAY, WPARAM(0), LPARAM(0)) }
            .map_err(|e| OverlayError::Thread(e.to_string()))
    }
}

impl Default for WindowsOverlayDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayDisplay for WindowsOverlayDisplay {
    fn show(&self, rect: Rect) -> Result<(), OverlayError> {
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(rect);
        let thread_id = self.ensure_window_thread()?;
        self.post_apply(thread_id)
    }

    fn hide(&self) -> Result<(), OverlayError> {
        let thread_id = *self.thread_id.lock().unwrap_or_else(PoisonError::into_inner);
        if thread_id == 0 {
            return Ok(());
        }
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.post_apply(thread_id)
    }
}

impl Drop for WindowsOverlayDisplay {
    fn drop(&mut self) {
        let thread_id = *self.thread_id.lock().unwrap_or_else(PoisonError::into_inner);
        if thread_id != 0 {
            // SAFETY: WM_QUIT ends the message loop; the thread destroys
            // the window on the way out.
            unsafe {
                let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
        }
    }
}

/// Entry point for the overlay window thread: creates the hidden window,
/// reports readiness, then pumps messages until WM_QUIT.
fn run_overlay_window_loop(
    target: Arc<Mutex<Option<Rect>>>,
    ready_tx: mpsc::Sender<Result<u32, OverlayError>>,
) {
    // SAFETY: GetCurrentThreadId has no preconditions.
    let thread_id = unsafe { GetCurrentThreadId() };

    let hwnd = match create_overlay_window() {
        Ok(h) => h,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(thread_id));

    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop. Thread
    // messages carry a null hwnd and are handled inline.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            if msg.message == WM_APPLY_OVERLAY {
                let desired = *target.lock().unwrap_or_else(PoisonError::into_inner);
                apply_overlay_state(hwnd, desired);
                continue;
            }
            DispatchMessageW(&msg);
        }
        let _ = DestroyWindow(hwnd);
    }
}

/// Registers the overlay window class (black background brush) and creates
/// the window hidden at zero size; `apply_overlay_state` positions it.
fn create_overlay_window() -> Result<HWND, OverlayError> {
    // SAFETY: a null module name returns the handle of the current module.
    let instance: HINSTANCE = unsafe { GetModuleHandleW(None) }
        .map_err(|e| OverlayError::WindowCreation(e.to_string()))?
        .into();

    let class_name = w!("ZoneEngineOverlay");
    let class = WNDCLASSW {
        lpfnWndProc: Some(overlay_wnd_proc),
        hInstance: instance,
        // SAFETY: BLACK_BRUSH is a stock object owned by the system; it is
        // never freed and is valid as a class background brush.
        hbrBackground: HBRUSH(unsafe { GetStockObject(BLACK_BRUSH) }.0),
        lpszClassName: class_name,
        ..Default::default()
    };
    // Re-registering after a previous overlay thread is rejected by the OS;
    // the surviving first registration is the same class, so the result is
    // intentionally ignored.
    // SAFETY: the class struct and its static name outlive the call.
    unsafe { RegisterClassW(&class) };

    // SAFETY: creates a hidden popup owned by this thread. The extended
    // styles keep it out of the taskbar, out of hit-testing and never
    // activated.
    unsafe {
        CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_TRANSPARENT | WS_EX_NOACTIVATE,
            class_name,
            w!("Zone Engine Overlay"),
            WS_POPUP,
            0,
            0,
            0,
            0,
            None,
            None,
            Some(instance),
            None,
        )
    }
    .map_err(|e| OverlayError::WindowCreation(e.to_string()))
}

/// Applies the desired state to the window. Runs on the overlay thread.
fn apply_overlay_state(hwnd: HWND, target: Option<Rect>) {
    match target {
        Some(rect) => {
            // SAFETY: hwnd is the live overlay window owned by this thread.
            // SWP_NOACTIVATE keeps focus where it is; SWP_SHOWWINDOW makes
            // the move double as the initial show.
            let result = unsafe {
                SetWindowPos(
                    hwnd,
                    Some(HWND_TOPMOST),
                    rect.left,
                    rect.top,
                    rect.width(),
                    rect.height(),
                    SWP_NOACTIVATE | SWP_SHOWWINDOW,
                )
            };
            if let Err(e) = result {
                warn!(error = %e, "overlay show failed");
            }
        }
        None => {
            // SAFETY: hiding an already hidden window is a no-op.
            unsafe {
                let _ = ShowWindow(hwnd, SW_HIDE);
            }
        }
    }
}

/// Window procedure for the overlay. The class brush paints the black fill;
/// everything else is default handling.
///
/// # Safety
///
/// Called by Windows on the overlay thread.
unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // SAFETY: forwarding untouched arguments from our own window procedure.
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
