//! Windows window-system adapter built on the Win32 user/GDI APIs.
//!
//! Monitor enumeration goes through `EnumDisplayMonitors` / `GetMonitorInfoW`,
//! window queries through `EnumWindows` and the per-window getters, moves
//! through `SetWindowPos` (batched via `BeginDeferWindowPos`), and cursor
//! confinement through `ClipCursor`.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use zone_core::{Monitor, MonitorHandle, Rect, WindowId, WindowSnapshot};

use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BeginDeferWindowPos, ClipCursor, DeferWindowPos, EndDeferWindowPos, EnumWindows,
    GetForegroundWindow, GetSystemMetrics, GetWindow, GetWindowRect, GetWindowTextW,
    IsWindowVisible, IsZoomed, SetWindowPos, ShowWindow, GW_OWNER, SM_CXVIRTUALSCREEN,
    SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SWP_NOACTIVATE, SWP_NOZORDER,
    SW_RESTORE,
};

use super::{PlatformError, WindowSystem};

const MONITORINFOF_PRIMARY: u32 = 1;

/// Windows implementation of [`WindowSystem`].
pub struct WindowsWindowSystem;

impl WindowsWindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn hwnd_of(id: WindowId) -> HWND {
    HWND(id.as_raw() as usize as *mut core::ffi::c_void)
}

fn id_of(hwnd: HWND) -> WindowId {
    WindowId::from_raw(hwnd.0 as usize as u64)
}

fn rect_of(rc: &RECT) -> Rect {
    Rect::new(rc.left, rc.top, rc.right, rc.bottom)
}

fn win32_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

/// Reads the title bar text of a window, truncated to 255 characters.
fn window_title(hwnd: HWND) -> String {
    let mut buf = [0u16; 256];
    // SAFETY: `buf` is a valid mutable slice for the duration of the call;
    // GetWindowTextW writes at most `buf.len() - 1` characters plus a NUL.
    let len = unsafe { GetWindowTextW(hwnd, &mut buf) };
    String::from_utf16_lossy(&buf[..len.max(0) as usize])
}

/// Builds a [`WindowSnapshot`] for one top-level window.
fn snapshot_of(hwnd: HWND) -> Result<WindowSnapshot, PlatformError> {
    let mut rc = RECT::default();
    // SAFETY: `hwnd` is checked for staleness by the call itself; `rc` is a
    // valid out-pointer.
    unsafe { GetWindowRect(hwnd, &mut rc) }.map_err(|_| PlatformError::WindowGone(id_of(hwnd)))?;

    // SAFETY: Both calls accept any HWND and return a boolean/handle.
    let visible = unsafe { IsWindowVisible(hwnd) }.as_bool();
    let has_owner = unsafe { GetWindow(hwnd, GW_OWNER) }.is_ok();

    Ok(WindowSnapshot {
        id: id_of(hwnd),
        title: window_title(hwnd),
        rect: rect_of(&rc),
        visible,
        has_owner,
    })
}

/// Win32 monitor enumeration callback.
///
/// # Safety
///
/// Called by Win32 inside `EnumDisplayMonitors`. `lparam` must be a valid
/// pointer to `Vec<Monitor>` for the duration of the enumeration call.
unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprc_clip: *mut RECT,
    lparam: LPARAM,
) -> windows::core::BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<Monitor>);

    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };

    // SAFETY: `hmonitor` is a valid handle provided by Win32.
    if GetMonitorInfoW(hmonitor, &mut info).as_bool() {
        monitors.push(Monitor {
            handle: MonitorHandle::from_raw(hmonitor.0 as usize as u64),
            rect: rect_of(&info.rcMonitor),
            is_primary: (info.dwFlags & MONITORINFOF_PRIMARY) != 0,
        });
    }

    windows::core::BOOL(1) // continue enumeration
}

/// Win32 top-level window enumeration callback.
///
/// # Safety
///
/// Called by Win32 inside `EnumWindows`. `lparam` must be a valid pointer to
/// `Vec<WindowSnapshot>` for the duration of the enumeration call.
unsafe extern "system" fn window_enum_proc(hwnd: HWND, lparam: LPARAM) -> windows::core::BOOL {
    let windows_out = &mut *(lparam.0 as *mut Vec<WindowSnapshot>);
    if let Ok(snapshot) = snapshot_of(hwnd) {
        windows_out.push(snapshot);
    }
    windows::core::BOOL(1) // continue enumeration
}

impl WindowSystem for WindowsWindowSystem {
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, PlatformError> {
        let mut monitors: Vec<Monitor> = Vec::new();

        // SAFETY: `lpfn` is a valid function pointer with the correct
        // signature. `lParam` is a raw pointer to `monitors` which outlives
        // this call. The callback is synchronous and called only within
        // `EnumDisplayMonitors`. A null HDC enumerates the whole virtual
        // desktop.
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut monitors as *mut Vec<Monitor> as isize),
            );
        }

        if monitors.is_empty() {
            return Err(PlatformError::MonitorQuery(
                "EnumDisplayMonitors returned no monitors".to_string(),
            ));
        }

        // Primary monitor first; the remainder keep enumeration order.
        monitors.sort_by_key(|m| !m.is_primary);
        Ok(monitors)
    }

    fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>, PlatformError> {
        let mut windows_out: Vec<WindowSnapshot> = Vec::new();

        // SAFETY: Same contract as monitor enumeration. `lParam` points to
        // `windows_out` which outlives the synchronous enumeration.
        unsafe {
            EnumWindows(
                Some(window_enum_proc),
                LPARAM(&mut windows_out as *mut Vec<WindowSnapshot> as isize),
            )
        }
        .map_err(|e| PlatformError::WindowOp(format!("EnumWindows failed: {e}")))?;

        Ok(windows_out)
    }

    fn window_snapshot(&self, id: WindowId) -> Result<WindowSnapshot, PlatformError> {
        snapshot_of(hwnd_of(id))
    }

    fn foreground_window(&self) -> Result<Option<WindowId>, PlatformError> {
        // SAFETY: GetForegroundWindow takes no arguments and may return a
        // null handle when no window has focus (e.g. a secure desktop).
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            Ok(None)
        } else {
            Ok(Some(id_of(hwnd)))
        }
    }

    fn is_maximized(&self, id: WindowId) -> Result<bool, PlatformError> {
        // SAFETY: IsZoomed accepts any HWND and returns FALSE for stale ones.
        Ok(unsafe { IsZoomed(hwnd_of(id)) }.as_bool())
    }

    fn restore_window(&self, id: WindowId) -> Result<(), PlatformError> {
        // SAFETY: ShowWindow accepts any HWND; a stale handle is a no-op.
        unsafe {
            let _ = ShowWindow(hwnd_of(id), SW_RESTORE);
        }
        Ok(())
    }

    fn position_window(&self, id: WindowId, rect: Rect) -> Result<(), PlatformError> {
        // SAFETY: SetWindowPos validates the handle itself and fails for
        // stale windows. NOZORDER/NOACTIVATE keep the correction from
        // stealing focus or reordering the z-stack.
        unsafe {
            SetWindowPos(
                hwnd_of(id),
                None,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|_| PlatformError::WindowGone(id))
    }

    fn position_windows(&self, assignment: &[(WindowId, Rect)]) -> Result<(), PlatformError> {
        if assignment.is_empty() {
            return Ok(());
        }

        // SAFETY: The defer-window-pos triple is the documented batching
        // pattern. Each DeferWindowPos returns a (possibly reallocated)
        // HDWP which must be threaded into the next call; EndDeferWindowPos
        // consumes the final handle and applies all moves atomically.
        unsafe {
            let mut hdwp = BeginDeferWindowPos(assignment.len() as i32)
                .map_err(|e| PlatformError::WindowOp(format!("BeginDeferWindowPos: {e}")))?;

            for (id, rect) in assignment {
                hdwp = DeferWindowPos(
                    hdwp,
                    hwnd_of(*id),
                    None,
                    rect.left,
                    rect.top,
                    rect.width(),
                    rect.height(),
                    SWP_NOZORDER | SWP_NOACTIVATE,
                )
                .map_err(|e| PlatformError::WindowOp(format!("DeferWindowPos: {e}")))?;
            }

            EndDeferWindowPos(hdwp)
                .map_err(|e| PlatformError::WindowOp(format!("EndDeferWindowPos: {e}")))
        }
    }

    fn clip_cursor(&self, rect: Option<Rect>) -> Result<(), PlatformError> {
        match rect {
            Some(r) => {
                let rc = win32_rect(r);
                // SAFETY: `rc` is a valid RECT for the duration of the call;
                // ClipCursor copies it before returning.
                unsafe { ClipCursor(Some(&rc)) }
                    .map_err(|e| PlatformError::CursorClip(e.to_string()))
            }
            // SAFETY: A null pointer releases the clip back to the desktop.
            None => unsafe { ClipCursor(None) }
                .map_err(|e| PlatformError::CursorClip(e.to_string())),
        }
    }

    fn virtual_screen_rect(&self) -> Rect {
        // SAFETY: GetSystemMetrics has no preconditions.
        unsafe {
            let x = GetSystemMetrics(SM_XVIRTUALSCREEN);
            let y = GetSystemMetrics(SM_YVIRTUALSCREEN);
            let w = GetSystemMetrics(SM_CXVIRTUALSCREEN);
            let h = GetSystemMetrics(SM_CYVIRTUALSCREEN);
            Rect::new(x, y, x + w, y + h)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
