use crate::winapi::to_wide;
use windows::core::{Owned, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, PostMessageW, SetForegroundWindow, SetMenuDefaultItem,
    TrackPopupMenu, HMENU, MF_ENABLED, MF_SEPARATOR, MF_STRING, TPM_BOTTOMALIGN, TPM_NONOTIFY,
    TPM_RETURNCMD, TPM_RIGHTBUTTON, WM_NULL,
};

pub struct PopupMenu {
    handle: Owned<HMENU>,
}

impl PopupMenu {
    /// Constructs a new popup menu.
    pub fn new() -> Self {
        // SAFETY: The call is always sound, we don't expect it to fail
        let handle = unsafe { Owned::new(CreatePopupMenu().unwrap()) };
        PopupMenu { handle }
    }

    /// Appends a separator to the menu.
    pub fn append_separator(&mut self) {
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        unsafe { AppendMenuW(*self.handle, MF_SEPARATOR, 0, None).unwrap() };
    }

    /// Appends a menu item to the menu.
    pub fn append_menu_item(&mut self, title: &str, id: u32) {
        let buf = to_wide(title);
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        unsafe {
            AppendMenuW(
                *self.handle,
                MF_ENABLED | MF_STRING,
                id as usize,
                PCWSTR(buf.as_ptr()),
            )
            .unwrap()
        };
    }

    /// Renders the item in bold, marking it as the one a double click would pick.
    pub fn set_default_item(&mut self, id: u32) {
        // SAFETY: Menu handle is owned by `self` and stays valid until drop
        if let Err(err) = unsafe { SetMenuDefaultItem(*self.handle, id, 0) } {
            warn!("Failed to set default menu item {}: {}", id, err);
        }
    }

    /// Shows the popup menu at the given coordinates and returns the id of the chosen item.
    ///
    /// # Notes
    ///
    /// The call does not return until the menu is dismissed,
    /// i.e. it starts a nested Windows event loop and could unintentionally result in recursion.
    /// No `WM_COMMAND` is sent, the caller handles the returned id itself.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that the handle will stay valid for the duration of the call.
    pub unsafe fn show(&self, x: i32, y: i32, window: HWND) -> Option<u32> {
        // We set foreground window to ensure the menu will be dismissed on focus lost.
        // SAFETY: The call is sound with a valid handle (guaranteed by the caller).
        // The call is expected to fail in some cases (e.g. another menu is already displayed).
        _ = unsafe { SetForegroundWindow(window) };
        let flags = TPM_RIGHTBUTTON | TPM_BOTTOMALIGN | TPM_RETURNCMD | TPM_NONOTIFY;
        // SAFETY: The call is sound with valid handles.
        let selected = unsafe { TrackPopupMenu(*self.handle, flags, x, y, 0, window, None) }.0;
        // Forces a task switch so the next click on the tray opens the menu again
        // SAFETY: The handle is valid (guaranteed by the caller)
        _ = unsafe { PostMessageW(window, WM_NULL, WPARAM(0), LPARAM(0)) };
        match selected {
            0 => None,
            id => Some(id as u32),
        }
    }
}
