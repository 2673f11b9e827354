use crate::error::ErrorCode;
use windows::core::{w, Error, PCWSTR};
use windows::Win32::Foundation::{GetLastError, BOOL, HINSTANCE, HWND, LRESULT, SYSTEMTIME};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::SystemInformation::GetLocalTime;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MessageBoxW, TranslateMessage, GWLP_USERDATA, MB_ICONERROR,
    MB_OK, MB_SETFOREGROUND, MSG,
};

#[inline]
pub fn get_instance_handle() -> windows::core::Result<HINSTANCE> {
    // SAFETY: lpModuleName is None instead of a raw pointer
    let module_handle = unsafe { GetModuleHandleW(None) }?;
    Ok(module_handle.into())
}

#[inline]
pub fn get_last_error_code() -> ErrorCode {
    // SAFETY: The call has no preconditions
    ErrorCode(unsafe { GetLastError() }.0)
}

#[inline]
pub fn get_local_time() -> SYSTEMTIME {
    // SAFETY: The call has no preconditions
    unsafe { GetLocalTime() }
}

/// Encodes `s` as a null-terminated UTF-16 string.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Copies as much of `s` as fits into `dst`, leaving at least one NUL at the end.
pub fn copy_to_wide_buffer(dst: &mut [u16], s: &str) {
    let src: Vec<u16> = s.encode_utf16().collect();
    let len = dst.len().saturating_sub(1).min(src.len());
    dst[..len].copy_from_slice(&src[..len]);
    dst[len..].fill(0);
}

/// Replaces the `GWLP_USERDATA` slot of `window` and returns the previous value.
///
/// 32-bit Windows has no `SetWindowLongPtrW` export; there a pointer fits the `LONG` slot.
///
/// # Safety
///
/// `window` must belong to the calling thread.
#[inline]
pub unsafe fn set_window_user_data(window: HWND, value: isize) -> isize {
    #[cfg(target_pointer_width = "64")]
    {
        use windows::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW;
        // SAFETY: Guaranteed by the caller
        unsafe { SetWindowLongPtrW(window, GWLP_USERDATA, value) }
    }
    #[cfg(target_pointer_width = "32")]
    {
        use windows::Win32::UI::WindowsAndMessaging::SetWindowLongW;
        // SAFETY: Guaranteed by the caller
        unsafe { SetWindowLongW(window, GWLP_USERDATA, value as i32) as isize }
    }
}

/// Reads the `GWLP_USERDATA` slot of `window`.
///
/// # Safety
///
/// `window` must belong to the calling thread.
#[inline]
pub unsafe fn get_window_user_data(window: HWND) -> isize {
    #[cfg(target_pointer_width = "64")]
    {
        use windows::Win32::UI::WindowsAndMessaging::GetWindowLongPtrW;
        // SAFETY: Guaranteed by the caller
        unsafe { GetWindowLongPtrW(window, GWLP_USERDATA) }
    }
    #[cfg(target_pointer_width = "32")]
    {
        use windows::Win32::UI::WindowsAndMessaging::GetWindowLongW;
        // SAFETY: Guaranteed by the caller
        unsafe { GetWindowLongW(window, GWLP_USERDATA) as isize }
    }
}

#[inline]
fn unwrap_winapi_bool(bool: BOOL) -> windows::core::Result<bool> {
    match bool.0 {
        1.. => Ok(true),
        0 => Ok(false),
        _ => Err(Error::from_win32()),
    }
}

#[inline]
pub fn get_message(msg: &mut MSG) -> windows::core::Result<bool> {
    // SAFETY: msg is a valid pointer
    let result = unsafe { GetMessageW(msg, None, 0, 0) };
    unwrap_winapi_bool(result)
}

#[inline]
pub fn translate_message(msg: &MSG) -> bool {
    // SAFETY: msg is a valid pointer
    unsafe { TranslateMessage(msg) }.as_bool()
}

#[inline]
pub fn dispatch_message(msg: &MSG) -> LRESULT {
    // SAFETY: msg is a valid pointer
    unsafe { DispatchMessageW(msg) }
}

/// Pumps messages of the current thread until `WM_QUIT`.
pub fn windows_message_loop() -> windows::core::Result<()> {
    let mut msg = MSG::default();
    while get_message(&mut msg)? {
        translate_message(&msg);
        dispatch_message(&msg);
    }
    Ok(())
}

/// Shows a blocking error dialog, usable before (or without) any window.
pub fn show_error_message_box(text: &str) {
    let text = to_wide(text);
    // SAFETY: Both strings are null-terminated and outlive the call
    unsafe {
        MessageBoxW(
            None,
            PCWSTR(text.as_ptr()),
            w!("Insomnia"),
            MB_OK | MB_ICONERROR | MB_SETFOREGROUND,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_buffer_is_truncated() {
        let mut buf = [0xFFFFu16; 4];
        copy_to_wide_buffer(&mut buf, "Insomnia");
        assert_eq!(buf, [b'I' as u16, b'n' as u16, b's' as u16, 0]);
    }

    #[test]
    fn wide_buffer_is_cleared() {
        let mut buf = [0xFFFFu16; 4];
        copy_to_wide_buffer(&mut buf, "ab");
        assert_eq!(buf, [b'a' as u16, b'b' as u16, 0, 0]);
    }

    #[test]
    fn user_data_round_trip() {
        use windows::Win32::UI::WindowsAndMessaging::{
            CreateWindowExW, DestroyWindow, WINDOW_EX_STYLE, WINDOW_STYLE,
        };

        // Arrange
        let value = Box::into_raw(Box::new(0x5EEDu32));
        // SAFETY: STATIC is a predefined class, the window is never shown
        let window = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                w!("STATIC"),
                w!("Insomnia"),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                None,
                None,
                get_instance_handle().expect("Failed to get the instance handle"),
                None,
            )
        }
        .expect("Failed to create a window");

        // Act
        // SAFETY: The window was created on this thread
        let (initial, stored, taken, after) = unsafe {
            let initial = set_window_user_data(window, value as isize);
            let stored = get_window_user_data(window);
            let taken = set_window_user_data(window, 0);
            (initial, stored, taken, get_window_user_data(window))
        };

        // Assert
        assert_eq!(initial, 0);
        assert_eq!(stored, value as isize);
        assert_eq!(taken, value as isize);
        assert_eq!(after, 0);
        // SAFETY: The pointer came from Box::into_raw above
        assert_eq!(*unsafe { Box::from_raw(taken as *mut u32) }, 0x5EED);
        // SAFETY: The window was created above
        unsafe { DestroyWindow(window) }.expect("Failed to destroy the window");
    }
}
