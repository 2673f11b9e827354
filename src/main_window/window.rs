use super::commands::Command;
use super::controller::Controller;
use super::view::View;
use crate::icons::WM_NOTIFY_ICON;
use crate::power::SystemPower;
use crate::winapi::{get_instance_handle, get_window_user_data, set_window_user_data};
use std::cell::RefCell;
use std::marker::PhantomData;
use windows::core::{w, Error};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Shell::{NIN_KEYSELECT, NIN_SELECT};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, PostMessageW, PostQuitMessage,
    RegisterClassExW, RegisterWindowMessageW, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE,
    WM_CONTEXTMENU, WM_DESTROY, WNDCLASSEXW,
};

#[inline]
fn loword(value: usize) -> u32 {
    (value & 0xFFFF) as u32
}

/// Signed coordinates packed the way `GET_X_LPARAM`/`GET_Y_LPARAM` expect them.
#[inline]
fn unpack_point(value: usize) -> (i32, i32) {
    let x = (value & 0xFFFF) as u16 as i16 as i32;
    let y = ((value >> 16) & 0xFFFF) as u16 as i16 as i32;
    (x, y)
}

/// Everything the window procedure works with, reachable through `GWLP_USERDATA`.
///
/// Menus run a nested message loop, so the procedure may re-enter while a borrow is held.
struct State {
    controller: RefCell<Controller<SystemPower>>,
    view: RefCell<View>,
    taskbar_created: u32,
}

impl State {
    fn on_notify_icon(&self, window: HWND, w_param: WPARAM, l_param: LPARAM) {
        let event = loword(l_param.0 as usize);
        if event != NIN_SELECT && event != NIN_KEYSELECT && event != WM_CONTEXTMENU {
            return;
        }
        let (x, y) = unpack_point(w_param.0);
        let command = match self.view.try_borrow() {
            Ok(view) => view.show_menu(x, y),
            Err(_) => {
                debug!("Ignoring tray click while the view is busy");
                return;
            }
        };
        if let Some(command) = command {
            self.on_command(window, command);
        }
    }

    fn on_command(&self, window: HWND, command: Command) {
        let (Ok(mut controller), Ok(mut view)) =
            (self.controller.try_borrow_mut(), self.view.try_borrow_mut())
        else {
            warn!("Dropping re-entrant command {:?}", command);
            return;
        };
        debug!("Command: {:?}", command);
        let keep_running = controller.on_command(command);
        view.update(controller.get_model());
        if !keep_running {
            // Destroying the window right here would free `self` under our feet
            // SAFETY: The window is alive, it is the one being processed
            if let Err(err) = unsafe { PostMessageW(window, WM_CLOSE, WPARAM(0), LPARAM(0)) } {
                error!("Failed to close the main window: {}", err);
            }
        }
    }

    fn on_taskbar_created(&self) {
        match self.view.try_borrow_mut() {
            Ok(mut view) => view.restore(),
            Err(_) => warn!("Cannot restore the tray icon while the view is busy"),
        }
    }
}

/// Hidden window that owns the tray icon and receives its callbacks.
pub struct MainWindow {
    handle: HWND,
    // This marks MainWindow as !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl MainWindow {
    pub fn new(controller: Controller<SystemPower>) -> Result<MainWindow, Error> {
        let window_class_name = w!("InsomniaMainWindow");
        let instance = get_instance_handle()?;
        let wnd_class_params = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(Self::process_message),
            hInstance: instance,
            lpszClassName: window_class_name,
            ..Default::default()
        };
        // SAFETY: The structure is fully initialized and the class name is a static string
        let window_class_atom = unsafe { RegisterClassExW(&wnd_class_params) };
        if window_class_atom == 0 {
            return Err(Error::from_win32());
        }
        // SAFETY: The class was registered above, the window is never shown
        let handle = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                window_class_name,
                w!("Insomnia"),
                WINDOW_STYLE::default(),
                0,
                0,
                0,
                0,
                None,
                None,
                instance,
                None,
            )
        }?;
        // From here on, `Drop` takes care of the window
        let window = MainWindow {
            handle,
            _marker: PhantomData,
        };
        // SAFETY: The view lives in the window's state, which is freed before the window is gone
        let mut view = unsafe { View::new(handle) }?;
        view.update(controller.get_model());
        // SAFETY: The string is a null-terminated constant
        let taskbar_created = unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) };
        if taskbar_created == 0 {
            warn!("Failed to register TaskbarCreated: {}", Error::from_win32());
        }
        let state = Box::new(State {
            controller: RefCell::new(controller),
            view: RefCell::new(view),
            taskbar_created,
        });
        // SAFETY: The pointer is reclaimed exactly once, on WM_DESTROY
        unsafe { set_window_user_data(handle, Box::into_raw(state) as isize) };
        Ok(window)
    }

    /// Takes the state out of the window, leaving nothing behind for later messages.
    ///
    /// # Safety
    ///
    /// Must be called from the window procedure of `window`.
    unsafe fn take_state(window: HWND) -> Option<Box<State>> {
        // SAFETY: Guaranteed by the caller
        let ptr = unsafe { set_window_user_data(window, 0) } as *mut State;
        // SAFETY: A non-null pointer was produced by `Box::into_raw` in `new`
        (!ptr.is_null()).then(|| unsafe { Box::from_raw(ptr) })
    }

    extern "system" fn process_message(
        window: HWND,
        message: u32,
        w_param: WPARAM,
        l_param: LPARAM,
    ) -> LRESULT {
        if message == WM_DESTROY {
            // SAFETY: We are in the window procedure of `window`
            // Restores the power state and removes the tray icon while the window still exists
            drop(unsafe { Self::take_state(window) });
            // SAFETY: This is a typical response to WM_DESTROY message
            unsafe { PostQuitMessage(0) }
            return LRESULT(0);
        }
        // SAFETY: The pointer is either null or points to the state installed by `new`,
        //   which lives until WM_DESTROY
        let state = unsafe { (get_window_user_data(window) as *const State).as_ref() };
        match state {
            Some(state) if message == WM_NOTIFY_ICON => {
                state.on_notify_icon(window, w_param, l_param);
                LRESULT(0)
            }
            Some(state) if state.taskbar_created != 0 && message == state.taskbar_created => {
                state.on_taskbar_created();
                LRESULT(0)
            }
            _ =>
            // SAFETY: We are in the context of message processor, validity of arguments is guaranteed by the caller (OS)
            unsafe { DefWindowProcW(window, message, w_param, l_param) },
        }
    }
}

impl Drop for MainWindow {
    fn drop(&mut self) {
        // SAFETY: The handle was created by us; if the window is already gone the call just fails
        unsafe {
            let _ = DestroyWindow(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpacks_negative_coordinates() {
        // Secondary monitor to the left of the primary one
        let packed = (((-20i16 as u16) as usize) << 16) | ((-1280i16 as u16) as usize);
        assert_eq!(unpack_point(packed), (-1280, -20));
    }

    #[test]
    fn loword_masks_high_bits() {
        assert_eq!(loword(0x0001_0204), 0x0204);
    }
}
