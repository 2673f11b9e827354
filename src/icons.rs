use crate::winapi::copy_to_wide_buffer;
use windows::core::{Error, Result, PCWSTR};
use windows::Win32::Foundation::{ERROR_INVALID_PARAMETER, HWND};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_SHOWTIP, NIF_TIP, NIIF_ERROR,
    NIIF_WARNING, NIM_ADD, NIM_DELETE, NIM_MODIFY, NIM_SETVERSION, NOTIFYICONDATAW,
    NOTIFYICONDATAW_0, NOTIFYICON_VERSION_4, NOTIFY_ICON_INFOTIP_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    LoadIconW, HICON, IDI_APPLICATION, IDI_INFORMATION, IDI_WARNING, WM_APP,
};

pub const WM_NOTIFY_ICON: u32 = WM_APP + 1;

/// Stock icons shown in the tray.
#[derive(Copy, Clone, PartialEq)]
pub enum IconKind {
    Idle,
    Awake,
    Warning,
}

#[derive(Copy, Clone, PartialEq)]
pub enum BalloonKind {
    Warning,
    Error,
}

fn load_stock_icon(kind: IconKind) -> Result<HICON> {
    let name: PCWSTR = match kind {
        IconKind::Idle => IDI_APPLICATION,
        IconKind::Awake => IDI_INFORMATION,
        IconKind::Warning => IDI_WARNING,
    };
    // SAFETY: Stock icons are shared and must not be destroyed, so no ownership is taken
    unsafe { LoadIconW(None, name) }
}

pub struct NotifyIcon {
    window: HWND,
    id: u32,
    tip: String,
    icon: IconKind,
}

impl NotifyIcon {
    /// # Safety
    ///
    /// Caller must guarantee that the provided window will stay valid
    /// for the entire lifetime of the returned instance.
    pub unsafe fn new(window: HWND, id: u32, tip: &str) -> Result<NotifyIcon> {
        let notify_icon = NotifyIcon {
            window,
            id,
            tip: tip.to_string(),
            icon: IconKind::Idle,
        };
        notify_icon.add()?;
        Ok(notify_icon)
    }

    fn data(&self) -> NOTIFYICONDATAW {
        NOTIFYICONDATAW {
            cbSize: size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: self.window,
            uID: self.id,
            ..Default::default()
        }
    }

    fn add(&self) -> Result<()> {
        let mut notify_icon_data = NOTIFYICONDATAW {
            uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP | NIF_SHOWTIP,
            uCallbackMessage: WM_NOTIFY_ICON,
            Anonymous: NOTIFYICONDATAW_0 {
                uVersion: NOTIFYICON_VERSION_4,
            },
            hIcon: load_stock_icon(self.icon)?,
            ..self.data()
        };
        copy_to_wide_buffer(&mut notify_icon_data.szTip, &self.tip);
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_ADD, &notify_icon_data) }.0 == 0
            || unsafe { Shell_NotifyIconW(NIM_SETVERSION, &notify_icon_data) }.0 == 0
        {
            Err(Error::from(ERROR_INVALID_PARAMETER))
        } else {
            Ok(())
        }
    }

    /// Adds the icon again after the taskbar was recreated (e.g. Explorer restarted).
    pub fn restore(&self) -> Result<()> {
        self.add()
    }

    pub fn update(&mut self, tip: &str, icon: IconKind) {
        if self.tip == tip && self.icon == icon {
            return;
        }
        let mut notify_icon_data = NOTIFYICONDATAW {
            uFlags: NIF_TIP | NIF_ICON | NIF_SHOWTIP,
            ..self.data()
        };
        match load_stock_icon(icon) {
            Ok(hicon) => notify_icon_data.hIcon = hicon,
            Err(err) => {
                warn!("Failed to load tray icon: {}", err);
                notify_icon_data.uFlags = NIF_TIP | NIF_SHOWTIP;
            }
        }
        copy_to_wide_buffer(&mut notify_icon_data.szTip, tip);
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_MODIFY, &notify_icon_data) }.0 == 0 {
            // The taskbar may be gone for a moment, `restore` will bring the new state back
            warn!("Shell_NotifyIconW(NIM_MODIFY) failed");
        }
        self.tip = tip.to_string();
        self.icon = icon;
    }

    /// Shows a transient balloon (a toast on Windows 10 and later) next to the icon.
    pub fn show_balloon(&self, title: &str, text: &str, kind: BalloonKind) {
        let flags: NOTIFY_ICON_INFOTIP_FLAGS = match kind {
            BalloonKind::Warning => NIIF_WARNING,
            BalloonKind::Error => NIIF_ERROR,
        };
        let mut notify_icon_data = NOTIFYICONDATAW {
            uFlags: NIF_INFO,
            dwInfoFlags: flags,
            ..self.data()
        };
        copy_to_wide_buffer(&mut notify_icon_data.szInfoTitle, title);
        copy_to_wide_buffer(&mut notify_icon_data.szInfo, text);
        // SAFETY: Notify icon data is a local structure
        if unsafe { Shell_NotifyIconW(NIM_MODIFY, &notify_icon_data) }.0 == 0 {
            warn!("Failed to show notification: {}: {}", title, text);
        }
    }
}

impl Drop for NotifyIcon {
    fn drop(&mut self) {
        let notify_icon_data = self.data();
        // SAFETY: Notify icon data is a local structure
        let _ = unsafe { Shell_NotifyIconW(NIM_DELETE, &notify_icon_data) };
    }
}
