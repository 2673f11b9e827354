use super::commands::Command;
use super::id;
use super::model::{Model, Severity, Status};
use crate::icons::{BalloonKind, IconKind, NotifyIcon};
use crate::menu::PopupMenu;
use std::mem::replace;
use windows::core::Result;
use windows::Win32::Foundation::HWND;

fn icon_for_status(status: Status) -> IconKind {
    match status {
        Status::Initializing | Status::Inactive => IconKind::Idle,
        Status::Active => IconKind::Awake,
        Status::Error => IconKind::Warning,
    }
}

/// View owns the UI components and renders model in the window.
pub struct View {
    window: HWND,
    model: Model,
    icon: NotifyIcon,
    popup_menu: Option<PopupMenu>,
}

impl View {
    /// # Safety
    ///
    /// The window handle should stay valid for the entire lifetime of the returned instance.
    pub unsafe fn new(window: HWND) -> Result<Self> {
        let model = Model::default();
        // SAFETY: Window handle's validity is guaranteed by the caller
        let icon =
            unsafe { NotifyIcon::new(window, id::NotifyIcon::Insomnia as _, &model.tooltip()) }?;
        Ok(View {
            window,
            model,
            icon,
            popup_menu: None,
        })
    }

    /// Updates UI according to the provided model.
    pub fn update(&mut self, new_model: &Model) {
        let old_model = replace(&mut self.model, new_model.clone());
        if old_model.status != new_model.status {
            self.icon
                .update(&new_model.tooltip(), icon_for_status(new_model.status));
        }
        if old_model.toggle_label != new_model.toggle_label || self.popup_menu.is_none() {
            self.build_menu();
        }
        if old_model.notification != new_model.notification {
            if let Some(notification) = &new_model.notification {
                let kind = match notification.severity {
                    Severity::Warning => BalloonKind::Warning,
                    Severity::Error => BalloonKind::Error,
                };
                self.icon
                    .show_balloon(&notification.title, &notification.body, kind);
            }
        }
    }

    // TODO: Update the toggle item in place instead of building a new menu
    fn build_menu(&mut self) {
        let mut menu = PopupMenu::new();
        menu.append_menu_item(self.model.toggle_label, id::MenuItem::Toggle as _);
        menu.set_default_item(id::MenuItem::Toggle as _);
        menu.append_separator();
        menu.append_menu_item("E&xit", id::MenuItem::Exit as _);
        self.popup_menu = Some(menu);
    }

    /// Brings the tray icon back after Explorer restarted.
    pub fn restore(&mut self) {
        match self.icon.restore() {
            Ok(()) => info!("Tray icon restored"),
            Err(err) => error!("Failed to restore the tray icon: {}", err),
        }
    }

    /// Shows the context menu and returns the command the user picked, if any.
    pub fn show_menu(&self, x: i32, y: i32) -> Option<Command> {
        let menu = self.popup_menu.as_ref()?;
        // SAFETY: The handle points to a currently live window
        let id = unsafe { menu.show(x, y, self.window) }?;
        Self::get_command_for_menu_item(id)
    }

    pub fn get_command_for_menu_item(id: u32) -> Option<Command> {
        if id == id::MenuItem::Toggle as u32 {
            Some(Command::Toggle)
        } else if id == id::MenuItem::Exit as u32 {
            Some(Command::Exit)
        } else {
            None
        }
    }
}
