#[repr(u32)]
pub enum MenuItem {
    Toggle = 1,
    Exit = 2,
}

#[repr(u32)]
pub enum NotifyIcon {
    Insomnia = 1,
}
