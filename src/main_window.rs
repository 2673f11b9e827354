mod commands;
mod controller;
mod model;

#[cfg(windows)]
mod id;
#[cfg(windows)]
mod view;
#[cfg(windows)]
mod window;

pub use controller::Controller;

#[cfg(test)]
pub use model::Status;
#[cfg(windows)]
pub use window::MainWindow;
