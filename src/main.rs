#![windows_subsystem = "windows"]
#![cfg_attr(not(windows), allow(dead_code))]

#[macro_use]
extern crate log;

mod app;
mod error;
mod insomnia;
#[cfg(any(windows, test))]
mod logging;
mod main_window;
mod power;

#[cfg(windows)]
mod icons;
#[cfg(windows)]
mod menu;
#[cfg(windows)]
mod singleton;
#[cfg(windows)]
mod winapi;

#[cfg(windows)]
static LOGGER: logging::FileLogger = logging::FileLogger::new();

/// Records are kept in memory until `open_log_file` runs.
#[cfg(windows)]
fn install_logger() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }
}

/// Creates (and rotates) log files, so only the instance holding the lock may call it.
#[cfg(windows)]
fn open_log_file() {
    let dir = std::env::temp_dir().join("Insomnia");
    if let Err(err) = std::fs::create_dir_all(&dir).and_then(|()| LOGGER.init(&dir)) {
        warn!("Failed to open a log file in {}: {}", dir.display(), err);
    }
}

#[cfg(windows)]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use main_window::MainWindow;
    use power::SystemPower;
    use singleton::Singleton;

    let instance = app::launch(
        Singleton::acquire,
        SystemPower::new(),
        |controller| -> Result<_, Box<dyn std::error::Error>> {
            open_log_file();
            Ok(MainWindow::new(controller)?)
        },
    )?;
    let Some(_instance) = instance else {
        return Ok(());
    };
    winapi::windows_message_loop()?;
    Ok(())
}

#[cfg(windows)]
fn main() {
    use std::panic;
    use winapi::show_error_message_box;

    panic::set_hook(Box::new(|panic_info| {
        error!("{}", panic_info);
        log::logger().flush();
        show_error_message_box(panic_info.to_string().as_str());
    }));
    install_logger();
    info!("Starting Insomnia {}", env!("CARGO_PKG_VERSION"));
    let result = run();
    if let Err(err) = &result {
        error!("{}", err);
    }
    log::logger().flush();
    if let Err(err) = result {
        show_error_message_box(err.to_string().as_str());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    eprintln!("Insomnia only runs on Windows");
    std::process::exit(1);
}
