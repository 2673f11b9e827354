use crate::error::Error;
use crate::main_window::Controller;
use crate::power::ExecutionState;

/// A running instance.
///
/// Fields drop in declaration order: the UI (and the controller inside it,
/// which restores the default power state) goes away before the guard is released.
pub struct Instance<G, U> {
    pub ui: U,
    _guard: G,
}

/// Starts the application if no other instance is running.
///
/// Returns `Ok(None)` when the guard reports [`Error::AlreadyRunning`];
/// in that case `power` is dropped untouched and `build_ui` is never called.
pub fn launch<G, P, U, E>(
    acquire: impl FnOnce() -> Result<G, Error>,
    power: P,
    build_ui: impl FnOnce(Controller<P>) -> Result<U, E>,
) -> Result<Option<Instance<G, U>>, E>
where
    P: ExecutionState,
    E: From<Error>,
{
    let guard = match acquire() {
        Ok(guard) => guard,
        Err(Error::AlreadyRunning) => {
            info!("Another instance is already running, exiting");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let controller = Controller::new(power);
    let ui = build_ui(controller)?;
    Ok(Some(Instance { ui, _guard: guard }))
}
