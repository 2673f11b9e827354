use crate::error::{Error, PowerRequest};
use crate::power::{ExecutionFlags, ExecutionState};

/// Logical sleep prevention state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Enabled,
    Disabled,
    /// The last request failed, so the OS registration is unknown.
    Error,
}

/// Sleep prevention toggle.
///
/// The state only becomes `Enabled` or `Disabled` after the underlying call
/// succeeded; any failure leaves it in `Error`.
pub struct Insomnia<P: ExecutionState> {
    power: P,
    state: State,
}

impl<P: ExecutionState> Insomnia<P> {
    /// Wraps `power` without making any calls.
    pub fn new(power: P) -> Self {
        Insomnia {
            power,
            state: State::Disabled,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == State::Enabled
    }

    /// Keeps the system and the display awake.
    pub fn enable(&mut self) -> Result<(), Error> {
        self.request(PowerRequest::Enable)
    }

    /// Returns to the default sleep behavior.
    pub fn disable(&mut self) -> Result<(), Error> {
        self.request(PowerRequest::Disable)
    }

    /// Flips the current state and returns the new one.
    /// Anything but `Enabled` switches to `Enabled`.
    pub fn toggle(&mut self) -> Result<State, Error> {
        if self.is_enabled() {
            self.disable()?;
        } else {
            self.enable()?;
        }
        Ok(self.state)
    }

    /// Clears the registration if it is held. A single attempt is made and
    /// its errors are discarded, the OS clears it anyway once the process is gone.
    pub fn shutdown(&mut self) {
        if !self.is_enabled() {
            return;
        }
        match self.disable() {
            Ok(()) => debug!("Default power state restored"),
            Err(err) => debug!("Ignoring failure during shutdown: {}", err),
        }
    }

    fn request(&mut self, request: PowerRequest) -> Result<(), Error> {
        let flags = match request {
            PowerRequest::Enable => ExecutionFlags::KEEP_AWAKE,
            PowerRequest::Disable => ExecutionFlags::RESTORE,
        };
        match self.power.set(flags) {
            Ok(previous) => {
                debug!("Execution state changed from {:?} to {:?}", previous, flags);
                self.state = match request {
                    PowerRequest::Enable => State::Enabled,
                    PowerRequest::Disable => State::Disabled,
                };
                Ok(())
            }
            Err(code) => {
                self.state = State::Error;
                Err(Error::PowerStateChangeFailed { request, code })
            }
        }
    }
}

impl<P: ExecutionState> Drop for Insomnia<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
pub mod fake {
    use crate::error::ErrorCode;
    use crate::power::{ExecutionFlags, ExecutionState};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Records every request and fails on demand.
    #[derive(Clone, Default)]
    pub struct FakePower {
        pub calls: Rc<RefCell<Vec<ExecutionFlags>>>,
        pub failure: Rc<Cell<Option<u32>>>,
        current: Rc<Cell<ExecutionFlags>>,
    }

    impl FakePower {
        pub fn failing(code: u32) -> Self {
            let power = FakePower::default();
            power.failure.set(Some(code));
            power
        }

        pub fn count(&self, flags: ExecutionFlags) -> usize {
            self.calls.borrow().iter().filter(|f| **f == flags).count()
        }
    }

    impl ExecutionState for FakePower {
        fn set(&mut self, flags: ExecutionFlags) -> Result<ExecutionFlags, ErrorCode> {
            self.calls.borrow_mut().push(flags);
            if let Some(code) = self.failure.get() {
                return Err(ErrorCode(code));
            }
            Ok(self.current.replace(flags))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePower;
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn enable_then_disable() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());

        // Act
        insomnia.enable().unwrap();
        let after_enable = insomnia.is_enabled();
        insomnia.disable().unwrap();

        // Assert
        assert!(after_enable);
        assert!(!insomnia.is_enabled());
        assert_eq!(
            *power.calls.borrow(),
            vec![ExecutionFlags::KEEP_AWAKE, ExecutionFlags::RESTORE]
        );
    }

    #[test]
    fn failed_enable_is_error() {
        // Arrange
        let mut insomnia = Insomnia::new(FakePower::failing(8));

        // Act
        let result = insomnia.enable();

        // Assert
        assert_eq!(
            result,
            Err(Error::PowerStateChangeFailed {
                request: PowerRequest::Enable,
                code: ErrorCode(8),
            })
        );
        assert_eq!(insomnia.state(), State::Error);
        assert!(!insomnia.is_enabled());
    }

    #[test]
    fn failed_disable_is_error() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();
        power.failure.set(Some(5));

        // Act
        let result = insomnia.toggle();

        // Assert
        assert!(matches!(
            result,
            Err(Error::PowerStateChangeFailed {
                request: PowerRequest::Disable,
                ..
            })
        ));
        assert_eq!(insomnia.state(), State::Error);
    }

    #[test]
    fn toggle_negates() {
        let mut insomnia = Insomnia::new(FakePower::default());
        assert_eq!(insomnia.toggle(), Ok(State::Enabled));
        assert_eq!(insomnia.toggle(), Ok(State::Disabled));
        assert_eq!(insomnia.toggle(), Ok(State::Enabled));
    }

    #[test]
    fn shutdown_restores_once() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();

        // Act
        insomnia.shutdown();
        insomnia.shutdown();
        drop(insomnia);

        // Assert
        assert_eq!(power.count(ExecutionFlags::RESTORE), 1);
    }

    #[test]
    fn shutdown_when_disabled_is_silent() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();
        insomnia.disable().unwrap();

        // Act
        drop(insomnia);

        // Assert
        assert_eq!(power.count(ExecutionFlags::RESTORE), 1);
    }

    #[test]
    fn shutdown_failure_is_discarded() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();
        power.failure.set(Some(1));

        // Act
        insomnia.shutdown();
        insomnia.shutdown();
        drop(insomnia);

        // Assert
        assert_eq!(power.count(ExecutionFlags::RESTORE), 1);
    }

    #[test]
    fn toggle_from_error_enables() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();
        power.failure.set(Some(5));
        assert!(insomnia.toggle().is_err());
        power.failure.set(None);

        // Act
        let state = insomnia.toggle();

        // Assert
        assert_eq!(state, Ok(State::Enabled));
        assert_eq!(power.count(ExecutionFlags::KEEP_AWAKE), 2);
    }

    #[test]
    fn shutdown_from_error_makes_no_calls() {
        // Arrange
        let power = FakePower::default();
        let mut insomnia = Insomnia::new(power.clone());
        insomnia.enable().unwrap();
        power.failure.set(Some(5));
        assert!(insomnia.disable().is_err());
        let before = power.calls.borrow().len();

        // Act
        insomnia.shutdown();
        drop(insomnia);

        // Assert
        assert_eq!(power.calls.borrow().len(), before);
    }
}
