use crate::error::Error;
use crate::winapi::get_last_error_code;
use windows::core::{w, Owned, PCWSTR};
use windows::Win32::Foundation::{ERROR_ALREADY_EXISTS, HANDLE};
use windows::Win32::System::Threading::{CreateMutexW, ReleaseMutex};

const MUTEX_NAME: PCWSTR = w!("Global\\InsomniaSingletonMutex");

/// Ownership of the named mutex that keeps a second copy of the app from starting.
///
/// Dropping it releases the mutex; if the process dies first, the OS does.
pub struct Singleton {
    handle: Owned<HANDLE>,
}

impl Singleton {
    pub fn acquire() -> Result<Self, Error> {
        Self::acquire_named(MUTEX_NAME)
    }

    fn acquire_named(name: PCWSTR) -> Result<Self, Error> {
        // SAFETY: The name is a null-terminated constant, default security attributes are used
        let handle = unsafe { CreateMutexW(None, true, name) }
            .map_err(|_| Error::LockUnavailable(get_last_error_code()))?;
        // Must be read before anything else touches the last error
        let already_exists = get_last_error_code().0 == ERROR_ALREADY_EXISTS.0;
        // SAFETY: We own the returned handle
        let handle = unsafe { Owned::new(handle) };
        if already_exists {
            // Dropping the handle closes it; ownership was never granted
            return Err(Error::AlreadyRunning);
        }
        debug!("Acquired the single instance lock");
        Ok(Singleton { handle })
    }
}

impl Drop for Singleton {
    fn drop(&mut self) {
        // SAFETY: The handle is valid and owned by the current thread since creation
        if let Err(err) = unsafe { ReleaseMutex(*self.handle) } {
            error!("Failed to release the single instance lock: {}", err);
        }
        // `Owned` closes the handle afterwards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused() {
        // Arrange
        let name = w!("Local\\InsomniaUnitTests-SecondAcquire");
        let first = Singleton::acquire_named(name).expect("Failed to acquire");

        // Act
        let second = Singleton::acquire_named(name);

        // Assert
        assert!(matches!(second, Err(Error::AlreadyRunning)));
        drop(first);
    }

    #[test]
    fn released_on_drop() {
        // Arrange
        let name = w!("Local\\InsomniaUnitTests-ReleasedOnDrop");
        drop(Singleton::acquire_named(name).expect("Failed to acquire"));

        // Act
        let again = Singleton::acquire_named(name);

        // Assert
        assert!(again.is_ok());
    }
}
