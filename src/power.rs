use crate::error::ErrorCode;
use std::fmt::{Debug, Formatter};
use std::ops::BitOr;

/// Execution state bits understood by the power manager.
///
/// Values match the Win32 `ES_*` constants.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct ExecutionFlags(u32);

impl ExecutionFlags {
    pub const CONTINUOUS: Self = Self(0x8000_0000);
    pub const SYSTEM_REQUIRED: Self = Self(0x0000_0001);
    pub const DISPLAY_REQUIRED: Self = Self(0x0000_0002);

    /// Keeps both the system and the display on until cleared.
    pub const KEEP_AWAKE: Self =
        Self(Self::CONTINUOUS.0 | Self::SYSTEM_REQUIRED.0 | Self::DISPLAY_REQUIRED.0);
    /// Clears a previous continuous registration.
    pub const RESTORE: Self = Self::CONTINUOUS;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ExecutionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Debug for ExecutionFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = vec![];
        if self.contains(Self::CONTINUOUS) {
            names.push("CONTINUOUS");
        }
        if self.contains(Self::SYSTEM_REQUIRED) {
            names.push("SYSTEM_REQUIRED");
        }
        if self.contains(Self::DISPLAY_REQUIRED) {
            names.push("DISPLAY_REQUIRED");
        }
        if names.is_empty() {
            write!(f, "0x{:08X}", self.0)
        } else {
            write!(f, "{}", names.join(" | "))
        }
    }
}

/// The single OS call that registers or clears continuous activity for this process.
pub trait ExecutionState {
    /// Applies `flags` and returns the previous state,
    /// or the platform error code when the OS rejects the request.
    fn set(&mut self, flags: ExecutionFlags) -> Result<ExecutionFlags, ErrorCode>;
}

/// Execution state of the calling thread, backed by `SetThreadExecutionState`.
///
/// The OS drops the registration when the process terminates, cleanly or not.
/// Crash safety relies on that; it cannot be verified from inside the process.
#[cfg(windows)]
pub struct SystemPower {
    // The registration belongs to the calling thread, so this must not leave it
    _marker: std::marker::PhantomData<*const ()>,
}

#[cfg(windows)]
impl SystemPower {
    pub fn new() -> Self {
        SystemPower {
            _marker: std::marker::PhantomData,
        }
    }
}

#[cfg(windows)]
impl ExecutionState for SystemPower {
    fn set(&mut self, flags: ExecutionFlags) -> Result<ExecutionFlags, ErrorCode> {
        use crate::winapi::get_last_error_code;
        use windows::Win32::System::Power::{SetThreadExecutionState, EXECUTION_STATE};

        // SAFETY: The call has no preconditions
        let previous = unsafe { SetThreadExecutionState(EXECUTION_STATE(flags.bits())) };
        if previous == EXECUTION_STATE(0) {
            return Err(get_last_error_code().or_gen_failure());
        }
        Ok(ExecutionFlags::from_bits(previous.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_awake_bits() {
        assert_eq!(ExecutionFlags::KEEP_AWAKE.bits(), 0x8000_0003);
        assert!(ExecutionFlags::KEEP_AWAKE.contains(ExecutionFlags::DISPLAY_REQUIRED));
        assert!(!ExecutionFlags::RESTORE.contains(ExecutionFlags::SYSTEM_REQUIRED));
    }

    #[test]
    fn debug_lists_flag_names() {
        let flags = ExecutionFlags::CONTINUOUS | ExecutionFlags::SYSTEM_REQUIRED;
        assert_eq!(format!("{:?}", flags), "CONTINUOUS | SYSTEM_REQUIRED");
        assert_eq!(format!("{:?}", ExecutionFlags::default()), "0x00000000");
    }

    #[cfg(windows)]
    #[test]
    fn system_power_round_trip() {
        let mut power = SystemPower::new();
        power
            .set(ExecutionFlags::KEEP_AWAKE)
            .expect("Failed to keep the system awake");
        let previous = power
            .set(ExecutionFlags::RESTORE)
            .expect("Failed to restore the execution state");
        assert!(previous.contains(ExecutionFlags::KEEP_AWAKE));
    }
}
