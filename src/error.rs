use core::fmt;

use axerrno::AxError;

/// Errors returned by the CPU interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntcError {
    /// The interrupt ordinal is not one this controller recognizes.
    InvalidId,
    /// The exception code is at or beyond `MAX_EXCEPTION_CODE`.
    InvalidExceptionCode,
    /// The vector mode is not accepted by this operation.
    InvalidMode,
    /// The hart id is beyond `MAX_HARTS`.
    InvalidHart,
    /// A CPU record is already registered for the hart.
    HartBusy,
    /// The trap entry does not satisfy `TRAP_ENTRY_ALIGN`.
    MisalignedTrapEntry,
    /// No nested controller is wired into the slot.
    DelegateAbsent,
    /// The nested controller rejected the command.
    Delegate(AxError),
}

pub type IntcResult<T = ()> = Result<T, IntcError>;

impl fmt::Display for IntcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "invalid interrupt id"),
            Self::InvalidExceptionCode => write!(f, "invalid exception code"),
            Self::InvalidMode => write!(f, "unsupported vector mode"),
            Self::InvalidHart => write!(f, "hart id out of range"),
            Self::HartBusy => write!(f, "hart already has a cpu record"),
            Self::MisalignedTrapEntry => write!(f, "misaligned trap entry"),
            Self::DelegateAbsent => write!(f, "no nested controller wired"),
            Self::Delegate(e) => write!(f, "nested controller error: {e:?}"),
        }
    }
}

impl From<AxError> for IntcError {
    fn from(e: AxError) -> Self {
        Self::Delegate(e)
    }
}

impl From<IntcError> for AxError {
    fn from(e: IntcError) -> Self {
        match e {
            IntcError::InvalidId
            | IntcError::InvalidExceptionCode
            | IntcError::InvalidMode
            | IntcError::InvalidHart => AxError::InvalidInput,
            IntcError::HartBusy => AxError::AlreadyExists,
            IntcError::MisalignedTrapEntry => AxError::BadAddress,
            IntcError::DelegateAbsent => AxError::NotFound,
            IntcError::Delegate(e) => e,
        }
    }
}
