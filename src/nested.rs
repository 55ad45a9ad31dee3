use axerrno::{AxError, AxResult};

/// Commands understood by a nested timer / software-interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntcCommand {
    /// Read the free-running `mtime` counter.
    MtimeGet,
    /// Raise the software interrupt of a hart.
    IpiSet(usize),
    /// Acknowledge the software interrupt of a hart.
    IpiClear(usize),
    /// Read a hart's `msip` bit; non-zero means pending.
    MsipGet(usize),
}

/// A controller nested under a CPU-local interrupt line, such as a CLINT
/// behind the timer and software lines.
///
/// Instances are built and owned by board code. They are reached from every
/// hart, so implementations synchronize internally.
pub trait NestedIntc: Sync {
    fn command_request(&self, cmd: IntcCommand) -> AxResult<u64>;

    fn mtimecmp_set(&self, hartid: usize, deadline: u64) -> AxResult;

    /// Handles a software interrupt taken on `hartid` that has no explicit
    /// handler registered.
    fn software_dispatch(&self, hartid: usize, id: usize, context: usize) -> AxResult {
        let _ = (hartid, id, context);
        Err(AxError::Unsupported)
    }
}
