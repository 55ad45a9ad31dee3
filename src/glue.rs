//! Timer and inter-processor interrupt operations, forwarded to whichever
//! nested controller is wired behind the timer and software slots.

use log::{trace, warn};

use crate::consts::DEFAULT_TIMER_DELTA;
use crate::cpu::Cpu;
use crate::csr::CsrFile;
use crate::error::{IntcError, IntcResult};
use crate::nested::IntcCommand;

impl<C: CsrFile> Cpu<C> {
    /// Current `mtime`, or 0 when no timer controller is wired.
    pub fn mtime_get(&self) -> u64 {
        self.timer_controller()
            .and_then(|tmr| tmr.command_request(IntcCommand::MtimeGet).ok())
            .unwrap_or(0)
    }

    /// Programs the timer compare register of the hart this record belongs
    /// to. Other harts' deadlines are set through their own records.
    pub fn mtimecmp_set(&self, deadline: u64) -> IntcResult {
        let tmr = self.timer_controller().ok_or(IntcError::DelegateAbsent)?;
        trace!("hart {} mtimecmp <- {}", self.hartid(), deadline);
        tmr.mtimecmp_set(self.hartid(), deadline)?;
        Ok(())
    }

    pub fn ipi_set(&self, hartid: usize) -> IntcResult {
        self.sw_command(IntcCommand::IpiSet(hartid)).map(|_| ())
    }

    pub fn ipi_clear(&self, hartid: usize) -> IntcResult {
        self.sw_command(IntcCommand::IpiClear(hartid)).map(|_| ())
    }

    /// Whether `hartid` has a software interrupt pending. False when no
    /// software controller is wired.
    pub fn ipi_pending(&self, hartid: usize) -> bool {
        self.sw_command(IntcCommand::MsipGet(hartid))
            .is_ok_and(|msip| msip != 0)
    }

    fn sw_command(&self, cmd: IntcCommand) -> IntcResult<u64> {
        let sw = self.sw_controller().ok_or(IntcError::DelegateAbsent)?;
        Ok(sw.command_request(cmd)?)
    }

    /// Built-in timer handler: pushes the deadline a few ticks ahead so an
    /// enabled timer line makes progress.
    pub(crate) fn default_timer_tick(&self) {
        let now = self.mtime_get();
        if let Err(e) = self.mtimecmp_set(now.wrapping_add(DEFAULT_TIMER_DELTA)) {
            warn!("hart {}: default timer re-arm failed: {}", self.hartid(), e);
        }
    }

    /// Built-in software handler: forwards to the software slot's delegate.
    pub(crate) fn default_software(&self, id: usize, context: usize) -> IntcResult {
        let sw = self.sw_controller().ok_or(IntcError::DelegateAbsent)?;
        sw.software_dispatch(self.hartid(), id, context)?;
        Ok(())
    }
}
