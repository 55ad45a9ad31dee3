use log::{debug, warn};
use spin::Once;

use crate::consts::MAX_HARTS;
use crate::cpu::Cpu;
use crate::csr::CsrFile;
use crate::error::{IntcError, IntcResult};

/// Per-hart CPU records, indexed by hart id. Each slot is written once, by
/// the hart it belongs to, and never freed.
pub struct HartRegistry<C: CsrFile> {
    cpus: [Once<Cpu<C>>; MAX_HARTS],
}

impl<C: CsrFile> HartRegistry<C> {
    pub const fn new() -> Self {
        Self {
            cpus: [const { Once::new() }; MAX_HARTS],
        }
    }

    pub fn register(&self, cpu: Cpu<C>) -> IntcResult<&Cpu<C>> {
        let hartid = cpu.hartid();
        let slot = self.cpus.get(hartid).ok_or(IntcError::InvalidHart)?;
        let mut stored = false;
        let cpu = slot.call_once(|| {
            stored = true;
            cpu
        });
        if !stored {
            return Err(IntcError::HartBusy);
        }
        debug!("cpu record registered for hart {}", hartid);
        Ok(cpu)
    }

    pub fn get(&self, hartid: usize) -> Option<&Cpu<C>> {
        self.cpus.get(hartid).and_then(Once::get)
    }

    /// Routes the current trap of `hartid` to its CPU record. Traps taken
    /// before the hart registered one are dropped.
    pub fn handle_trap(&self, hartid: usize) {
        match self.get(hartid) {
            Some(cpu) => cpu.handle_trap(),
            None => warn!("trap on hart {} dropped: no cpu record", hartid),
        }
    }
}

impl<C: CsrFile> Default for HartRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
