use log::error;
use memory_addr::{VirtAddr, is_aligned};

use crate::consts::*;
use crate::csr::{Csr, CsrFile};
use crate::error::{IntcError, IntcResult};
use crate::intc::{CpuIntc, ExceptionHandler};
use crate::nested::NestedIntc;

/// Receives the diagnostic code of an unrecoverable trap.
///
/// Whether the machine halts, resets or parks the hart is up to the sink.
pub trait ShutdownSink: Sync {
    fn shutdown(&self, code: u32);
}

/// Board description of one hart.
#[derive(Debug, Clone, Copy)]
pub struct CpuDesc {
    pub hartid: usize,
    /// Timer ticks per second.
    pub timebase: u64,
    /// Address the hardware jumps to on a trap in direct mode.
    pub trap_entry: VirtAddr,
}

/// One hart: its identity, capabilities and interrupt controller.
pub struct Cpu<C: CsrFile> {
    hartid: usize,
    timebase: u64,
    intc: CpuIntc<C>,
    sink: &'static dyn ShutdownSink,
}

impl<C: CsrFile> Cpu<C> {
    pub fn new(desc: CpuDesc, csr: C, sink: &'static dyn ShutdownSink) -> IntcResult<Self> {
        if desc.hartid >= MAX_HARTS {
            return Err(IntcError::InvalidHart);
        }
        if !is_aligned(desc.trap_entry.as_usize(), TRAP_ENTRY_ALIGN) {
            return Err(IntcError::MisalignedTrapEntry);
        }
        Ok(Self {
            hartid: desc.hartid,
            timebase: desc.timebase,
            intc: CpuIntc::new(csr, desc.trap_entry),
            sink,
        })
    }

    pub fn hartid(&self) -> usize {
        self.hartid
    }

    pub fn controller(&self) -> &CpuIntc<C> {
        &self.intc
    }

    pub(crate) fn csr(&self) -> &C {
        self.intc.csr()
    }

    /// Reports `code` to the shutdown sink.
    pub fn shutdown(&self, code: u32) {
        error!("hart {} shutdown with code {}", self.hartid, code);
        self.sink.shutdown(code);
    }

    pub fn mcycle_get(&self) -> u64 {
        if cfg!(target_pointer_width = "32") {
            // 读 hi/lo/hi，hi 变化说明 lo 发生了进位，重读
            loop {
                let hi = self.csr().read(Csr::Mcycleh);
                let lo = self.csr().read(Csr::Mcycle);
                if self.csr().read(Csr::Mcycleh) == hi {
                    return ((hi as u64) << 32) | lo as u64;
                }
            }
        } else {
            self.csr().read(Csr::Mcycle) as u64
        }
    }

    pub fn timebase_get(&self) -> u64 {
        self.timebase
    }

    pub fn exception_pc(&self) -> usize {
        self.csr().read(Csr::Mepc)
    }

    pub fn set_exception_pc(&self, epc: usize) {
        self.csr().write(Csr::Mepc, epc);
    }

    /// Length in bytes of the instruction whose low halfword is `halfword`.
    pub const fn instruction_length(halfword: u16) -> usize {
        if halfword & INSN_LENGTH_MASK == INSN_NOT_COMPRESSED {
            4
        } else {
            2
        }
    }

    /// Length in bytes of the instruction at `epc`.
    ///
    /// # Safety
    ///
    /// `epc` must point to readable instruction memory.
    pub unsafe fn instruction_length_at(&self, epc: VirtAddr) -> usize {
        let halfword = unsafe { (epc.as_usize() as *const u16).read_volatile() };
        Self::instruction_length(halfword)
    }

    /// Sets the global machine interrupt-enable bit.
    pub fn enable_interrupts(&self) {
        self.csr().set_bits(Csr::Mstatus, MSTATUS_MIE);
    }

    pub fn disable_interrupts(&self) {
        self.csr().clear_bits(Csr::Mstatus, MSTATUS_MIE);
    }

    pub fn exception_register(&self, code: usize, handler: ExceptionHandler<C>) -> IntcResult {
        self.intc.register_exception(code, Some(handler))
    }

    pub fn timer_controller(&self) -> Option<&'static dyn NestedIntc> {
        self.intc.sub_controller(INTERRUPT_ID_TMR)
    }

    pub fn timer_interrupt_id(&self) -> usize {
        INTERRUPT_ID_TMR
    }

    pub fn sw_controller(&self) -> Option<&'static dyn NestedIntc> {
        self.intc.sub_controller(INTERRUPT_ID_SW)
    }

    pub fn sw_interrupt_id(&self) -> usize {
        INTERRUPT_ID_SW
    }
}
