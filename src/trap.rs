//! The machine-mode trap dispatcher.

use log::{trace, warn};

use crate::consts::*;
use crate::cpu::Cpu;
use crate::csr::{Csr, CsrFile};
use crate::intc::{ExceptionAction, IrqAction, VectorMode};

/// Register state captured on trap entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapSnapshot {
    pub cause: usize,
    pub epc: usize,
    pub tval: usize,
    pub mtvec: usize,
}

impl TrapSnapshot {
    pub fn capture<C: CsrFile>(csr: &C) -> Self {
        Self {
            cause: csr.read(Csr::Mcause),
            epc: csr.read(Csr::Mepc),
            tval: csr.read(Csr::Mtval),
            mtvec: csr.read(Csr::Mtvec),
        }
    }

    pub const fn is_interrupt(&self) -> bool {
        self.cause & MCAUSE_INTR != 0
    }

    pub const fn code(&self) -> usize {
        self.cause & MCAUSE_CAUSE
    }

    pub const fn vector_mode(&self) -> VectorMode {
        VectorMode::from_mtvec(self.mtvec)
    }
}

impl<C: CsrFile> Cpu<C> {
    /// Handles the trap this hart is currently taking.
    ///
    /// Must run with re-entrant traps held off, as they are on trap entry.
    pub fn handle_trap(&self) {
        let trap = TrapSnapshot::capture(self.csr());
        let code = trap.code();
        trace!(
            "hart {} trap: cause={:#x}, epc={:#x}, tval={:#x}, mtvec={:#x}",
            self.hartid(),
            trap.cause,
            trap.epc,
            trap.tval,
            trap.mtvec
        );

        if !trap.is_interrupt() {
            self.dispatch_exception(code);
            return;
        }
        if code < INTERRUPT_ID_CSW {
            self.dispatch_interrupt(code);
            return;
        }
        match trap.vector_mode() {
            VectorMode::Selective => self.dispatch_selective(code),
            // 硬件向量模式下 CPU 直接跳转到向量表项，不会经过这里
            VectorMode::Direct | VectorMode::Vectored | VectorMode::SelectiveHardware => {
                self.dispatch_interrupt(code)
            }
        }
    }

    fn dispatch_exception(&self, code: usize) {
        match self.controller().exception_snapshot(code) {
            Some(ExceptionAction::Handler(handler)) => handler(self, code),
            Some(ExceptionAction::Fatal) | None => self.shutdown(SHUTDOWN_UNHANDLED_EXCEPTION),
        }
    }

    /// Runs the handler-table slot for interrupt `code`.
    pub(crate) fn dispatch_interrupt(&self, code: usize) {
        let Some(slot) = self.controller().slot(code) else {
            warn!("hart {}: interrupt {} outside the handler table", self.hartid(), code);
            self.shutdown(SHUTDOWN_UNHANDLED_INTERRUPT);
            return;
        };
        match slot.action {
            IrqAction::Handler(handler) => handler(code, slot.context),
            IrqAction::DefaultTimer => self.default_timer_tick(),
            IrqAction::DefaultSoftware => {
                if let Err(e) = self.default_software(code, slot.context) {
                    warn!("hart {}: software interrupt not handled: {}", self.hartid(), e);
                    self.shutdown(SHUTDOWN_UNHANDLED_INTERRUPT);
                }
            }
            IrqAction::DefaultFatal => self.shutdown(SHUTDOWN_UNHANDLED_INTERRUPT),
            IrqAction::Empty => {
                warn!("hart {}: no handler for interrupt {}", self.hartid(), code);
                self.shutdown(SHUTDOWN_UNHANDLED_INTERRUPT);
            }
        }
    }

    /// Software demultiplexing through this hart's vector table. `mtvt` must
    /// still point at that table; the entry itself is read from the table
    /// under the controller lock.
    fn dispatch_selective(&self, code: usize) {
        let intc = self.controller();
        let context = intc.slot(INTERRUPT_ID_SW).map_or(0, |slot| slot.context);
        let mtvt = self.csr().read(Csr::Mtvt);
        let entry = if mtvt == intc.vector_table_base().as_usize() {
            intc.vector_entry(code)
        } else {
            warn!("hart {}: mtvt {:#x} is not this hart's vector table", self.hartid(), mtvt);
            None
        };
        match entry {
            Some(handler) => handler(code, context),
            None => {
                warn!("hart {}: no vector entry for interrupt {}", self.hartid(), code);
                self.shutdown(SHUTDOWN_UNHANDLED_VECTOR);
            }
        }
    }
}
