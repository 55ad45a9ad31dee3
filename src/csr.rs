//! Machine-mode control/status register access.
//!
//! Every operation maps to a single `csr*` instruction on real hardware, so
//! none of them can be torn by a nested trap. [`SimCsrFile`] provides the
//! same guarantees with one atomic word per register.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::consts::*;

/// The machine-mode registers this controller touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Csr {
    Mstatus,
    Misa,
    Medeleg,
    Mideleg,
    Mie,
    Mtvec,
    Mtvt,
    Mepc,
    Mcause,
    Mtval,
    Mip,
    Satp,
    Mhartid,
    Mcycle,
    Mcycleh,
}

impl Csr {
    pub const COUNT: usize = 15;

    pub const fn addr(self) -> u16 {
        match self {
            Self::Mstatus => CSR_MSTATUS,
            Self::Misa => CSR_MISA,
            Self::Medeleg => CSR_MEDELEG,
            Self::Mideleg => CSR_MIDELEG,
            Self::Mie => CSR_MIE,
            Self::Mtvec => CSR_MTVEC,
            Self::Mtvt => CSR_MTVT,
            Self::Mepc => CSR_MEPC,
            Self::Mcause => CSR_MCAUSE,
            Self::Mtval => CSR_MTVAL,
            Self::Mip => CSR_MIP,
            Self::Satp => CSR_SATP,
            Self::Mhartid => CSR_MHARTID,
            Self::Mcycle => CSR_MCYCLE,
            Self::Mcycleh => CSR_MCYCLEH,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Indivisible access to one hart's control/status registers.
///
/// `set_bits` and `clear_bits` return the value the register held before the
/// update, mirroring `csrrs`/`csrrc`.
pub trait CsrFile: Sync {
    fn read(&self, csr: Csr) -> usize;
    fn write(&self, csr: Csr, val: usize);
    fn set_bits(&self, csr: Csr, mask: usize) -> usize;
    fn clear_bits(&self, csr: Csr, mask: usize) -> usize;
}

/// Clears `mstatus.MIE` for its lifetime and restores the previous state on drop.
pub(crate) struct IrqSave<'a, C: CsrFile> {
    csr: &'a C,
    was_enabled: bool,
}

impl<'a, C: CsrFile> IrqSave<'a, C> {
    pub fn new(csr: &'a C) -> Self {
        let prev = csr.clear_bits(Csr::Mstatus, MSTATUS_MIE);
        Self {
            csr,
            was_enabled: prev & MSTATUS_MIE != 0,
        }
    }
}

impl<C: CsrFile> Drop for IrqSave<'_, C> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.csr.set_bits(Csr::Mstatus, MSTATUS_MIE);
        }
    }
}

/// A register file backed by atomics, for running the controller off-target.
///
/// Registers are plain storage: writing `mcause` does not raise a trap and
/// `mip` is not driven by any device.
pub struct SimCsrFile {
    regs: [AtomicUsize; Csr::COUNT],
}

impl SimCsrFile {
    pub const fn new(hartid: usize, misa: usize) -> Self {
        let mut regs = [const { AtomicUsize::new(0) }; Csr::COUNT];
        regs[Csr::Mhartid.index()] = AtomicUsize::new(hartid);
        regs[Csr::Misa.index()] = AtomicUsize::new(misa);
        Self { regs }
    }

    /// Loads the registers the hardware would set on trap entry.
    pub fn raise_trap(&self, cause: usize, epc: usize, tval: usize) {
        self.write(Csr::Mcause, cause);
        self.write(Csr::Mepc, epc);
        self.write(Csr::Mtval, tval);
    }

    pub fn raise_interrupt(&self, code: usize) {
        self.raise_trap(MCAUSE_INTR | code, 0, 0);
    }

    pub fn raise_exception(&self, code: usize, epc: usize, tval: usize) {
        self.raise_trap(code, epc, tval);
    }
}

impl CsrFile for SimCsrFile {
    fn read(&self, csr: Csr) -> usize {
        self.regs[csr.index()].load(Ordering::SeqCst)
    }

    fn write(&self, csr: Csr, val: usize) {
        self.regs[csr.index()].store(val, Ordering::SeqCst);
    }

    fn set_bits(&self, csr: Csr, mask: usize) -> usize {
        self.regs[csr.index()].fetch_or(mask, Ordering::SeqCst)
    }

    fn clear_bits(&self, csr: Csr, mask: usize) -> usize {
        self.regs[csr.index()].fetch_and(!mask, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_return_previous_value() {
        let csr = SimCsrFile::new(0, 0);
        csr.write(Csr::Mie, 0b1000);
        assert_eq!(csr.set_bits(Csr::Mie, 0b0001), 0b1000);
        assert_eq!(csr.clear_bits(Csr::Mie, 0b1000), 0b1001);
        assert_eq!(csr.read(Csr::Mie), 0b0001);
    }

    #[test]
    fn irq_save_restores_only_when_previously_enabled() {
        let csr = SimCsrFile::new(0, 0);
        csr.set_bits(Csr::Mstatus, MSTATUS_MIE);
        {
            let _guard = IrqSave::new(&csr);
            assert_eq!(csr.read(Csr::Mstatus) & MSTATUS_MIE, 0);
        }
        assert_ne!(csr.read(Csr::Mstatus) & MSTATUS_MIE, 0);

        csr.clear_bits(Csr::Mstatus, MSTATUS_MIE);
        {
            let _guard = IrqSave::new(&csr);
        }
        assert_eq!(csr.read(Csr::Mstatus) & MSTATUS_MIE, 0);
    }

    #[test]
    fn new_file_reports_hartid_and_isa() {
        let csr = SimCsrFile::new(3, ISA_S_EXTENSION);
        assert_eq!(csr.read(Csr::Mhartid), 3);
        assert_eq!(csr.read(Csr::Misa), ISA_S_EXTENSION);
    }
}
