//! Register access on a real RISC-V hart.

use core::arch::asm;

use crate::csr::{Csr, CsrFile};
use crate::hart::HartRegistry;

macro_rules! csrr {
    ($num:literal) => {{
        let val: usize;
        unsafe { asm!(concat!("csrr {0}, ", stringify!($num)), out(reg) val) };
        val
    }};
}

macro_rules! csrw {
    ($num:literal, $val:expr) => {
        unsafe { asm!(concat!("csrw ", stringify!($num), ", {0}"), in(reg) $val) }
    };
}

macro_rules! csrrs {
    ($num:literal, $mask:expr) => {{
        let prev: usize;
        unsafe { asm!(concat!("csrrs {0}, ", stringify!($num), ", {1}"), out(reg) prev, in(reg) $mask) };
        prev
    }};
}

macro_rules! csrrc {
    ($num:literal, $mask:expr) => {{
        let prev: usize;
        unsafe { asm!(concat!("csrrc {0}, ", stringify!($num), ", {1}"), out(reg) prev, in(reg) $mask) };
        prev
    }};
}

/// Expands `$op!(number, args..)` for the CSR number of `$csr`.
macro_rules! with_csr {
    ($csr:expr, $op:ident $(, $arg:expr)*) => {
        match $csr {
            Csr::Mstatus => $op!(0x300 $(, $arg)*),
            Csr::Misa => $op!(0x301 $(, $arg)*),
            Csr::Medeleg => $op!(0x302 $(, $arg)*),
            Csr::Mideleg => $op!(0x303 $(, $arg)*),
            Csr::Mie => $op!(0x304 $(, $arg)*),
            Csr::Mtvec => $op!(0x305 $(, $arg)*),
            Csr::Mtvt => $op!(0x307 $(, $arg)*),
            Csr::Mepc => $op!(0x341 $(, $arg)*),
            Csr::Mcause => $op!(0x342 $(, $arg)*),
            Csr::Mtval => $op!(0x343 $(, $arg)*),
            Csr::Mip => $op!(0x344 $(, $arg)*),
            Csr::Satp => $op!(0x180 $(, $arg)*),
            Csr::Mhartid => $op!(0xF14 $(, $arg)*),
            Csr::Mcycle => $op!(0xB00 $(, $arg)*),
            Csr::Mcycleh => $op!(0xB80 $(, $arg)*),
        }
    };
}

/// The executing hart's own registers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HwCsr;

impl CsrFile for HwCsr {
    fn read(&self, csr: Csr) -> usize {
        with_csr!(csr, csrr)
    }

    fn write(&self, csr: Csr, val: usize) {
        with_csr!(csr, csrw, val)
    }

    fn set_bits(&self, csr: Csr, mask: usize) -> usize {
        with_csr!(csr, csrrs, mask)
    }

    fn clear_bits(&self, csr: Csr, mask: usize) -> usize {
        with_csr!(csr, csrrc, mask)
    }
}

/// CPU records of every hart in the system.
pub static HARTS: HartRegistry<HwCsr> = HartRegistry::new();

pub fn current_hart_id() -> usize {
    riscv::register::mhartid::read()
}

/// Rust half of the machine trap entry.
///
/// The board's trap prologue saves caller-saved state, calls this, restores
/// state and executes `mret`.
#[unsafe(no_mangle)]
pub extern "C" fn intc_trap_handler() {
    HARTS.handle_trap(current_hart_id());
}
