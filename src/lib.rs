#![no_std]

mod consts;
mod cpu;
mod csr;
mod error;
mod glue;
mod hart;
mod intc;
mod nested;
mod trap;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod hw;

pub use consts::{
    DEFAULT_TIMER_DELTA, INTERRUPT_ID_BASE, INTERRUPT_ID_EXT, INTERRUPT_ID_LC0, INTERRUPT_ID_SW,
    INTERRUPT_ID_TMR, LOCAL_INTERRUPT_COUNT, MAX_EXCEPTION_CODE, MAX_HARTS, MAX_INTERRUPTS,
    SHUTDOWN_UNHANDLED_EXCEPTION, SHUTDOWN_UNHANDLED_INTERRUPT, SHUTDOWN_UNHANDLED_VECTOR,
    TRAP_ENTRY_ALIGN,
};
pub use cpu::{Cpu, CpuDesc, ShutdownSink};
pub use csr::{Csr, CsrFile, SimCsrFile};
pub use error::{IntcError, IntcResult};
pub use hart::HartRegistry;
pub use intc::{
    CpuIntc, ExceptionAction, ExceptionHandler, HandlerSnapshot, InterruptHandler, InterruptId,
    IrqAction, VectorMode,
};
pub use nested::{IntcCommand, NestedIntc};
pub use trap::TrapSnapshot;
