use log::{debug, info, trace};
use memory_addr::VirtAddr;
use spin::Mutex;

use crate::consts::*;
use crate::cpu::Cpu;
use crate::csr::{Csr, CsrFile, IrqSave};
use crate::error::{IntcError, IntcResult};
use crate::nested::NestedIntc;

/// Interrupt handler: `(interrupt ordinal, registered context)`.
pub type InterruptHandler = fn(usize, usize);

/// Exception handler: `(cpu, exception code)`.
pub type ExceptionHandler<C> = fn(&Cpu<C>, usize);

/// Interrupt ordinals recognized by the CPU-local controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptId {
    /// The global machine interrupt-enable bit.
    Base,
    Software,
    Timer,
    External,
    /// Vendor local interrupt `0..16`, at ordinal `16 + n`.
    Local(u8),
}

impl InterruptId {
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match raw {
            INTERRUPT_ID_BASE => Some(Self::Base),
            INTERRUPT_ID_SW => Some(Self::Software),
            INTERRUPT_ID_TMR => Some(Self::Timer),
            INTERRUPT_ID_EXT => Some(Self::External),
            n if n >= INTERRUPT_ID_LC0 && n < INTERRUPT_ID_LC0 + LOCAL_INTERRUPT_COUNT => {
                Some(Self::Local((n - INTERRUPT_ID_LC0) as u8))
            }
            _ => None,
        }
    }

    pub const fn raw(self) -> usize {
        match self {
            Self::Base => INTERRUPT_ID_BASE,
            Self::Software => INTERRUPT_ID_SW,
            Self::Timer => INTERRUPT_ID_TMR,
            Self::External => INTERRUPT_ID_EXT,
            Self::Local(n) => INTERRUPT_ID_LC0 + n as usize,
        }
    }

    /// The register and bit that gate delivery of this source.
    const fn enable_bit(self) -> (Csr, usize) {
        match self {
            Self::Base => (Csr::Mstatus, MSTATUS_MIE),
            Self::Software => (Csr::Mie, MIE_MSIE),
            Self::Timer => (Csr::Mie, MIE_MTIE),
            Self::External => (Csr::Mie, MIE_MEIE),
            Self::Local(_) => (Csr::Mie, 1 << self.raw()),
        }
    }

    fn default_action(self) -> IrqAction {
        match self {
            Self::Software => IrqAction::DefaultSoftware,
            Self::Timer => IrqAction::DefaultTimer,
            _ => IrqAction::DefaultFatal,
        }
    }
}

/// How traps are routed, as encoded in the low bits of `mtvec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorMode {
    Direct,
    Vectored,
    /// CLIC mode; software demultiplexes through `mtvt`.
    Selective,
    /// CLIC mode; the hart indexes `mtvt` itself.
    SelectiveHardware,
}

impl VectorMode {
    pub const fn from_mtvec(mtvec: usize) -> Self {
        match mtvec & MTVEC_MASK {
            MTVEC_CLIC => Self::Selective,
            MTVEC_CLIC_VECTORED => Self::SelectiveHardware,
            MTVEC_VECTORED => Self::Vectored,
            _ => Self::Direct,
        }
    }
}

/// What a handler-table slot does when its interrupt fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqAction {
    /// Nothing registered; dispatch ignores the interrupt.
    Empty,
    /// Forward to the software slot's nested controller.
    DefaultSoftware,
    /// Re-arm the timer a few ticks ahead.
    DefaultTimer,
    /// Report `SHUTDOWN_UNHANDLED_INTERRUPT`.
    DefaultFatal,
    Handler(InterruptHandler),
}

#[derive(Clone, Copy)]
pub(crate) struct IrqSlot {
    pub action: IrqAction,
    pub sub: Option<&'static dyn NestedIntc>,
    pub context: usize,
}

impl IrqSlot {
    const EMPTY: Self = Self {
        action: IrqAction::Empty,
        sub: None,
        context: 0,
    };
}

/// What an exception-table slot does. There is no empty state.
pub enum ExceptionAction<C: CsrFile> {
    /// Report `SHUTDOWN_UNHANDLED_EXCEPTION`.
    Fatal,
    Handler(ExceptionHandler<C>),
}

impl<C: CsrFile> Clone for ExceptionAction<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: CsrFile> Copy for ExceptionAction<C> {}

impl<C: CsrFile> PartialEq for ExceptionAction<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fatal, Self::Fatal) => true,
            (Self::Handler(a), Self::Handler(b)) => core::ptr::fn_addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl<C: CsrFile> core::fmt::Debug for ExceptionAction<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fatal => write!(f, "Fatal"),
            Self::Handler(h) => write!(f, "Handler({:#x})", *h as usize),
        }
    }
}

/// Read-only view of one handler-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSnapshot {
    pub action: IrqAction,
    pub has_sub_controller: bool,
    pub context: usize,
}

/// Trap entries, one per interrupt ordinal. `None` is stored as a zero word,
/// so the layout is the address array the hardware indexes.
#[repr(C, align(64))]
pub(crate) struct VectorTable(pub [Option<InterruptHandler>; MAX_INTERRUPTS]);

pub(crate) struct IntcInner<C: CsrFile> {
    pub init_done: bool,
    pub handlers: [IrqSlot; MAX_INTERRUPTS],
    pub exceptions: [ExceptionAction<C>; MAX_EXCEPTION_CODE],
    pub vectors: VectorTable,
}

/// The per-hart CPU-local interrupt controller.
pub struct CpuIntc<C: CsrFile> {
    csr: C,
    trap_entry: VirtAddr,
    inner: Mutex<IntcInner<C>>,
}

impl<C: CsrFile> CpuIntc<C> {
    pub(crate) fn new(csr: C, trap_entry: VirtAddr) -> Self {
        Self {
            csr,
            trap_entry,
            inner: Mutex::new(IntcInner {
                init_done: false,
                handlers: [IrqSlot::EMPTY; MAX_INTERRUPTS],
                exceptions: [ExceptionAction::Fatal; MAX_EXCEPTION_CODE],
                vectors: VectorTable([None; MAX_INTERRUPTS]),
            }),
        }
    }

    pub fn csr(&self) -> &C {
        &self.csr
    }

    pub fn trap_entry(&self) -> VirtAddr {
        self.trap_entry
    }

    /// Runs `f` on the tables with interrupts held off on this hart.
    fn with_inner<R>(&self, f: impl FnOnce(&mut IntcInner<C>) -> R) -> R {
        let _irq = IrqSave::new(&self.csr);
        let mut inner = self.inner.lock();
        f(&mut inner)
    }

    pub fn is_initialized(&self) -> bool {
        self.with_inner(|inner| inner.init_done)
    }

    /// One-time bring-up of the hart's trap state. Later calls do nothing.
    pub fn initialize(&self) {
        let ran = self.with_inner(|inner| {
            if inner.init_done {
                return false;
            }
            let csr = &self.csr;
            csr.clear_bits(Csr::Mie, usize::MAX);
            csr.clear_bits(Csr::Mip, usize::MAX);

            let misa = csr.read(Csr::Misa);
            // 委托寄存器仅在支持 N 或 S 扩展时存在
            if misa & (ISA_N_EXTENSION | ISA_S_EXTENSION) != 0 {
                csr.clear_bits(Csr::Mideleg, usize::MAX);
                csr.clear_bits(Csr::Medeleg, usize::MAX);
            }
            if misa & ISA_S_EXTENSION != 0 {
                csr.clear_bits(Csr::Satp, usize::MAX);
            }

            inner.handlers = [IrqSlot::EMPTY; MAX_INTERRUPTS];
            for (raw, slot) in inner.handlers.iter_mut().enumerate() {
                match InterruptId::from_raw(raw) {
                    Some(InterruptId::Base) | None => {}
                    Some(id) => slot.action = id.default_action(),
                }
            }
            inner.exceptions = [ExceptionAction::Fatal; MAX_EXCEPTION_CODE];
            inner.vectors.0 = [None; MAX_INTERRUPTS];

            self.program_vector(VectorMode::Direct, inner.vectors.0.as_ptr() as usize);

            if misa & ISA_FP_EXTENSIONS != 0 {
                csr.set_bits(Csr::Mstatus, MSTATUS_FS_INIT);
            }
            inner.init_done = true;
            true
        });
        if ran {
            info!(
                "cpu intc initialized: hart={}, trap_entry={:#x}",
                self.csr.read(Csr::Mhartid),
                self.trap_entry.as_usize()
            );
        }
    }

    /// Installs `handler` for interrupt ordinal `id`, or the built-in default
    /// for that ordinal when `handler` is `None`. The last call wins.
    pub fn register_handler(
        &self,
        id: usize,
        handler: Option<InterruptHandler>,
        context: usize,
    ) -> IntcResult {
        let irq = match InterruptId::from_raw(id) {
            Some(InterruptId::Base) | None => return Err(IntcError::InvalidId),
            Some(irq) => irq,
        };
        let action = handler.map_or(irq.default_action(), IrqAction::Handler);
        debug!("register handler: id={}, action={:?}, context={:#x}", id, action, context);
        self.with_inner(|inner| {
            let slot = &mut inner.handlers[id];
            slot.action = action;
            slot.context = context;
        });
        Ok(())
    }

    /// Wires the nested controller behind the software or timer slot.
    pub fn set_sub_controller(&self, id: usize, sub: Option<&'static dyn NestedIntc>) -> IntcResult {
        match InterruptId::from_raw(id) {
            Some(InterruptId::Software | InterruptId::Timer) => {}
            _ => return Err(IntcError::InvalidId),
        }
        debug!("sub controller for id={}: {}", id, if sub.is_some() { "wired" } else { "none" });
        self.with_inner(|inner| inner.handlers[id].sub = sub);
        Ok(())
    }

    pub(crate) fn sub_controller(&self, id: usize) -> Option<&'static dyn NestedIntc> {
        self.with_inner(|inner| inner.handlers.get(id).and_then(|slot| slot.sub))
    }

    pub(crate) fn slot(&self, id: usize) -> Option<IrqSlot> {
        self.with_inner(|inner| inner.handlers.get(id).copied())
    }

    pub fn handler_snapshot(&self, id: usize) -> Option<HandlerSnapshot> {
        self.slot(id).map(|slot| HandlerSnapshot {
            action: slot.action,
            has_sub_controller: slot.sub.is_some(),
            context: slot.context,
        })
    }

    pub fn register_exception(&self, code: usize, handler: Option<ExceptionHandler<C>>) -> IntcResult {
        let handler = match handler {
            Some(h) if code < MAX_EXCEPTION_CODE => h,
            _ => return Err(IntcError::InvalidExceptionCode),
        };
        debug!("register exception: code={}", code);
        self.with_inner(|inner| inner.exceptions[code] = ExceptionAction::Handler(handler));
        Ok(())
    }

    pub fn exception_snapshot(&self, code: usize) -> Option<ExceptionAction<C>> {
        self.with_inner(|inner| inner.exceptions.get(code).copied())
    }

    /// Writes the trap entry used for ordinal `id` in the vectored modes.
    pub fn register_vector_entry(&self, id: usize, entry: InterruptHandler) -> IntcResult {
        if InterruptId::from_raw(id).is_none_or(|irq| irq == InterruptId::Base) {
            return Err(IntcError::InvalidId);
        }
        self.with_inner(|inner| inner.vectors.0[id] = Some(entry));
        Ok(())
    }

    pub(crate) fn vector_entry(&self, id: usize) -> Option<InterruptHandler> {
        self.with_inner(|inner| inner.vectors.0.get(id).copied().flatten())
    }

    pub fn vector_table_base(&self) -> VirtAddr {
        self.with_inner(|inner| VirtAddr::from_usize(inner.vectors.0.as_ptr() as usize))
    }

    fn set_enable(&self, id: usize, enable: bool) -> IntcResult {
        let irq = InterruptId::from_raw(id).ok_or(IntcError::InvalidId)?;
        let (csr, mask) = irq.enable_bit();
        trace!("{} interrupt id={}", if enable { "enable" } else { "disable" }, id);
        if enable {
            self.csr.set_bits(csr, mask);
        } else {
            self.csr.clear_bits(csr, mask);
        }
        Ok(())
    }

    pub fn enable(&self, id: usize) -> IntcResult {
        self.set_enable(id, true)
    }

    pub fn disable(&self, id: usize) -> IntcResult {
        self.set_enable(id, false)
    }

    /// The live vector mode, decoded from `mtvec`.
    pub fn vector_mode(&self) -> VectorMode {
        VectorMode::from_mtvec(self.csr.read(Csr::Mtvec))
    }

    /// Switches the vector mode. The vectored modes hand the address of this
    /// controller's vector table to the hardware, so the controller must
    /// live at a fixed address, e.g. in a [`HartRegistry`].
    ///
    /// [`HartRegistry`]: crate::HartRegistry
    pub fn set_vector_mode(&'static self, mode: VectorMode) -> IntcResult {
        self.apply_vector_mode(mode);
        Ok(())
    }

    fn apply_vector_mode(&self, mode: VectorMode) {
        let table = self.vector_table_base().as_usize();
        debug!("set vector mode {:?}, table={:#x}", mode, table);
        self.program_vector(mode, table);
    }

    pub fn enable_vector(&'static self, id: usize, mode: VectorMode) -> IntcResult {
        if id != INTERRUPT_ID_BASE {
            return Err(IntcError::InvalidId);
        }
        match mode {
            VectorMode::Direct | VectorMode::Vectored => self.set_vector_mode(mode),
            _ => Err(IntcError::InvalidMode),
        }
    }

    pub fn disable_vector(&self, id: usize) -> IntcResult {
        if id != INTERRUPT_ID_BASE {
            return Err(IntcError::InvalidId);
        }
        self.apply_vector_mode(VectorMode::Direct);
        Ok(())
    }

    /// Writes `mtvec` (and `mtvt` for the CLIC modes). `table` is the vector
    /// table base; the direct and CLIC modes enter through `trap_entry`.
    fn program_vector(&self, mode: VectorMode, table: usize) {
        let csr = &self.csr;
        let entry = self.trap_entry.as_usize() & !MTVEC_MASK;
        match mode {
            VectorMode::Selective => {
                csr.write(Csr::Mtvt, table);
                csr.write(Csr::Mtvec, entry | MTVEC_CLIC);
            }
            VectorMode::SelectiveHardware => {
                csr.write(Csr::Mtvt, table);
                csr.write(Csr::Mtvec, entry | MTVEC_CLIC_VECTORED);
            }
            VectorMode::Vectored => csr.write(Csr::Mtvec, table | MTVEC_VECTORED),
            VectorMode::Direct => csr.write(Csr::Mtvec, entry | MTVEC_DIRECT),
        }
    }
}
