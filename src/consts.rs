pub const MAX_HARTS: usize = 8; // 最大支持的 hart 数量

/// handler 表大小：标准中断 0..=11 + 本地中断 16..=31
pub const MAX_INTERRUPTS: usize = 32;
pub const MAX_EXCEPTION_CODE: usize = 16;

/// trap 入口 / 向量表基址的对齐要求（CLIC 要求至少 64 字节）
pub const TRAP_ENTRY_ALIGN: usize = 64;

pub const CSR_MSTATUS: u16 = 0x300;
pub const CSR_MISA: u16 = 0x301;
pub const CSR_MEDELEG: u16 = 0x302;
pub const CSR_MIDELEG: u16 = 0x303;
pub const CSR_MIE: u16 = 0x304;
pub const CSR_MTVEC: u16 = 0x305;
/// CLIC 向量表基址寄存器
pub const CSR_MTVT: u16 = 0x307;
pub const CSR_MEPC: u16 = 0x341;
pub const CSR_MCAUSE: u16 = 0x342;
pub const CSR_MTVAL: u16 = 0x343;
pub const CSR_MIP: u16 = 0x344;
pub const CSR_SATP: u16 = 0x180;
pub const CSR_MCYCLE: u16 = 0xB00;
pub const CSR_MCYCLEH: u16 = 0xB80;
pub const CSR_MHARTID: u16 = 0xF14;

pub const MSTATUS_MIE: usize = 1 << 3;
/// mstatus.FS = Initial
pub const MSTATUS_FS_INIT: usize = 1 << 13;

pub const MIE_MSIE: usize = 1 << 3;
pub const MIE_MTIE: usize = 1 << 7;
pub const MIE_MEIE: usize = 1 << 11;

pub const MCAUSE_INTR: usize = 1 << (usize::BITS - 1);
pub const MCAUSE_CAUSE: usize = 0x3FF;

pub const MTVEC_DIRECT: usize = 0x00;
pub const MTVEC_VECTORED: usize = 0x01;
pub const MTVEC_CLIC: usize = 0x02;
pub const MTVEC_CLIC_VECTORED: usize = 0x03;
pub const MTVEC_MASK: usize = 0x3F;

pub const ISA_D_EXTENSION: usize = 1 << (b'D' - b'A');
pub const ISA_F_EXTENSION: usize = 1 << (b'F' - b'A');
pub const ISA_N_EXTENSION: usize = 1 << (b'N' - b'A');
pub const ISA_Q_EXTENSION: usize = 1 << (b'Q' - b'A');
pub const ISA_S_EXTENSION: usize = 1 << (b'S' - b'A');
pub const ISA_FP_EXTENSIONS: usize = ISA_D_EXTENSION | ISA_F_EXTENSION | ISA_Q_EXTENSION;

pub const INTERRUPT_ID_BASE: usize = 0;
pub const INTERRUPT_ID_SW: usize = 3;
pub const INTERRUPT_ID_TMR: usize = 7;
pub const INTERRUPT_ID_EXT: usize = 11;
/// 小于该值的 cause 属于标准中断源
pub const INTERRUPT_ID_CSW: usize = 12;
pub const INTERRUPT_ID_LC0: usize = 16;
pub const LOCAL_INTERRUPT_COUNT: usize = 16;

/// 默认 timer handler 重新设置比较值时的提前量
pub const DEFAULT_TIMER_DELTA: u64 = 10;

pub const SHUTDOWN_UNHANDLED_EXCEPTION: u32 = 100;
pub const SHUTDOWN_UNHANDLED_INTERRUPT: u32 = 200;
pub const SHUTDOWN_UNHANDLED_VECTOR: u32 = 300;

pub const INSN_LENGTH_MASK: u16 = 0b11;
pub const INSN_NOT_COMPRESSED: u16 = 0b11;
