use crate::memory::TypeAddr;

/// Fatal conditions a running program can hit. None of these are
/// recoverable mid-instruction; the step that raised one is the last
/// step, and the caller decides whether to inspect state before
/// tearing down.
#[derive(Debug, thiserror::Error)]
pub enum EmuError {
    #[error("unknown opcode {opcode:#06x} at pc {pc:#05x}")]
    UnknownOpcode { pc: TypeAddr, opcode: u16 },

    #[error("call stack overflow at pc {pc:#05x}, 16 frames deep")]
    StackOverflow { pc: TypeAddr },

    #[error("return with an empty call stack at pc {pc:#05x}")]
    StackUnderflow { pc: TypeAddr },

    #[error("memory access out of bounds at {address:#06x}")]
    OutOfBounds { address: TypeAddr },

    #[error("rom is {size} bytes, only {max} fit above 0x200")]
    RomTooLarge { size: usize, max: usize },
}
