use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,

    #[error("invalid class file magic header")]
    InvalidMagic,

    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },

    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },

    #[error("invalid opcode 0x{opcode:02x} at code offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },

    #[error("invalid annotation element value tag '{}'", *tag as char)]
    InvalidElementValue { tag: u8 },

    #[error("annotation values nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("IO error while reading class bytes: {0}")]
    Io(#[from] std::io::Error),
}
