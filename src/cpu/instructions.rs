//! The static instruction table: every legal 6510 opcode, its addressing
//! mode, semantic group, and operand metadata.
//!
//! This table is the single source of truth for "what is opcode N":
//! [`decode`] backs both the disassembler and `interpreter::run_step`'s
//! dispatch, rather than duplicating the opcode-to-mnemonic mapping a
//! second time the way the retrieved NES core this crate is descended
//! from does (its `utils::decode_instruction` vs. `cpu::match_handler`
//! tables can and have drifted out of sync with each other).
//! `interpreter` only adds execution-specific handling on top, to
//! distinguish branch/accumulator addressing from how they're
//! catalogued here (see that module for why).
//!
//! Illegal/undocumented opcodes are out of scope: `decode` returns `None`
//! for any opcode without a legal-instruction entry.

use bitflags::bitflags;

/// The addressing mode of a legal 6510 instruction.
///
/// Branch instructions (BEQ, BNE, ...) are catalogued here as
/// `Immediate` — from the table's point of view they simply consume one
/// immediate operand byte (the signed displacement); the interpreter's
/// own addressing logic treats them specially to compute the branch
/// target and its cycle penalties. Likewise accumulator-form shifts
/// (`ASL A`, `ROR A`, ...) are catalogued as `Implied` (no operand byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirectX,
    IndirectIndexedY,
}

/// Byte length of an instruction, a pure function of its addressing mode.
pub fn size(mode: AddressingMode) -> u8 {
    match mode {
        AddressingMode::Implied => 1,
        AddressingMode::Immediate
        | AddressingMode::ZeroPage
        | AddressingMode::ZeroPageX
        | AddressingMode::ZeroPageY
        | AddressingMode::IndexedIndirectX
        | AddressingMode::IndirectIndexedY => 2,
        AddressingMode::Absolute
        | AddressingMode::AbsoluteX
        | AddressingMode::AbsoluteY
        | AddressingMode::Indirect => 3,
    }
}

/// Semantic grouping of an instruction, for tooling/disassembly use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Branch,
    LoadStore,
    Control,
    Math,
    Logic,
    Compare,
    Shift,
    Stack,
    Transfer,
}

bitflags! {
    /// Which CPU-visible state an operand reads or writes.
    pub struct OperandRole: u16 {
        const ACCUMULATOR     = 0x0001;
        const INDEX_X         = 0x0002;
        const INDEX_Y         = 0x0004;
        const STACK_POINTER   = 0x0008;
        const MEMORY          = 0x0010;
        const STATUS          = 0x0020;
        const PROGRAM_COUNTER = 0x0040;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    None,
    Register,
    Memory,
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSize {
    None,
    Byte,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandAccess {
    None,
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub role: OperandRole,
    pub ty: OperandType,
    pub size: OperandSize,
    pub access: OperandAccess,
}

/// The 56 documented 6510 mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS,
    CLC, CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY,
    JMP, JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR,
    RTI, RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
}

impl Instruction {
    pub fn group(self) -> Group {
        use Instruction::*;
        match self {
            BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS => Group::Branch,
            LDA | LDX | LDY | STA | STX | STY => Group::LoadStore,
            JMP | JSR | RTS | RTI | BRK | CLC | SEC | CLI | SEI | CLV | CLD | SED | NOP => {
                Group::Control
            }
            ADC | SBC | INC | INX | INY | DEC | DEX | DEY => Group::Math,
            AND | ORA | EOR | BIT => Group::Logic,
            CMP | CPX | CPY => Group::Compare,
            ASL | LSR | ROL | ROR => Group::Shift,
            PHA | PHP | PLA | PLP => Group::Stack,
            TAX | TAY | TSX | TXA | TXS | TYA => Group::Transfer,
        }
    }

    /// Whether this instruction reads-modifies-writes a memory operand
    /// (the shift/rotate/inc/dec family).
    pub(crate) fn is_read_modify_write(self) -> bool {
        use Instruction::*;
        matches!(self, ASL | LSR | ROL | ROR | INC | DEC)
    }

    pub(crate) fn is_store(self) -> bool {
        matches!(self, Instruction::STA | Instruction::STX | Instruction::STY)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstructionDescriptor {
    pub opcode: u8,
    pub mnemonic: Instruction,
    pub mode: AddressingMode,
    pub group: Group,
    pub operand1: Option<Operand>,
    pub operand2: Option<Operand>,
}

fn memory_operand(mode: AddressingMode, access: OperandAccess) -> Operand {
    let (ty, size) = match mode {
        AddressingMode::Immediate => (OperandType::Immediate, OperandSize::Byte),
        AddressingMode::ZeroPage
        | AddressingMode::ZeroPageX
        | AddressingMode::ZeroPageY
        | AddressingMode::IndexedIndirectX
        | AddressingMode::IndirectIndexedY => (OperandType::Memory, OperandSize::Byte),
        AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY => {
            (OperandType::Memory, OperandSize::Word)
        }
        AddressingMode::Indirect => (OperandType::Memory, OperandSize::Word),
        AddressingMode::Implied => (OperandType::None, OperandSize::None),
    };
    Operand {
        role: OperandRole::MEMORY,
        ty,
        size,
        access,
    }
}

fn register_operand(role: OperandRole, access: OperandAccess) -> Operand {
    Operand {
        role,
        ty: OperandType::Register,
        size: OperandSize::Byte,
        access,
    }
}

/// Derive the two operand-metadata slots for an (instruction, mode) pair.
///
/// This is computed rather than hand-tabulated per opcode: operand roles
/// are not exercised by any concrete scenario in the host spec, so a
/// faithful-by-construction derivation is preferred over 151 lines of
/// near-duplicate literals.
fn operands_for(instr: Instruction, mode: AddressingMode) -> (Option<Operand>, Option<Operand>) {
    use Instruction::*;
    if mode == AddressingMode::Implied {
        return match instr {
            TAX => (Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Read)), Some(register_operand(OperandRole::INDEX_X, OperandAccess::Write))),
            TXA => (Some(register_operand(OperandRole::INDEX_X, OperandAccess::Read)), Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Write))),
            TAY => (Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Read)), Some(register_operand(OperandRole::INDEX_Y, OperandAccess::Write))),
            TYA => (Some(register_operand(OperandRole::INDEX_Y, OperandAccess::Read)), Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Write))),
            TSX => (Some(register_operand(OperandRole::STACK_POINTER, OperandAccess::Read)), Some(register_operand(OperandRole::INDEX_X, OperandAccess::Write))),
            TXS => (Some(register_operand(OperandRole::INDEX_X, OperandAccess::Read)), Some(register_operand(OperandRole::STACK_POINTER, OperandAccess::Write))),
            INX | DEX => (Some(register_operand(OperandRole::INDEX_X, OperandAccess::ReadWrite)), None),
            INY | DEY => (Some(register_operand(OperandRole::INDEX_Y, OperandAccess::ReadWrite)), None),
            ASL | LSR | ROL | ROR => (Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::ReadWrite)), None),
            PHA => (Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Read)), None),
            PLA => (Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Write)), None),
            PHP => (Some(register_operand(OperandRole::STATUS, OperandAccess::Read)), None),
            PLP => (Some(register_operand(OperandRole::STATUS, OperandAccess::Write)), None),
            RTS | RTI | BRK => (Some(register_operand(OperandRole::PROGRAM_COUNTER, OperandAccess::Write)), None),
            _ => (None, None),
        };
    }

    if instr.group() == Group::Branch {
        let operand = Operand {
            role: OperandRole::PROGRAM_COUNTER,
            ty: OperandType::Immediate,
            size: OperandSize::Byte,
            access: OperandAccess::Read,
        };
        return (Some(operand), None);
    }

    if instr == JMP || instr == JSR {
        let operand = Operand {
            role: OperandRole::PROGRAM_COUNTER,
            ty: OperandType::Memory,
            size: OperandSize::Word,
            access: OperandAccess::Write,
        };
        return (Some(operand), None);
    }

    if instr.is_read_modify_write() {
        return (Some(memory_operand(mode, OperandAccess::ReadWrite)), None);
    }

    if instr.is_store() {
        let src = match instr {
            STA => register_operand(OperandRole::ACCUMULATOR, OperandAccess::Read),
            STX => register_operand(OperandRole::INDEX_X, OperandAccess::Read),
            STY => register_operand(OperandRole::INDEX_Y, OperandAccess::Read),
            _ => unreachable!(),
        };
        return (Some(src), Some(memory_operand(mode, OperandAccess::Write)));
    }

    match instr {
        LDA => (Some(memory_operand(mode, OperandAccess::Read)), Some(register_operand(OperandRole::ACCUMULATOR, OperandAccess::Write))),
        LDX => (Some(memory_operand(mode, OperandAccess::Read)), Some(register_operand(OperandRole::INDEX_X, OperandAccess::Write))),
        LDY => (Some(memory_operand(mode, OperandAccess::Read)), Some(register_operand(OperandRole::INDEX_Y, OperandAccess::Write))),
        _ => (Some(memory_operand(mode, OperandAccess::Read)), None),
    }
}

/// An instruction decoded from a byte window, with its operand bytes (if
/// any) populated according to the addressing mode's size.
#[derive(Debug, Clone, Copy)]
pub struct DecodedInstruction {
    pub descriptor: InstructionDescriptor,
    pub operand_lo: Option<u8>,
    pub operand_hi: Option<u8>,
}

impl DecodedInstruction {
    pub fn word_operand(&self) -> u16 {
        u16::from(self.operand_lo.unwrap_or(0)) | (u16::from(self.operand_hi.unwrap_or(0)) << 8)
    }
}

/// Decode up to 3 bytes (opcode + up to two operand bytes) starting at
/// `bytes[0]`. Returns `None` for an illegal/unmapped opcode.
pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedInstruction> {
    let descriptor = decode(bytes[0])?;
    let len = size(descriptor.mode);
    let operand_lo = if len >= 2 { bytes.get(1).copied() } else { None };
    let operand_hi = if len >= 3 { bytes.get(2).copied() } else { None };
    Some(DecodedInstruction {
        descriptor,
        operand_lo,
        operand_hi,
    })
}

macro_rules! table {
    ($($opcode:literal => $instr:ident, $mode:ident;)*) => {
        /// Decode a legal opcode byte into its instruction descriptor.
        /// Returns `None` for unmapped/illegal opcodes.
        pub fn decode(opcode: u8) -> Option<InstructionDescriptor> {
            let (mnemonic, mode) = match opcode {
                $($opcode => (Instruction::$instr, AddressingMode::$mode),)*
                _ => return None,
            };
            let group = mnemonic.group();
            let (operand1, operand2) = operands_for(mnemonic, mode);
            Some(InstructionDescriptor { opcode, mnemonic, mode, group, operand1, operand2 })
        }
    };
}

use AddressingMode::*;
table! {
    0x00 => BRK, Implied;        0x01 => ORA, IndexedIndirectX;
    0x05 => ORA, ZeroPage;       0x06 => ASL, ZeroPage;
    0x08 => PHP, Implied;        0x09 => ORA, Immediate;
    0x0A => ASL, Implied;        0x0D => ORA, Absolute;
    0x0E => ASL, Absolute;

    0x10 => BPL, Immediate;      0x11 => ORA, IndirectIndexedY;
    0x15 => ORA, ZeroPageX;      0x16 => ASL, ZeroPageX;
    0x18 => CLC, Implied;        0x19 => ORA, AbsoluteY;
    0x1D => ORA, AbsoluteX;      0x1E => ASL, AbsoluteX;

    0x20 => JSR, Absolute;       0x21 => AND, IndexedIndirectX;
    0x24 => BIT, ZeroPage;       0x25 => AND, ZeroPage;
    0x26 => ROL, ZeroPage;       0x28 => PLP, Implied;
    0x29 => AND, Immediate;      0x2A => ROL, Implied;
    0x2C => BIT, Absolute;       0x2D => AND, Absolute;
    0x2E => ROL, Absolute;

    0x30 => BMI, Immediate;      0x31 => AND, IndirectIndexedY;
    0x35 => AND, ZeroPageX;      0x36 => ROL, ZeroPageX;
    0x38 => SEC, Implied;        0x39 => AND, AbsoluteY;
    0x3D => AND, AbsoluteX;      0x3E => ROL, AbsoluteX;

    0x40 => RTI, Implied;        0x41 => EOR, IndexedIndirectX;
    0x45 => EOR, ZeroPage;       0x46 => LSR, ZeroPage;
    0x48 => PHA, Implied;        0x49 => EOR, Immediate;
    0x4A => LSR, Implied;        0x4C => JMP, Absolute;
    0x4D => EOR, Absolute;       0x4E => LSR, Absolute;

    0x50 => BVC, Immediate;      0x51 => EOR, IndirectIndexedY;
    0x55 => EOR, ZeroPageX;      0x56 => LSR, ZeroPageX;
    0x58 => CLI, Implied;        0x59 => EOR, AbsoluteY;
    0x5D => EOR, AbsoluteX;      0x5E => LSR, AbsoluteX;

    0x60 => RTS, Implied;        0x61 => ADC, IndexedIndirectX;
    0x65 => ADC, ZeroPage;       0x66 => ROR, ZeroPage;
    0x68 => PLA, Implied;        0x69 => ADC, Immediate;
    0x6A => ROR, Implied;        0x6C => JMP, Indirect;
    0x6D => ADC, Absolute;       0x6E => ROR, Absolute;

    0x70 => BVS, Immediate;      0x71 => ADC, IndirectIndexedY;
    0x75 => ADC, ZeroPageX;      0x76 => ROR, ZeroPageX;
    0x78 => SEI, Implied;        0x79 => ADC, AbsoluteY;
    0x7D => ADC, AbsoluteX;      0x7E => ROR, AbsoluteX;

    0x81 => STA, IndexedIndirectX;
    0x84 => STY, ZeroPage;       0x85 => STA, ZeroPage;
    0x86 => STX, ZeroPage;       0x88 => DEY, Implied;
    0x8A => TXA, Implied;        0x8C => STY, Absolute;
    0x8D => STA, Absolute;       0x8E => STX, Absolute;

    0x90 => BCC, Immediate;      0x91 => STA, IndirectIndexedY;
    0x94 => STY, ZeroPageX;      0x95 => STA, ZeroPageX;
    0x96 => STX, ZeroPageY;      0x98 => TYA, Implied;
    0x99 => STA, AbsoluteY;      0x9A => TXS, Implied;
    0x9D => STA, AbsoluteX;

    0xA0 => LDY, Immediate;      0xA1 => LDA, IndexedIndirectX;
    0xA2 => LDX, Immediate;      0xA4 => LDY, ZeroPage;
    0xA5 => LDA, ZeroPage;       0xA6 => LDX, ZeroPage;
    0xA8 => TAY, Implied;        0xA9 => LDA, Immediate;
    0xAA => TAX, Implied;        0xAC => LDY, Absolute;
    0xAD => LDA, Absolute;       0xAE => LDX, Absolute;

    0xB0 => BCS, Immediate;      0xB1 => LDA, IndirectIndexedY;
    0xB4 => LDY, ZeroPageX;      0xB5 => LDA, ZeroPageX;
    0xB6 => LDX, ZeroPageY;      0xB8 => CLV, Implied;
    0xB9 => LDA, AbsoluteY;      0xBA => TSX, Implied;
    0xBC => LDY, AbsoluteX;      0xBD => LDA, AbsoluteX;
    0xBE => LDX, AbsoluteY;

    0xC0 => CPY, Immediate;      0xC1 => CMP, IndexedIndirectX;
    0xC4 => CPY, ZeroPage;       0xC5 => CMP, ZeroPage;
    0xC6 => DEC, ZeroPage;       0xC8 => INY, Implied;
    0xC9 => CMP, Immediate;      0xCA => DEX, Implied;
    0xCC => CPY, Absolute;       0xCD => CMP, Absolute;
    0xCE => DEC, Absolute;

    0xD0 => BNE, Immediate;      0xD1 => CMP, IndirectIndexedY;
    0xD5 => CMP, ZeroPageX;      0xD6 => DEC, ZeroPageX;
    0xD8 => CLD, Implied;        0xD9 => CMP, AbsoluteY;
    0xDD => CMP, AbsoluteX;      0xDE => DEC, AbsoluteX;

    0xE0 => CPX, Immediate;      0xE1 => SBC, IndexedIndirectX;
    0xE4 => CPX, ZeroPage;       0xE5 => SBC, ZeroPage;
    0xE6 => INC, ZeroPage;       0xE8 => INX, Implied;
    0xE9 => SBC, Immediate;      0xEA => NOP, Implied;
    0xEC => CPX, Absolute;       0xED => SBC, Absolute;
    0xEE => INC, Absolute;

    0xF0 => BEQ, Immediate;      0xF1 => SBC, IndirectIndexedY;
    0xF5 => SBC, ZeroPageX;      0xF6 => INC, ZeroPageX;
    0xF8 => SED, Implied;        0xF9 => SBC, AbsoluteY;
    0xFD => SBC, AbsoluteX;      0xFE => INC, AbsoluteX;
}
