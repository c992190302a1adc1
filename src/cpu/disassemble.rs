//! Mnemonic + operand text formatter.
//!
//! Consumes the instruction table (`instructions::decode_bytes`), never
//! the interpreter — this is debug/trace tooling, not part of the hot
//! execution path.

use super::instructions::{AddressingMode, DecodedInstruction, Group};

/// Format `instr` (already decoded at program counter `pc`) as assembly
/// text. Branch targets are resolved to an absolute address
/// (`pc + 2 + offset`), matching how a real disassembler would annotate
/// them rather than showing the raw relative byte.
pub fn disassemble(pc: u16, instr: &DecodedInstruction) -> String {
    let mnemonic = format!("{:?}", instr.descriptor.mnemonic);
    let operand = match instr.descriptor.mode {
        AddressingMode::Implied => String::new(),
        AddressingMode::Immediate if instr.descriptor.group == Group::Branch => {
            let offset = instr.operand_lo.unwrap_or(0) as i8;
            let target = pc.wrapping_add(2).wrapping_add(offset as u16);
            format!("${target:04X}")
        }
        AddressingMode::Immediate => format!("#${:02X}", instr.operand_lo.unwrap_or(0)),
        AddressingMode::ZeroPage => format!("${:02X}", instr.operand_lo.unwrap_or(0)),
        AddressingMode::ZeroPageX => format!("${:02X},X", instr.operand_lo.unwrap_or(0)),
        AddressingMode::ZeroPageY => format!("${:02X},Y", instr.operand_lo.unwrap_or(0)),
        AddressingMode::Absolute => format!("${:04X}", instr.word_operand()),
        AddressingMode::AbsoluteX => format!("${:04X},X", instr.word_operand()),
        AddressingMode::AbsoluteY => format!("${:04X},Y", instr.word_operand()),
        AddressingMode::Indirect => format!("(${:04X})", instr.word_operand()),
        AddressingMode::IndexedIndirectX => format!("(${:02X},X)", instr.operand_lo.unwrap_or(0)),
        AddressingMode::IndirectIndexedY => format!("(${:02X}),Y", instr.operand_lo.unwrap_or(0)),
    };
    if operand.is_empty() {
        mnemonic
    } else {
        format!("{mnemonic} {operand}")
    }
}

#[cfg(test)]
mod tests {
    use super::super::instructions::decode_bytes;
    use super::*;

    #[test]
    fn formats_immediate_load() {
        let instr = decode_bytes(&[0xA9, 0xCF, 0x00]).unwrap(); // LDA #$CF
        assert_eq!(disassemble(0x0800, &instr), "LDA #$CF");
    }

    #[test]
    fn resolves_branch_target() {
        // BEQ with offset +2 at $20FE -> target $20FE + 2 + 2 = $2102
        let instr = decode_bytes(&[0xF0, 0x02, 0x00]).unwrap();
        assert_eq!(disassemble(0x20FE, &instr), "BEQ $2102");
    }

    #[test]
    fn formats_absolute_store() {
        let instr = decode_bytes(&[0x8D, 0x17, 0xD4]).unwrap(); // STA $D417
        assert_eq!(disassemble(0x0802, &instr), "STA $D417");
    }
}
