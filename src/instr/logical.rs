//! AND/ORR/EOR, their immediate forms, and the LSL/LSR shifts.

use super::{reg_index, InstrError, Instr, IMM, REG, SHIFT};
use crate::alu::{logical_and, logical_or, logical_xor};
use crate::machine::Machine;
use once_cell::sync::Lazy;
use regex::Regex;

static AND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^AND\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static ORR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ORR\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static EOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^EOR\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static ANDI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ANDI\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static ORRI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ORRI\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static EORI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^EORI\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static LSL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^LSL\s+({REG})\s*,\s*({REG})\s*,\s*{SHIFT}$")).unwrap());
static LSR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^LSR\s+({REG})\s*,\s*({REG})\s*,\s*{SHIFT}$")).unwrap());

fn three_reg(re: &Regex, raw: &str) -> Result<(u8, u8, u8), InstrError> {
    let caps = re
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rd = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rn = reg_index(&caps[2]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rm = reg_index(&caps[3]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    Ok((rd, rn, rm))
}

fn reg_reg_imm(re: &Regex, raw: &str) -> Result<(u8, u8, i64), InstrError> {
    let caps = re
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rd = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rn = reg_index(&caps[2]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let imm: i64 = caps[3]
        .parse()
        .map_err(|_| InstrError::Syntax(raw.to_string()))?;
    Ok((rd, rn, imm))
}

fn reg_reg_shift(re: &Regex, raw: &str) -> Result<(u8, u8, u32), InstrError> {
    let caps = re
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rd = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rn = reg_index(&caps[2]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let imm: u32 = caps[3]
        .parse()
        .map_err(|_| InstrError::Syntax(raw.to_string()))?;
    Ok((rd, rn, imm))
}

pub fn parse_and(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&AND_RE, raw)?;
    Ok(Instr::And { rd, rn, rm })
}

pub fn parse_orr(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&ORR_RE, raw)?;
    Ok(Instr::Orr { rd, rn, rm })
}

pub fn parse_eor(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&EOR_RE, raw)?;
    Ok(Instr::Eor { rd, rn, rm })
}

pub fn parse_andi(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&ANDI_RE, raw)?;
    Ok(Instr::Andi { rd, rn, imm })
}

pub fn parse_orri(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&ORRI_RE, raw)?;
    Ok(Instr::Orri { rd, rn, imm })
}

pub fn parse_eori(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&EORI_RE, raw)?;
    Ok(Instr::Eori { rd, rn, imm })
}

pub fn parse_lsl(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_shift(&LSL_RE, raw)?;
    Ok(Instr::Lsl { rd, rn, imm })
}

pub fn parse_lsr(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_shift(&LSR_RE, raw)?;
    Ok(Instr::Lsr { rd, rn, imm })
}

pub fn execute_and(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, logical_and(machine.x(rn), machine.x(rm)));
    Ok(())
}

pub fn execute_orr(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, logical_or(machine.x(rn), machine.x(rm)));
    Ok(())
}

pub fn execute_eor(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, logical_xor(machine.x(rn), machine.x(rm)));
    Ok(())
}

pub fn execute_andi(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    machine.set_x(rd, logical_and(machine.x(rn), imm));
    Ok(())
}

pub fn execute_orri(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    machine.set_x(rd, logical_or(machine.x(rn), imm));
    Ok(())
}

pub fn execute_eori(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    machine.set_x(rd, logical_xor(machine.x(rn), imm));
    Ok(())
}

pub fn execute_lsl(machine: &mut Machine, rd: u8, rn: u8, imm: u32) -> Result<(), InstrError> {
    machine.set_x(rd, machine.x(rn).wrapping_shl(imm));
    Ok(())
}

pub fn execute_lsr(machine: &mut Machine, rd: u8, rn: u8, imm: u32) -> Result<(), InstrError> {
    machine.set_x(rd, ((machine.x(rn) as u64).wrapping_shr(imm)) as i64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn machine() -> Machine {
        Machine::new(vec![], HashMap::new())
    }

    #[test]
    fn and_masks_bits() {
        let mut m = machine();
        m.set_x(1, 0b1100);
        m.set_x(2, 0b1010);
        parse_and("AND X0, X1, X2").unwrap().execute(&mut m).unwrap();
        assert_eq!(m.x(0), 0b1000);
    }

    #[test]
    fn lsl_shifts_left() {
        let mut m = machine();
        m.set_x(1, 1);
        parse_lsl("LSL X0, X1, 4").unwrap().execute(&mut m).unwrap();
        assert_eq!(m.x(0), 16);
    }

    #[test]
    fn lsr_shifts_right_without_sign_extension() {
        let mut m = machine();
        m.set_x(1, -1);
        parse_lsr("LSR X0, X1, 60").unwrap().execute(&mut m).unwrap();
        assert_eq!(m.x(0), 0xf);
    }

    #[test]
    fn andi_with_immediate() {
        let mut m = machine();
        m.set_x(1, 0xff);
        parse_andi("ANDI X0, X1, #15")
            .unwrap()
            .execute(&mut m)
            .unwrap();
        assert_eq!(m.x(0), 15);
    }
}
