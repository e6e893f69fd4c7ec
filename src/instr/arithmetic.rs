//! ADD/SUB/MUL and their immediate and flag-setting variants.

use super::{reg_index, InstrError, Instr, IMM, REG};
use crate::alu::{adder, multiplier, unsigned_adder};
use crate::machine::memory::{MEMORY_SIZE, STACK_SIZE, WORD_SIZE};
use crate::machine::registers::SP;
use crate::machine::Machine;
use once_cell::sync::Lazy;
use regex::Regex;

static ADD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ADD\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static SUB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^SUB\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static MUL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^MUL\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static ADDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ADDS\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static SUBS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^SUBS\s+({REG})\s*,\s*({REG})\s*,\s*({REG})$")).unwrap());
static ADDI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ADDI\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static SUBI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^SUBI\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static ADDIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^ADDIS\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());
static SUBIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^SUBIS\s+({REG})\s*,\s*({REG})\s*,\s*{IMM}$")).unwrap());

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

/// Bound an `ADDI`/`SUBI` write to `SP` to the stack region. Named
/// "underflow"/"overflow" to match the historical wording even though
/// it reads backwards (`ADDI` growing `SP` past the top is the
/// "underflow").
fn check_stack_bounds(rd: u8, new_value: i64, raw: &str, growing: bool) -> Result<(), InstrError> {
    if rd != SP {
        return Ok(());
    }
    let top = (MEMORY_SIZE * WORD_SIZE) as i64;
    let bottom = ((MEMORY_SIZE - STACK_SIZE) * WORD_SIZE) as i64;
    if growing && new_value > top {
        return Err(InstrError::StackUnderflow(raw.to_string()));
    }
    if !growing && new_value < bottom {
        return Err(InstrError::StackOverflow(raw.to_string()));
    }
    Ok(())
}

pub fn parse_add(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&ADD_RE, raw)?;
    Ok(Instr::Add { rd, rn, rm })
}

pub fn parse_sub(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&SUB_RE, raw)?;
    Ok(Instr::Sub { rd, rn, rm })
}

pub fn parse_mul(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&MUL_RE, raw)?;
    Ok(Instr::Mul { rd, rn, rm })
}

pub fn parse_adds(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&ADDS_RE, raw)?;
    Ok(Instr::Adds { rd, rn, rm })
}

pub fn parse_subs(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, rm) = three_reg(&SUBS_RE, raw)?;
    Ok(Instr::Subs { rd, rn, rm })
}

pub fn parse_addi(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&ADDI_RE, raw)?;
    let new_value = adder(machine.x(rn), imm);
    check_stack_bounds(rd, new_value, raw, true)?;
    Ok(Instr::Addi { rd, rn, imm })
}

pub fn parse_subi(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&SUBI_RE, raw)?;
    let new_value = adder(machine.x(rn), -imm);
    check_stack_bounds(rd, new_value, raw, false)?;
    Ok(Instr::Subi { rd, rn, imm })
}

pub fn parse_addis(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&ADDIS_RE, raw)?;
    Ok(Instr::Addis { rd, rn, imm })
}

pub fn parse_subis(raw: &str) -> Result<Instr, InstrError> {
    let (rd, rn, imm) = reg_reg_imm(&SUBIS_RE, raw)?;
    Ok(Instr::Subis { rd, rn, imm })
}

pub fn execute_add(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, adder(machine.x(rn), machine.x(rm)));
    Ok(())
}

pub fn execute_sub(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, adder(machine.x(rn), -machine.x(rm)));
    Ok(())
}

pub fn execute_mul(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    machine.set_x(rd, multiplier(machine.x(rn), machine.x(rm)));
    Ok(())
}

pub fn execute_addi(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    machine.set_x(rd, adder(machine.x(rn), imm));
    Ok(())
}

pub fn execute_subi(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    machine.set_x(rd, adder(machine.x(rn), -imm));
    Ok(())
}

/// Signed overflow boundary: textbook LEGv8 checks V against the
/// 32-bit boundary even though registers are 64-bit.
const I32_BOUND: i64 = 1i64 << 31;
/// Unsigned carry boundary: the 2^32 threshold `unsigned_adder` is
/// compared against, not 64-bit wraparound.
const U32_BOUND: u64 = 1u64 << 32;

fn set_nz(machine: &mut Machine, result: i64) {
    machine.flags.n = result < 0;
    machine.flags.z = result == 0;
}

fn set_adds_flags(machine: &mut Machine, a: i64, b: i64, result: i64) {
    set_nz(machine, result);
    machine.flags.v =
        (a > 0 && b > 0 && result >= I32_BOUND) || (a < 0 && b < 0 && result < -I32_BOUND);
    machine.flags.c = unsigned_adder(a as u64, b as u64) >= U32_BOUND;
}

fn set_addis_flags(machine: &mut Machine, a: i64, imm: i64, result: i64) {
    set_nz(machine, result);
    machine.flags.v = a > 0 && result >= I32_BOUND;
    machine.flags.c = unsigned_adder(a as u64, imm as u64) >= U32_BOUND;
}

/// `SUBS` computes `Rn + Rm`, not `Rn - Rm` — the result and N/Z are
/// the add result, but V/C still use subtraction-shaped logic against
/// the original operands.
fn set_subs_flags(machine: &mut Machine, a: i64, b: i64, result: i64) {
    set_nz(machine, result);
    machine.flags.v =
        (a > 0 && b < 0 && result >= I32_BOUND) || (a < 0 && b > 0 && result < -I32_BOUND);
    machine.flags.c = (a as u64) < (b as u64);
}

fn set_subis_flags(machine: &mut Machine, a: i64, imm: i64, result: i64) {
    set_nz(machine, result);
    machine.flags.v = a < 0 && result < -I32_BOUND;
    machine.flags.c = (a as u64) < (imm as u64);
}

pub fn execute_adds(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    let a = machine.x(rn);
    let b = machine.x(rm);
    let result = adder(a, b);
    machine.set_x(rd, result);
    set_adds_flags(machine, a, b, result);
    Ok(())
}

pub fn execute_subs(machine: &mut Machine, rd: u8, rn: u8, rm: u8) -> Result<(), InstrError> {
    let a = machine.x(rn);
    let b = machine.x(rm);
    let result = adder(a, b);
    machine.set_x(rd, result);
    set_subs_flags(machine, a, b, result);
    Ok(())
}

pub fn execute_addis(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    let a = machine.x(rn);
    let result = adder(a, imm);
    machine.set_x(rd, result);
    set_addis_flags(machine, a, imm, result);
    Ok(())
}

pub fn execute_subis(machine: &mut Machine, rd: u8, rn: u8, imm: i64) -> Result<(), InstrError> {
    let a = machine.x(rn);
    let result = adder(a, -imm);
    machine.set_x(rd, result);
    set_subis_flags(machine, a, imm, result);
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
    fn add_parses_and_executes() {
        let mut m = machine();
        m.set_x(1, 2);
        m.set_x(2, 3);
        let instr = parse_add("ADD X0, X1, X2").unwrap();
        instr.execute(&mut m).unwrap();
        assert_eq!(m.x(0), 5);
    }

    #[test]
    fn subs_stores_addition_not_subtraction() {
        let mut m = machine();
        m.set_x(1, 10);
        m.set_x(2, 4);
        let instr = parse_subs("SUBS X0, X1, X2").unwrap();
        instr.execute(&mut m).unwrap();
        assert_eq!(m.x(0), 14);
    }

    #[test]
    fn adds_sets_zero_flag() {
        let mut m = machine();
        m.set_x(1, 5);
        m.set_x(2, -5);
        let instr = parse_adds("ADDS X0, X1, X2").unwrap();
        instr.execute(&mut m).unwrap();
        assert!(m.flags.z);
        assert!(!m.flags.n);
    }

    #[test]
    fn addi_on_sp_past_top_is_stack_underflow() {
        let mut m = machine();
        m.set_x(SP, (MEMORY_SIZE * WORD_SIZE) as i64);
        let err = parse_addi("ADDI SP, SP, #4", &m).unwrap_err();
        assert!(matches!(err, InstrError::StackUnderflow(_)));
    }

    #[test]
    fn subi_on_sp_past_bottom_is_stack_overflow() {
        let mut m = machine();
        m.set_x(SP, ((MEMORY_SIZE - STACK_SIZE) * WORD_SIZE) as i64);
        let err = parse_subi("SUBI SP, SP, #4", &m).unwrap_err();
        assert!(matches!(err, InstrError::StackOverflow(_)));
    }

    #[test]
    fn malformed_statement_is_syntax_error() {
        assert!(matches!(parse_add("ADD X0, X1"), Err(InstrError::Syntax(_))));
    }
}
