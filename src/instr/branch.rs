//! CBZ/CBNZ, conditional and unconditional branches, BR, and BL.
//!
//! Every variant here fully owns the program counter update — the
//! engine only auto-advances `pc` for instructions that don't.

use super::{reg_index, InstrError, Instr, LABEL, REG};
use crate::machine::flags::Condition;
use crate::machine::registers::LR;
use crate::machine::Machine;
use once_cell::sync::Lazy;
use regex::Regex;

static CBZ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^CBZ\s+({REG})\s*,\s*{LABEL}$")).unwrap());
static CBNZ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^CBNZ\s+({REG})\s*,\s*{LABEL}$")).unwrap());
static BCOND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^B\.(EQ|NE|LT|LE|GT|GE|LO|LS|HI|HS)\s+{LABEL}$")).unwrap()
});
static B_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^B\s+{LABEL}$")).unwrap());
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^BR\s+({REG})$")).unwrap());
static BL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^BL\s+{LABEL}$")).unwrap());

fn resolve_label(machine: &Machine, name: &str, raw: &str) -> Result<usize, InstrError> {
    machine
        .label_line(name)
        .ok_or_else(|| InstrError::UnknownLabel {
            label: name.to_string(),
            raw: raw.to_string(),
        })
}

pub fn parse_cbz(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let caps = CBZ_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rt = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let target = resolve_label(machine, &caps[2], raw)?;
    Ok(Instr::Cbz { rt, target })
}

pub fn parse_cbnz(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let caps = CBNZ_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rt = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let target = resolve_label(machine, &caps[2], raw)?;
    Ok(Instr::Cbnz { rt, target })
}

pub fn parse_bcond(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let caps = BCOND_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let cond = Condition::from_mnemonic(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let target = resolve_label(machine, &caps[2], raw)?;
    Ok(Instr::Bcond { cond, target })
}

pub fn parse_b(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let caps = B_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let target = resolve_label(machine, &caps[1], raw)?;
    Ok(Instr::B { target })
}

pub fn parse_br(raw: &str) -> Result<Instr, InstrError> {
    let caps = BR_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let register = caps[1].to_string();
    let rn = reg_index(&register).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    Ok(Instr::Br {
        rn,
        register,
        raw: raw.to_string(),
    })
}

pub fn parse_bl(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let caps = BL_RE
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let target = resolve_label(machine, &caps[1], raw)?;
    Ok(Instr::Bl { target })
}

pub fn execute_cbz(machine: &mut Machine, rt: u8, target: usize) -> Result<(), InstrError> {
    if machine.x(rt) == 0 {
        machine.pc = target as i64;
    } else {
        machine.advance();
    }
    Ok(())
}

pub fn execute_cbnz(machine: &mut Machine, rt: u8, target: usize) -> Result<(), InstrError> {
    if machine.x(rt) != 0 {
        machine.pc = target as i64;
    } else {
        machine.advance();
    }
    Ok(())
}

pub fn execute_bcond(machine: &mut Machine, cond: Condition, target: usize) -> Result<(), InstrError> {
    if cond.holds(machine.flags) {
        machine.pc = target as i64;
    } else {
        machine.advance();
    }
    Ok(())
}

pub fn execute_b(machine: &mut Machine, target: usize) -> Result<(), InstrError> {
    machine.pc = target as i64;
    Ok(())
}

pub fn execute_br(machine: &mut Machine, rn: u8, register: &str, raw: &str) -> Result<(), InstrError> {
    let destination = machine.x(rn);
    if destination < 0 || destination as usize >= machine.instructions.len() {
        return Err(InstrError::InvalidBranchTarget {
            register: register.to_string(),
            raw: raw.to_string(),
        });
    }
    machine.pc = destination;
    Ok(())
}

pub fn execute_bl(machine: &mut Machine, target: usize) -> Result<(), InstrError> {
    machine.set_x(LR, machine.pc + 1);
    machine.pc = target as i64;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn machine_with_label() -> Machine {
        let mut labels = HashMap::new();
        labels.insert("Loop".to_string(), 3usize);
        Machine::new(vec!["".to_string(); 5], labels)
    }

    #[test]
    fn cbz_branches_when_register_is_zero() {
        let mut m = machine_with_label();
        m.set_x(9, 0);
        parse_cbz("CBZ X9, Loop", &m).unwrap().execute(&mut m).unwrap();
        assert_eq!(m.pc, 3);
    }

    #[test]
    fn cbz_falls_through_when_register_is_nonzero() {
        let mut m = machine_with_label();
        m.set_x(9, 1);
        parse_cbz("CBZ X9, Loop", &m).unwrap().execute(&mut m).unwrap();
        assert_eq!(m.pc, 1);
    }

    #[test]
    fn bl_links_return_address_then_jumps() {
        let mut m = machine_with_label();
        m.pc = 2;
        parse_bl("BL Loop", &m).unwrap().execute(&mut m).unwrap();
        assert_eq!(m.x(LR), 3);
        assert_eq!(m.pc, 3);
    }

    #[test]
    fn br_rejects_out_of_range_target() {
        let mut m = machine_with_label();
        m.set_x(30, 999);
        let instr = parse_br("BR LR").unwrap();
        assert!(matches!(
            instr.execute(&mut m),
            Err(InstrError::InvalidBranchTarget { .. })
        ));
    }

    #[test]
    fn br_jumps_to_valid_register_held_target() {
        let mut m = machine_with_label();
        m.set_x(30, 3);
        let instr = parse_br("BR LR").unwrap();
        instr.execute(&mut m).unwrap();
        assert_eq!(m.pc, 3);
    }

    #[test]
    fn unknown_label_is_reported_by_name() {
        let m = machine_with_label();
        let err = parse_b("B missing", &m).unwrap_err();
        match err {
            InstrError::UnknownLabel { label, raw } => {
                assert_eq!(label, "missing");
                assert_eq!(raw, "B missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
