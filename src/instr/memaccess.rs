//! LDUR/STUR and the halfword/byte variants, plus the recognized but
//! unsupported LDXR/STXR pair.

use super::{reg_index, InstrError, Instr, IMM, REG};
use crate::machine::Machine;
use once_cell::sync::Lazy;
use regex::Regex;

static LDUR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^LDUR\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static STUR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^STUR\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static LDURH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^LDURH\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static STURH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^STURH\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static LDURB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^LDURB\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static STURB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^STURB\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static LDXR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^LDXR\s+({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});
static STXR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^STXR\s+({REG})\s*,\s*({REG})\s*,\s*\[\s*({REG})\s*,\s*{IMM}\s*\]$")).unwrap()
});

fn mem_operands(re: &Regex, raw: &str) -> Result<(u8, u8, i64), InstrError> {
    let caps = re
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rt = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rn = reg_index(&caps[2]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let offset: i64 = caps[3]
        .parse()
        .map_err(|_| InstrError::Syntax(raw.to_string()))?;
    Ok((rt, rn, offset))
}

pub fn parse_ldur(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&LDUR_RE, raw)?;
    check_alignment(machine, rn, offset, 4, raw)?;
    Ok(Instr::Ldur { rt, rn, offset })
}

pub fn parse_stur(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&STUR_RE, raw)?;
    check_alignment(machine, rn, offset, 4, raw)?;
    Ok(Instr::Stur { rt, rn, offset })
}

pub fn parse_ldurh(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&LDURH_RE, raw)?;
    check_alignment(machine, rn, offset, 2, raw)?;
    Ok(Instr::Ldurh { rt, rn, offset })
}

pub fn parse_sturh(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&STURH_RE, raw)?;
    check_alignment(machine, rn, offset, 2, raw)?;
    Ok(Instr::Sturh { rt, rn, offset })
}

pub fn parse_ldurb(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&LDURB_RE, raw)?;
    Ok(Instr::Ldurb { rt, rn, offset: offset_unused(machine, rn, offset) })
}

pub fn parse_sturb(raw: &str, machine: &Machine) -> Result<Instr, InstrError> {
    let (rt, rn, offset) = mem_operands(&STURB_RE, raw)?;
    Ok(Instr::Sturb { rt, rn, offset: offset_unused(machine, rn, offset) })
}

/// Bytes need no alignment check; this just keeps the same "touch
/// `machine`/`rn` so the signature matches its aligned siblings" shape
/// without pretending there's a constraint to enforce.
fn offset_unused(_machine: &Machine, _rn: u8, offset: i64) -> i64 {
    offset
}

pub fn parse_ldxr(raw: &str) -> Result<Instr, InstrError> {
    if LDXR_RE.is_match(raw) {
        Err(InstrError::Unsupported(raw.to_string()))
    } else {
        Err(InstrError::Syntax(raw.to_string()))
    }
}

pub fn parse_stxr(raw: &str) -> Result<Instr, InstrError> {
    if STXR_RE.is_match(raw) {
        Err(InstrError::Unsupported(raw.to_string()))
    } else {
        Err(InstrError::Syntax(raw.to_string()))
    }
}

fn check_alignment(
    machine: &Machine,
    rn: u8,
    offset: i64,
    required: i64,
    raw: &str,
) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    if address % required != 0 {
        return Err(InstrError::Misaligned(raw.to_string()));
    }
    Ok(())
}

pub fn execute_ldur(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine
        .memory
        .read_word(address)
        .map_err(|_| InstrError::Misaligned(format!("LDUR at {address}")))?;
    machine.set_x(rt, value as i64);
    Ok(())
}

pub fn execute_stur(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine.x(rt) as i32;
    machine
        .memory
        .write_word(address, value)
        .map_err(|_| InstrError::Misaligned(format!("STUR at {address}")))
}

pub fn execute_ldurh(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine
        .memory
        .read_halfword(address)
        .map_err(|_| InstrError::Misaligned(format!("LDURH at {address}")))?;
    machine.set_x(rt, value as i64);
    Ok(())
}

pub fn execute_sturh(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine.x(rt) as i16;
    machine
        .memory
        .write_halfword(address, value)
        .map_err(|_| InstrError::Misaligned(format!("STURH at {address}")))
}

pub fn execute_ldurb(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine
        .memory
        .read_byte(address)
        .map_err(|_| InstrError::Misaligned(format!("LDURB at {address}")))?;
    machine.set_x(rt, value as i64);
    Ok(())
}

pub fn execute_sturb(machine: &mut Machine, rt: u8, rn: u8, offset: i64) -> Result<(), InstrError> {
    let address = machine.x(rn) + offset;
    let value = machine.x(rt) as i8;
    machine
        .memory
        .write_byte(address, value)
        .map_err(|_| InstrError::Misaligned(format!("STURB at {address}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn machine() -> Machine {
        Machine::new(vec![], HashMap::new())
    }

    #[test]
    fn stur_then_ldur_round_trips() {
        let mut m = machine();
        m.set_x(1, 0);
        m.set_x(2, 99);
        parse_stur("STUR X2, [X1, #0]", &m)
            .unwrap()
            .execute(&mut m)
            .unwrap();
        let loaded = parse_ldur("LDUR X3, [X1, #0]", &m).unwrap();
        loaded.execute(&mut m).unwrap();
        assert_eq!(m.x(3), 99);
    }

    #[test]
    fn ldur_rejects_unaligned_address() {
        let mut m = machine();
        m.set_x(1, 1);
        assert!(matches!(
            parse_ldur("LDUR X0, [X1, #0]", &m),
            Err(InstrError::Misaligned(_))
        ));
    }

    #[test]
    fn sturb_sign_extends_on_ldurb() {
        let mut m = machine();
        m.set_x(1, 0);
        m.set_x(2, -1);
        parse_sturb("STURB X2, [X1, #0]", &m)
            .unwrap()
            .execute(&mut m)
            .unwrap();
        let loaded = parse_ldurb("LDURB X3, [X1, #0]", &m).unwrap();
        loaded.execute(&mut m).unwrap();
        assert_eq!(m.x(3), -1);
    }

    #[test]
    fn ldxr_is_recognized_but_unsupported() {
        assert!(matches!(
            parse_ldxr("LDXR X0, [X1, #0]"),
            Err(InstrError::Unsupported(_))
        ));
    }
}
