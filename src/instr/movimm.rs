//! MOVZ/MOVK: load a 16-bit immediate into one of the four 16-bit
//! lanes of a register, zeroing or preserving the rest.

use super::{reg_index, InstrError, Instr, REG};
use crate::machine::Machine;
use once_cell::sync::Lazy;
use regex::Regex;

static MOVZ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^MOVZ\s+({REG})\s*,\s*(\d+)\s*,\s*LSL\s+(\d+)$")).unwrap()
});
static MOVK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^MOVK\s+({REG})\s*,\s*(\d+)\s*,\s*LSL\s+(\d+)$")).unwrap()
});

fn reg_imm16_shift(re: &Regex, raw: &str) -> Result<(u8, u32, u32), InstrError> {
    let caps = re
        .captures(raw)
        .ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let rd = reg_index(&caps[1]).ok_or_else(|| InstrError::Syntax(raw.to_string()))?;
    let imm: u32 = caps[2]
        .parse()
        .map_err(|_| InstrError::Syntax(raw.to_string()))?;
    let lane: u32 = caps[3]
        .parse()
        .map_err(|_| InstrError::Syntax(raw.to_string()))?;
    if imm > 0xffff || lane > 3 {
        return Err(InstrError::Syntax(raw.to_string()));
    }
    Ok((rd, imm, lane * 16))
}

pub fn parse_movz(raw: &str) -> Result<Instr, InstrError> {
    let (rd, imm, shift) = reg_imm16_shift(&MOVZ_RE, raw)?;
    Ok(Instr::Movz { rd, imm, shift })
}

pub fn parse_movk(raw: &str) -> Result<Instr, InstrError> {
    let (rd, imm, shift) = reg_imm16_shift(&MOVK_RE, raw)?;
    Ok(Instr::Movk { rd, imm, shift })
}

pub fn execute_movz(machine: &mut Machine, rd: u8, imm: u32, shift: u32) -> Result<(), InstrError> {
    machine.set_x(rd, (imm as i64) << shift);
    Ok(())
}

pub fn execute_movk(machine: &mut Machine, rd: u8, imm: u32, shift: u32) -> Result<(), InstrError> {
    let mask = !(0xffffu64 << shift);
    let current = machine.x(rd) as u64;
    let merged = (current & mask) | ((imm as u64) << shift);
    machine.set_x(rd, merged as i64);
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
    fn movz_zeroes_the_rest_of_the_register() {
        let mut m = machine();
        m.set_x(0, -1);
        parse_movz("MOVZ X0, 20, LSL 0")
            .unwrap()
            .execute(&mut m)
            .unwrap();
        assert_eq!(m.x(0), 20);
    }

    #[test]
    fn movk_preserves_other_lanes() {
        let mut m = machine();
        m.set_x(0, 0x0000_0000_0000_00ff);
        parse_movk("MOVK X0, 1, LSL 1")
            .unwrap()
            .execute(&mut m)
            .unwrap();
        assert_eq!(m.x(0), 0x0001_00ff);
    }

    #[test]
    fn movz_rejects_non_lane_shift() {
        assert!(matches!(
            parse_movz("MOVZ X0, 20, LSL 4"),
            Err(InstrError::Syntax(_))
        ));
    }
}
