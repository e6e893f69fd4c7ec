//! Register-diff pretty-printer
//!
//! Grounded on the historical `SaveRegisters`/`ShowRegisters` pair: a
//! snapshot is taken before a statement executes, then diffed against
//! the post-execution state and printed with changed registers
//! highlighted, the way `fatih/color` color-codes the register table.
//! `colored` plays that role here.

use crate::machine::registers::{LR, SP, XZR};
use colored::Colorize;

/// Register display names, in print order. `XZR`/`SP`/`LR` get their
/// mnemonic names; everything else is `X<n>`.
fn display_name(n: u8) -> String {
    match n {
        XZR => "XZR".to_string(),
        SP => "SP".to_string(),
        LR => "LR".to_string(),
        n => format!("X{n}"),
    }
}

/// Print all 32 registers, four per row, highlighting any register
/// whose value differs from `before`.
pub fn print_registers(before: &[i64; 32], after: &[i64; 32]) {
    for chunk_start in (0..32).step_by(4) {
        let mut row = Vec::with_capacity(4);
        for n in chunk_start..chunk_start + 4 {
            let name = display_name(n as u8);
            let value = after[n];
            let cell = format!("{name:>4} = {value}");
            row.push(if before[n] != value {
                cell.green().bold().to_string()
            } else {
                cell.normal().to_string()
            });
        }
        println!("{}", row.join("   "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_aliases() {
        assert_eq!(display_name(XZR), "XZR");
        assert_eq!(display_name(SP), "SP");
        assert_eq!(display_name(LR), "LR");
        assert_eq!(display_name(5), "X5");
    }
}
