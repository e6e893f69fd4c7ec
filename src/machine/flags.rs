//! Condition flags
//!
//! N/Z/V/C are updated only by the `S`-suffixed arithmetic instructions
//! and read only by conditional branches; nothing else observes or
//! mutates them, so there is no need to guard them behind a lock the
//! way `Memory` is.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub n: bool,
    pub z: bool,
    pub v: bool,
    pub c: bool,
}

/// The ten conditions `B.cond` can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Lo,
    Ls,
    Hi,
    Hs,
}

impl Condition {
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        use Condition::*;
        Some(match s {
            "EQ" => Eq,
            "NE" => Ne,
            "LT" => Lt,
            "LE" => Le,
            "GT" => Gt,
            "GE" => Ge,
            "LO" => Lo,
            "LS" => Ls,
            "HI" => Hi,
            "HS" => Hs,
            _ => return None,
        })
    }

    /// Whether this condition holds against the given flags.
    pub fn holds(self, flags: Flags) -> bool {
        use Condition::*;
        match self {
            Eq => flags.z,
            Ne => !flags.z,
            Lt => flags.n != flags.v,
            Le => !(!flags.z && flags.n == flags.v),
            Gt => !flags.z && flags.n == flags.v,
            Ge => flags.n == flags.v,
            Lo => !flags.c,
            Ls => !(!flags.z && flags.c),
            Hi => !flags.z && flags.c,
            Hs => flags.c,
        }
    }
}
