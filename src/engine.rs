//! Fetch-decode-execute loop
//!
//! Generalizes `Hart::step`'s binary opcode dispatch to mnemonic-token
//! dispatch over the cleaned statement text: the first whitespace-
//! delimited token picks a family parser, the family parser runs its
//! regex syntax check and any state-dependent semantic check, and the
//! resulting `Instr` is executed. A blank statement is a no-op that
//! only advances the program counter.

use crate::instr::{arithmetic, branch, logical, memaccess, movimm, Instr, InstrError};
use crate::machine::Machine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("Invalid instruction type in {0}")]
    UnknownMnemonic(String),
    #[error(transparent)]
    Instr(#[from] InstrError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Failed,
}

#[derive(Debug)]
pub enum Step {
    /// A statement executed successfully; `raw` is its cleaned text
    /// (empty for a blank no-op line).
    Executed { raw: String },
    /// The program counter ran past the last instruction.
    Halted,
    /// A statement failed; the engine does not advance and will not
    /// run any further steps.
    Failed(StepError),
}

pub struct Engine {
    pub machine: Machine,
    pub state: State,
}

impl Engine {
    pub fn new(machine: Machine) -> Self {
        let state = if machine.pc_in_range() {
            State::Running
        } else {
            State::Halted
        };
        Self { machine, state }
    }

    pub fn step(&mut self) -> Step {
        if self.state != State::Running {
            return match self.state {
                State::Halted => Step::Halted,
                _ => unreachable!("step() called on a failed engine"),
            };
        }
        if !self.machine.pc_in_range() {
            self.state = State::Halted;
            return Step::Halted;
        }

        let raw = self.machine.current_statement().to_string();
        if raw.trim().is_empty() {
            self.machine.advance();
            return Step::Executed { raw };
        }

        match dispatch(&raw, &self.machine).and_then(|instr| {
            instr.execute(&mut self.machine).map_err(StepError::from).map(|()| instr)
        }) {
            Ok(instr) => {
                if !instr.is_branch() {
                    self.machine.advance();
                }
                Step::Executed { raw }
            }
            Err(e) => {
                self.state = State::Failed;
                Step::Failed(e)
            }
        }
    }

    /// Run to completion, calling `on_step` after each successfully
    /// executed statement (not called for the terminal `Halted`).
    /// Returns the first error encountered, if any.
    pub fn run(&mut self, mut on_step: impl FnMut(&Machine, &str)) -> Result<(), StepError> {
        loop {
            match self.step() {
                Step::Executed { raw } => on_step(&self.machine, &raw),
                Step::Halted => return Ok(()),
                Step::Failed(e) => return Err(e),
            }
        }
    }
}

fn dispatch(raw: &str, machine: &Machine) -> Result<Instr, StepError> {
    let mnemonic = raw.split_whitespace().next().unwrap_or("");

    if mnemonic.starts_with("B.") {
        return branch::parse_bcond(raw, machine).map_err(StepError::from);
    }

    let result = match mnemonic {
        "ADD" => arithmetic::parse_add(raw),
        "SUB" => arithmetic::parse_sub(raw),
        "MUL" => arithmetic::parse_mul(raw),
        "ADDS" => arithmetic::parse_adds(raw),
        "SUBS" => arithmetic::parse_subs(raw),
        "ADDI" => arithmetic::parse_addi(raw, machine),
        "SUBI" => arithmetic::parse_subi(raw, machine),
        "ADDIS" => arithmetic::parse_addis(raw),
        "SUBIS" => arithmetic::parse_subis(raw),

        "LDUR" => memaccess::parse_ldur(raw, machine),
        "STUR" => memaccess::parse_stur(raw, machine),
        "LDURH" => memaccess::parse_ldurh(raw, machine),
        "STURH" => memaccess::parse_sturh(raw, machine),
        "LDURB" => memaccess::parse_ldurb(raw, machine),
        "STURB" => memaccess::parse_sturb(raw, machine),
        "LDXR" => memaccess::parse_ldxr(raw),
        "STXR" => memaccess::parse_stxr(raw),

        "MOVZ" => movimm::parse_movz(raw),
        "MOVK" => movimm::parse_movk(raw),

        "AND" => logical::parse_and(raw),
        "ORR" => logical::parse_orr(raw),
        "EOR" => logical::parse_eor(raw),
        "ANDI" => logical::parse_andi(raw),
        "ORRI" => logical::parse_orri(raw),
        "EORI" => logical::parse_eori(raw),
        "LSL" => logical::parse_lsl(raw),
        "LSR" => logical::parse_lsr(raw),

        "CBZ" => branch::parse_cbz(raw, machine),
        "CBNZ" => branch::parse_cbnz(raw, machine),
        "B" => branch::parse_b(raw, machine),
        "BR" => branch::parse_br(raw),
        "BL" => branch::parse_bl(raw, machine),

        _ => return Err(StepError::UnknownMnemonic(raw.to_string())),
    };
    result.map_err(StepError::from)
}
