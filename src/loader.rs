//! Two-pass label extraction
//!
//! The host (`main.rs`) splits the source file into raw statements on
//! `;`; this module's only job is turning that flat list into the
//! instruction list `Machine` executes plus the label → line-index
//! table branches resolve against, mirroring the historical
//! `ExtractLabels` pass: a label occupies its own slot in the
//! instruction list — a label on its own line becomes a no-op
//! statement bound to that slot; a label sharing a line with an
//! instruction binds to that instruction directly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9]*)\s*:\s*(.*)$").unwrap());

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LoaderError {
    #[error("label {0} is defined more than once")]
    DuplicateLabel(String),
}

#[derive(Debug)]
pub struct Program {
    pub instructions: Vec<String>,
    pub labels: HashMap<String, usize>,
}

pub fn load(raw_statements: Vec<String>) -> Result<Program, LoaderError> {
    let mut instructions = Vec::new();
    let mut labels = HashMap::new();

    for raw in raw_statements {
        let trimmed = raw.trim();
        if let Some(caps) = LABEL_RE.captures(trimmed) {
            let name = caps[1].to_string();
            let remainder = caps[2].trim();
            instructions.push(remainder.to_string());
            let index = instructions.len() - 1;
            if labels.insert(name.clone(), index).is_some() {
                return Err(LoaderError::DuplicateLabel(name));
            }
        } else {
            instructions.push(trimmed.to_string());
        }
    }

    Ok(Program { instructions, labels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn label_on_its_own_line_becomes_a_no_op_slot() {
        let program = load(lines(&["ADDI X1, XZR, #1", "Loop:", "SUBI X1, X1, #1"])).unwrap();
        assert_eq!(
            program.instructions,
            vec!["ADDI X1, XZR, #1", "", "SUBI X1, X1, #1"]
        );
        assert_eq!(program.labels["Loop"], 1);
    }

    #[test]
    fn label_sharing_a_line_binds_to_that_instruction() {
        let program = load(lines(&["Loop: SUBI X1, X1, #1"])).unwrap();
        assert_eq!(program.instructions, vec!["SUBI X1, X1, #1"]);
        assert_eq!(program.labels["Loop"], 0);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = load(lines(&["Loop:", "ADD X0, X0, X0", "Loop:", "ADD X0, X0, X0"])).unwrap_err();
        assert_eq!(err, LoaderError::DuplicateLabel("Loop".to_string()));
    }

    #[test]
    fn blank_statements_become_no_op_slots() {
        let program = load(lines(&["", "ADD X0, X0, X0"])).unwrap();
        assert_eq!(program.instructions, vec!["", "ADD X0, X0, X0"]);
    }
}
