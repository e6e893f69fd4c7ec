mod cli;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use legv8sim::engine::{Engine, Step};
use legv8sim::{diff, loader};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(path) = cli.source_file.as_ref() else {
        eprintln!("Error : Missing filename.");
        return ExitCode::FAILURE;
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error : {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut statements: Vec<String> = contents
        .split(';')
        .map(|s| s.trim().to_string())
        .collect();
    if statements.last().map(String::is_empty).unwrap_or(false) {
        statements.pop();
    }

    let program = match loader::load(statements) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error : {e}");
            return ExitCode::FAILURE;
        }
    };

    let machine = legv8sim::Machine::new(program.instructions, program.labels);
    let mut engine = Engine::new(machine);

    let initial = engine.machine.registers.snapshot();
    let mut previous = initial;
    loop {
        match engine.step() {
            Step::Executed { raw } => {
                if !cli.no_log && !raw.trim().is_empty() {
                    println!("{} {}", "Executing:".bold(), raw);
                }
                let current = engine.machine.registers.snapshot();
                if cli.all && !cli.end {
                    diff::print_registers(&previous, &current);
                }
                previous = current;
            }
            Step::Halted => break,
            Step::Failed(e) => {
                eprintln!("Error : {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if cli.end {
        diff::print_registers(&initial, &engine.machine.registers.snapshot());
    }

    ExitCode::SUCCESS
}
