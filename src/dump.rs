//! Human-readable dump of a compiled program
//!
//! Sections: symbol table, label table, literal pool, intermediate code in
//! both decoded and integer form, then any diagnostics.

use crate::compiler::Program;
use std::fmt::Write;

pub fn render(program: &Program) -> String {
    let mut output = String::new();
    write_program(&mut output, program).expect("writing to a String cannot fail");
    output
}

fn write_program(out: &mut String, program: &Program) -> std::fmt::Result {
    writeln!(out, "=== SYMBOLS ({}) ===", program.symbols.len())?;
    writeln!(out, "{:<12} {:>5} {:>5}", "name", "addr", "size")?;
    for symbol in program.symbols.iter() {
        writeln!(out, "{}", symbol)?;
    }

    writeln!(out)?;
    writeln!(out, "=== LABELS ({}) ===", program.labels.len())?;
    for label in program.labels.iter() {
        writeln!(out, "{}", label)?;
    }

    if !program.literals.is_empty() {
        writeln!(out)?;
        writeln!(out, "=== LITERALS ({}) ===", program.literals.len())?;
        for (value, address) in &program.literals {
            writeln!(out, "{:>6} @ {}", value, address)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "=== CODE ({}) ===", program.instructions.len())?;
    for instruction in &program.instructions {
        let params: Vec<String> = instruction
            .encode_params()
            .iter()
            .map(|p| p.to_string())
            .collect();
        writeln!(
            out,
            "{:<40} | {} {}",
            instruction.to_string(),
            instruction.opcode().code(),
            params.join(" ")
        )?;
    }

    if !program.diagnostics.is_empty() {
        writeln!(out)?;
        writeln!(out, "=== DIAGNOSTICS ({}) ===", program.diagnostics.len())?;
        for diag in &program.diagnostics {
            writeln!(out, "{}", diag)?;
        }
    }
    Ok(())
}
