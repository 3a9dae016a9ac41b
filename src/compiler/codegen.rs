// Intermediate Code Generator
//
// Translates instruction lines into the intermediate instruction table in a
// single scan. IF and ELSE leave their instruction numbers on a resolution
// stack; the matching ENDIF pops them and backpatches the jump targets.
//
// Numbering: every instruction line consumes one number, starting at 1, even
// when a diagnostic prevents it from emitting anything. Labels, ENDIF and END
// consume none.

use crate::compiler::error::{CompilerError, Diagnostic, DiagnosticKind, Table};
use crate::compiler::ir::*;
use crate::compiler::labels::LabelTable;
use crate::compiler::lexer::SourceLine;
use crate::compiler::symbols::{split_index, SymbolTable};
use crate::config::Config;
use crate::memory::{register_address, Memory};
use indexmap::IndexMap;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mnemonic {
    Mov,
    Add,
    Sub,
    Mul,
    Read,
    Print,
    Jump,
    If,
    Else,
    EndIf,
    End,
}

lazy_static! {
    static ref MNEMONICS: IndexMap<&'static str, Mnemonic> = {
        let mut m = IndexMap::new();
        m.insert("MOV", Mnemonic::Mov);
        m.insert("ADD", Mnemonic::Add);
        m.insert("SUB", Mnemonic::Sub);
        m.insert("MUL", Mnemonic::Mul);
        m.insert("READ", Mnemonic::Read);
        m.insert("PRINT", Mnemonic::Print);
        m.insert("JUMP", Mnemonic::Jump);
        m.insert("IF", Mnemonic::If);
        m.insert("ELSE", Mnemonic::Else);
        m.insert("ENDIF", Mnemonic::EndIf);
        m.insert("END", Mnemonic::End);
        m
    };
}

/// Operands are separated by commas and/or whitespace
fn split_operands(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Everything the generator produces
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub instructions: InstructionTable,
    pub labels: LabelTable,
    /// Literal value -> pool address
    pub literals: IndexMap<Word, usize>,
    pub memory: Memory,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generation context
pub struct CodeGen<'a> {
    config: &'a Config,
    symbols: &'a SymbolTable,
    memory: Memory,
    labels: LabelTable,
    instructions: InstructionTable,
    /// Open IF/ELSE instruction numbers, innermost last
    stack: Vec<InstrNo>,
    literals: IndexMap<Word, usize>,
    next_literal: usize,
    diagnostics: Vec<Diagnostic>,
    next_number: InstrNo,
    current_line: usize,
}

impl<'a> CodeGen<'a> {
    /// `memory` is the image already holding the declared constants
    pub fn new(config: &'a Config, symbols: &'a SymbolTable, memory: Memory) -> Self {
        CodeGen {
            config,
            symbols,
            memory,
            labels: LabelTable::new(config.max_labels),
            instructions: InstructionTable::new(),
            stack: Vec::new(),
            literals: IndexMap::new(),
            next_literal: symbols.next_address(),
            diagnostics: Vec::new(),
            next_number: 1,
            current_line: 0,
        }
    }

    pub fn generate(mut self, lines: &[SourceLine]) -> Result<Generated, CompilerError> {
        let mut ended = false;

        for line in lines {
            self.current_line = line.line;

            if line.is_label() {
                self.define_label(line)?;
                continue;
            }

            let name = match line.first_token() {
                Some(name) => name,
                None => continue,
            };

            match MNEMONICS.get(name).copied() {
                Some(Mnemonic::End) => {
                    debug!("END at line {}", line.line);
                    ended = true;
                    break;
                }
                Some(Mnemonic::EndIf) => self.generate_endif(),
                Some(mnemonic) => {
                    let number = self.next_number;
                    self.next_number += 1;
                    self.generate_instruction(mnemonic, number, line.rest())?;
                }
                None => {
                    self.next_number += 1;
                    self.report(DiagnosticKind::UnknownInstruction(name.to_string()));
                }
            }
        }

        if !ended {
            self.report(DiagnosticKind::MissingEnd);
        }
        for open in self.stack.clone() {
            self.report(DiagnosticKind::UnclosedBlock(open));
        }

        info!(
            "Generated {} instructions, {} labels, {} literals, {} diagnostics",
            self.instructions.len(),
            self.labels.len(),
            self.literals.len(),
            self.diagnostics.len()
        );

        Ok(Generated {
            instructions: self.instructions,
            labels: self.labels,
            literals: self.literals,
            memory: self.memory,
            diagnostics: self.diagnostics,
        })
    }

    fn report(&mut self, kind: DiagnosticKind) {
        let diag = Diagnostic::new(self.current_line, kind);
        warn!("{}", diag);
        self.diagnostics.push(diag);
    }

    fn define_label(&mut self, line: &SourceLine) -> Result<(), CompilerError> {
        let name = line.text[..line.text.len() - 1].trim();
        if name.is_empty() {
            self.report(DiagnosticKind::EmptyLabel);
            return Ok(());
        }
        if !self.labels.define(name, self.next_number)? {
            self.report(DiagnosticKind::DuplicateLabel(name.to_string()));
        }
        Ok(())
    }

    fn emit(&mut self, number: InstrNo, operation: Operation) -> Result<(), CompilerError> {
        if self.instructions.len() >= self.config.max_instructions {
            return Err(CompilerError::TableExhausted(
                Table::Instruction,
                self.config.max_instructions,
            ));
        }
        let instruction = Instruction::new(number, operation);
        debug!("emit {}", instruction);
        self.instructions.push(instruction);
        Ok(())
    }

    fn open_block(&mut self, number: InstrNo) -> Result<(), CompilerError> {
        if self.stack.len() >= self.config.max_nesting {
            return Err(CompilerError::NestingTooDeep(
                self.config.max_nesting,
                self.current_line,
            ));
        }
        self.stack.push(number);
        Ok(())
    }

    fn generate_instruction(
        &mut self,
        mnemonic: Mnemonic,
        number: InstrNo,
        params: &str,
    ) -> Result<(), CompilerError> {
        let operands = split_operands(params);
        let expected = match mnemonic {
            Mnemonic::Mov => 2,
            Mnemonic::Add | Mnemonic::Sub | Mnemonic::Mul | Mnemonic::If => 3,
            Mnemonic::Read | Mnemonic::Print | Mnemonic::Jump => 1,
            Mnemonic::Else => 0,
            Mnemonic::EndIf | Mnemonic::End => return Ok(()),
        };
        if operands.len() != expected {
            let name = MNEMONICS
                .iter()
                .find(|(_, m)| **m == mnemonic)
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            self.report(DiagnosticKind::MalformedOperands(name, params.to_string()));
            return Ok(());
        }

        let operation = match mnemonic {
            Mnemonic::Mov => {
                let dest = self.resolve_dest(operands[0])?;
                let src = self.resolve_source(operands[1])?;
                // Opcode 2 loads a register, opcode 1 stores to memory
                if register_address(operands[0]).is_some() {
                    Operation::MovRegToMem { dest, src }
                } else {
                    Operation::MovMemToReg { dest, src }
                }
            }
            Mnemonic::Add | Mnemonic::Sub | Mnemonic::Mul => {
                let op = match mnemonic {
                    Mnemonic::Add => ArithOp::Add,
                    Mnemonic::Sub => ArithOp::Sub,
                    _ => ArithOp::Mul,
                };
                Operation::Arith {
                    op,
                    dest: self.resolve_dest(operands[0])?,
                    lhs: self.resolve_source(operands[1])?,
                    rhs: self.resolve_source(operands[2])?,
                }
            }
            Mnemonic::Read => Operation::Read {
                dest: self.resolve_dest(operands[0])?,
            },
            Mnemonic::Print => Operation::Print {
                src: self.resolve_source(operands[0])?,
            },
            Mnemonic::Jump => {
                let target = match self.labels.lookup(operands[0]) {
                    Some(target) => target,
                    None => {
                        self.report(DiagnosticKind::UnresolvedLabel(operands[0].to_string()));
                        0
                    }
                };
                Operation::Jump {
                    target: Target::Resolved(target),
                }
            }
            Mnemonic::If => {
                let cmp = match Comparison::from_mnemonic(operands[1]) {
                    Some(cmp) => cmp,
                    None => {
                        self.report(DiagnosticKind::UnknownComparison(operands[1].to_string()));
                        return Ok(());
                    }
                };
                let lhs = self.resolve_source(operands[0])?;
                let rhs = self.resolve_source(operands[2])?;
                self.open_block(number)?;
                Operation::If {
                    lhs,
                    rhs,
                    cmp,
                    on_false: Target::Unresolved,
                }
            }
            Mnemonic::Else => {
                self.open_block(number)?;
                Operation::Jump {
                    target: Target::Unresolved,
                }
            }
            Mnemonic::EndIf | Mnemonic::End => return Ok(()),
        };

        self.emit(number, operation)
    }

    /// Close the innermost open block. `next_number` is the number of the
    /// instruction that follows the ENDIF.
    fn generate_endif(&mut self) {
        let after_endif = self.next_number;
        let top = match self.stack.pop() {
            Some(top) => top,
            None => {
                self.report(DiagnosticKind::UnmatchedEndif);
                return;
            }
        };

        match self.backpatch(top, after_endif) {
            Some(Opcode::Jump) => {
                // ELSE: its IF sits directly below and resumes after the ELSE jump
                match self.stack.last().copied() {
                    Some(below) if self.is_open_if(below) => {
                        self.stack.pop();
                        self.backpatch(below, top + 1);
                        debug!(
                            "ENDIF closes IF {} / ELSE {} -> {}",
                            below, top, after_endif
                        );
                    }
                    _ => self.report(DiagnosticKind::UnmatchedElse(top)),
                }
            }
            Some(_) => debug!("ENDIF closes IF {} -> {}", top, after_endif),
            None => warn!("ENDIF: no instruction numbered {}", top),
        }
    }

    /// Point the open jump slot of instruction `number` at `target`
    fn backpatch(&mut self, number: InstrNo, target: InstrNo) -> Option<Opcode> {
        let instruction = self.instructions.by_number_mut(number)?;
        match &mut instruction.operation {
            Operation::Jump { target: slot } => *slot = Target::Resolved(target),
            Operation::If { on_false, .. } => *on_false = Target::Resolved(target),
            _ => return None,
        }
        Some(instruction.opcode())
    }

    fn is_open_if(&self, number: InstrNo) -> bool {
        matches!(
            self.instructions.by_number(number).map(|inst| &inst.operation),
            Some(Operation::If {
                on_false: Target::Unresolved,
                ..
            })
        )
    }

    /// Resolve an operand that is read from
    fn resolve_source(&mut self, token: &str) -> Result<Operand, CompilerError> {
        if let Ok(value) = token.parse::<Word>() {
            return Ok(Operand::Address(self.intern_literal(value)?));
        }
        Ok(self.resolve_name(token))
    }

    /// Resolve an operand that is written to; literals are rejected
    fn resolve_dest(&mut self, token: &str) -> Result<Operand, CompilerError> {
        if token.parse::<Word>().is_ok() {
            self.report(DiagnosticKind::LiteralDestination(token.to_string()));
            return Ok(Operand::Unresolved(token.to_string()));
        }
        Ok(self.resolve_name(token))
    }

    fn resolve_name(&mut self, token: &str) -> Operand {
        if let Some(address) = register_address(token) {
            return Operand::Address(address);
        }

        let (name, index) = match split_index(token.trim_matches('*')) {
            Some(parts) => parts,
            None => {
                self.report(DiagnosticKind::UnresolvedIdentifier(token.to_string()));
                return Operand::Unresolved(token.to_string());
            }
        };

        let symbols = self.symbols;
        let symbol = match symbols.lookup(name) {
            Some(symbol) => symbol,
            None => {
                self.report(DiagnosticKind::UnresolvedIdentifier(name.to_string()));
                return Operand::Unresolved(token.to_string());
            }
        };

        match index {
            None => Operand::Address(symbol.address),
            Some(index) if index < symbol.cells() => Operand::Address(symbol.address + index),
            Some(index) => {
                self.report(DiagnosticKind::IndexOutOfBounds(
                    name.to_string(),
                    index,
                    symbol.cells(),
                ));
                Operand::Unresolved(token.to_string())
            }
        }
    }

    /// Place a literal in the pool after the declared symbols
    fn intern_literal(&mut self, value: Word) -> Result<usize, CompilerError> {
        if let Some(&address) = self.literals.get(&value) {
            return Ok(address);
        }
        let address = self.next_literal;
        self.memory
            .write(address, value)
            .ok_or(CompilerError::MemoryExhausted(self.memory.size()))?;
        debug!("literal {} at {}", value, address);
        self.literals.insert(value, address);
        self.next_literal += 1;
        Ok(address)
    }
}

#[cfg(test)]
#[path = "codegen_tests.rs"]
mod tests;
