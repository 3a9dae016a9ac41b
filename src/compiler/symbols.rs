// Symbol Table Builder
// Assigns memory addresses to CONST and DATA declarations in declaration order.

use crate::compiler::error::{CompilerError, Diagnostic, DiagnosticKind, Table};
use crate::compiler::ir::Word;
use crate::compiler::lexer::SourceLine;
use crate::memory::{Memory, VARIABLE_MEMORY_START};
use log::{debug, warn};
use std::fmt;

/// Size recorded for a constant
pub const CONST_SIZE: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: usize,
    /// 1 for a scalar, N for an array of N, 0 for a constant
    pub size: usize,
}

impl Symbol {
    /// Cells occupied in memory; constants still take one
    pub fn cells(&self) -> usize {
        self.size.max(1)
    }

    pub fn is_const(&self) -> bool {
        self.size == CONST_SIZE
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_const() {
            write!(f, "{:<12} {:>5} {:>5}", self.name, self.address, "const")
        } else {
            write!(f, "{:<12} {:>5} {:>5}", self.name, self.address, self.size)
        }
    }
}

/// Split `name[K]` into the name and the bracketed number.
/// Returns `None` if the brackets are malformed.
pub fn split_index(token: &str) -> Option<(&str, Option<usize>)> {
    match token.find('[') {
        None => Some((token, None)),
        Some(open) => {
            let inner = token[open + 1..].strip_suffix(']')?;
            let index = inner.parse::<usize>().ok()?;
            Some((&token[..open], Some(index)))
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    capacity: usize,
}

impl SymbolTable {
    pub fn new(capacity: usize) -> Self {
        SymbolTable {
            symbols: Vec::new(),
            capacity,
        }
    }

    /// Address the next declaration will receive; also the first free cell
    pub fn next_address(&self) -> usize {
        match self.symbols.last() {
            Some(last) => last.address + last.cells(),
            None => VARIABLE_MEMORY_START,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// First entry with exactly this name
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|sym| sym.name == name)
    }

    /// Append an entry at the next address
    pub fn declare(
        &mut self,
        name: &str,
        size: usize,
        memory_size: usize,
    ) -> Result<&Symbol, CompilerError> {
        if self.symbols.len() >= self.capacity {
            return Err(CompilerError::TableExhausted(Table::Symbol, self.capacity));
        }

        let address = self.next_address();
        let end = address.checked_add(size.max(1));
        if end.map_or(true, |end| end > memory_size) {
            return Err(CompilerError::MemoryExhausted(memory_size));
        }

        debug!("declare {} at {} (size {})", name, address, size);
        self.symbols.push(Symbol {
            name: name.to_string(),
            address,
            size,
        });
        Ok(&self.symbols[self.symbols.len() - 1])
    }

    /// Handle one line of the declaration section. Problems with the line
    /// itself become diagnostics; only capacity failures are returned.
    pub fn process_declaration(
        &mut self,
        line: &SourceLine,
        memory: &mut Memory,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), CompilerError> {
        let mut report = |kind: DiagnosticKind| {
            let diag = Diagnostic::new(line.line, kind);
            warn!("{}", diag);
            diagnostics.push(diag);
        };

        match line.first_token() {
            Some("CONST") => {
                let (name, value) = match line.tokens.as_slice() {
                    [_, name, value] => (name, value),
                    [_, name, eq, value] if eq == "=" => (name, value),
                    _ => {
                        report(DiagnosticKind::MalformedDeclaration(line.text.clone()));
                        return Ok(());
                    }
                };
                let value = match value.parse::<Word>() {
                    Ok(v) if is_identifier(name) => v,
                    _ => {
                        report(DiagnosticKind::MalformedDeclaration(line.text.clone()));
                        return Ok(());
                    }
                };
                if self.lookup(name).is_some() {
                    report(DiagnosticKind::DuplicateSymbol(name.clone()));
                }
                let address = self.declare(name, CONST_SIZE, memory.size())?.address;
                memory
                    .write(address, value)
                    .ok_or(CompilerError::MemoryExhausted(memory.size()))?;
            }
            Some("DATA") => {
                let parsed = match line.tokens.as_slice() {
                    [_, decl] => split_index(decl).filter(|(name, _)| is_identifier(name)),
                    _ => None,
                };
                let (name, size) = match parsed {
                    Some((name, size)) => (name, size.filter(|&n| n > 0).unwrap_or(1)),
                    None => {
                        report(DiagnosticKind::MalformedDeclaration(line.text.clone()));
                        return Ok(());
                    }
                };
                if self.lookup(name).is_some() {
                    report(DiagnosticKind::DuplicateSymbol(name.to_string()));
                }
                self.declare(name, size, memory.size())?;
            }
            Some(other) => report(DiagnosticKind::UnknownDeclaration(other.to_string())),
            None => {}
        }
        Ok(())
    }
}
