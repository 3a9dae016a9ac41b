// Compiler Error Handling
//
// Two tiers: `CompilerError` aborts the run before execution, `Diagnostic`
// is reported and generation carries on with a fallback value.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CompilerError {
    // Input errors
    IOError(String),
    BadExtension(String),
    ConfigError(String),

    // Capacity errors
    TableExhausted(Table, usize), // table, capacity
    MemoryExhausted(usize),       // memory size
    NestingTooDeep(usize, usize), // capacity, source line
}

/// The fixed-capacity tables built during generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Symbol,
    Label,
    Instruction,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Table::Symbol => write!(f, "declaration"),
            Table::Label => write!(f, "label"),
            Table::Instruction => write!(f, "instruction"),
        }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompilerError::IOError(msg) => write!(f, "IO error: {}", msg),
            CompilerError::BadExtension(found) => {
                write!(f, "File extension expected .asm, found {}", found)
            }
            CompilerError::ConfigError(msg) => write!(f, "Invalid configuration: {}", msg),
            CompilerError::TableExhausted(table, capacity) => write!(
                f,
                "{} table exhausted (capacity {})",
                table, capacity
            ),
            CompilerError::MemoryExhausted(size) => {
                write!(f, "Memory image exhausted ({} cells)", size)
            }
            CompilerError::NestingTooDeep(capacity, line) => write!(
                f,
                "IF/ELSE nesting deeper than {} at line {}",
                capacity, line
            ),
        }
    }
}

impl std::error::Error for CompilerError {}

/// A non-fatal problem found while building the tables
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based source line
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    // Declaration section
    UnknownDeclaration(String),
    MalformedDeclaration(String),
    DuplicateSymbol(String),

    // Instruction section
    UnknownInstruction(String),
    MalformedOperands(String, String), // mnemonic, operand text
    UnknownComparison(String),
    UnresolvedIdentifier(String),
    IndexOutOfBounds(String, usize, usize), // name, index, size
    LiteralDestination(String),
    EmptyLabel,
    DuplicateLabel(String),
    UnresolvedLabel(String),

    // Control flow
    UnmatchedEndif,
    UnmatchedElse(usize), // instruction number of the ELSE
    UnclosedBlock(usize), // instruction number left on the stack
    MissingEnd,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Diagnostic { line, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            DiagnosticKind::UnknownDeclaration(kw) => write!(f, "Unknown declaration: {}", kw),
            DiagnosticKind::MalformedDeclaration(text) => {
                write!(f, "Malformed declaration '{}'", text)
            }
            DiagnosticKind::DuplicateSymbol(name) => {
                write!(f, "Variable '{}' declared more than once", name)
            }
            DiagnosticKind::UnknownInstruction(name) => {
                write!(f, "Unknown instruction '{}'", name)
            }
            DiagnosticKind::MalformedOperands(mnemonic, operands) => {
                write!(f, "Invalid {} operands '{}'", mnemonic, operands)
            }
            DiagnosticKind::UnknownComparison(op) => {
                write!(f, "Unknown comparison operator '{}'", op)
            }
            DiagnosticKind::UnresolvedIdentifier(name) => {
                write!(f, "Variable '{}' not found", name)
            }
            DiagnosticKind::IndexOutOfBounds(name, index, size) => write!(
                f,
                "Index {} out of bounds for '{}' of size {}",
                index, name, size
            ),
            DiagnosticKind::LiteralDestination(lit) => {
                write!(f, "Literal '{}' cannot be written to", lit)
            }
            DiagnosticKind::EmptyLabel => write!(f, "Label with empty name"),
            DiagnosticKind::DuplicateLabel(name) => {
                write!(f, "Label '{}' defined more than once", name)
            }
            DiagnosticKind::UnresolvedLabel(name) => {
                write!(f, "Label '{}' not found for JUMP", name)
            }
            DiagnosticKind::UnmatchedEndif => write!(f, "Unmatched ENDIF"),
            DiagnosticKind::UnmatchedElse(no) => {
                write!(f, "ELSE at instruction {} has no matching IF", no)
            }
            DiagnosticKind::UnclosedBlock(no) => {
                write!(f, "IF/ELSE at instruction {} is never closed", no)
            }
            DiagnosticKind::MissingEnd => write!(f, "Program has no END"),
        }
    }
}
