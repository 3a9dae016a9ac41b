// Compiler Module
// Declarations -> symbol table -> intermediate code with backpatched targets

pub mod codegen;
pub mod error;
pub mod ir;
pub mod labels;
pub mod lexer;
pub mod symbols;

use crate::config::Config;
use crate::memory::Memory;
use indexmap::IndexMap;
use log::{debug, info};
use std::fs;
use std::path::Path;

pub use error::{CompilerError, Diagnostic, DiagnosticKind, Table};

use ir::{InstructionTable, Word};
use labels::LabelTable;
use symbols::SymbolTable;

/// Source file extension accepted by `compile_file`
pub const SOURCE_EXTENSION: &str = "asm";

/// A compiled program, ready to hand to the VM
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub symbols: SymbolTable,
    pub labels: LabelTable,
    /// Literal value -> pool address
    pub literals: IndexMap<Word, usize>,
    pub instructions: InstructionTable,
    /// Initial memory image with constants and literals in place
    pub memory: Memory,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    /// True when every IF false-branch and ELSE jump got its target
    pub fn is_fully_resolved(&self) -> bool {
        self.instructions
            .iter()
            .all(|inst| !inst.has_unresolved_target())
    }
}

/// Main compiler structure
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: Config,
}

impl Compiler {
    pub fn new(config: Config) -> Self {
        Compiler { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile assembly source into an intermediate program
    pub fn compile(&self, source: &str) -> Result<Program, CompilerError> {
        // Phase 1: Split sections
        let sections = lexer::split_sections(source);
        debug!(
            "{} declaration lines, {} instruction lines",
            sections.declarations.len(),
            sections.instructions.len()
        );

        // Phase 2: Symbol table and initial memory
        info!("Processing declarations...");
        let mut symbols = SymbolTable::new(self.config.max_symbols);
        let mut memory = Memory::new(self.config.memory_size);
        let mut diagnostics = Vec::new();
        for line in &sections.declarations {
            symbols.process_declaration(line, &mut memory, &mut diagnostics)?;
        }

        // Phase 3: Instructions, labels and backpatching
        info!("Processing instructions...");
        let generated =
            codegen::CodeGen::new(&self.config, &symbols, memory).generate(&sections.instructions)?;
        diagnostics.extend(generated.diagnostics);

        Ok(Program {
            symbols,
            labels: generated.labels,
            literals: generated.literals,
            instructions: generated.instructions,
            memory: generated.memory,
            diagnostics,
        })
    }

    /// Read and compile a `.asm` file
    pub fn compile_file(&self, path: &Path) -> Result<Program, CompilerError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(SOURCE_EXTENSION) => {}
            Some(other) => return Err(CompilerError::BadExtension(format!(".{}", other))),
            None => return Err(CompilerError::BadExtension("none".to_string())),
        }
        let source = fs::read_to_string(path)
            .map_err(|e| CompilerError::IOError(format!("{}: {}", path.display(), e)))?;
        self.compile(&source)
    }
}
