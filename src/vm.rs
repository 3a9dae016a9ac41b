use crate::compiler::ir::{InstrNo, Instruction, InstructionTable, Operand, Target, Word};
use crate::compiler::Program;
use crate::memory::Memory;
use log::trace;
use std::fmt;

/// Fatal runtime errors. Checked where the classic machine would have
/// silently read or written outside its memory.
#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    AddressOutOfBounds(usize, InstrNo), // address, instruction number
    UnresolvedOperand(String, InstrNo), // identifier, instruction number
    UnresolvedTarget(InstrNo),
    Console(String),
    StepLimitExceeded(u64),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmError::AddressOutOfBounds(addr, no) => write!(
                f,
                "Address {} out of bounds at instruction {}",
                addr, no
            ),
            VmError::UnresolvedOperand(name, no) => write!(
                f,
                "Unresolved operand '{}' at instruction {}",
                name, no
            ),
            VmError::UnresolvedTarget(no) => {
                write!(f, "Jump target of instruction {} was never resolved", no)
            }
            VmError::Console(msg) => write!(f, "Console error: {}", msg),
            VmError::StepLimitExceeded(limit) => {
                write!(f, "Execution exceeded {} steps", limit)
            }
        }
    }
}

impl std::error::Error for VmError {}

/// The register/memory machine state
pub struct VM {
    /// Read-only program
    pub instructions: InstructionTable,
    pub memory: Memory,
    /// Position in the instruction table (not an instruction number)
    pub pc: usize,
    /// Instructions executed so far
    pub steps: u64,
}

impl VM {
    /// Take over the program's table and initial memory image
    pub fn new(program: Program) -> Self {
        VM {
            instructions: program.instructions,
            memory: program.memory,
            pc: 0,
            steps: 0,
        }
    }

    /// Instruction at the program counter, or `None` once the stream is exhausted
    pub fn current(&self) -> Option<&Instruction> {
        self.instructions.get(self.pc)
    }

    pub fn read_operand(&self, operand: &Operand, at: InstrNo) -> Result<Word, VmError> {
        let addr = self.address(operand, at)?;
        let value = self
            .memory
            .read(addr)
            .ok_or(VmError::AddressOutOfBounds(addr, at))?;
        trace!("mem[{}] -> {}", addr, value);
        Ok(value)
    }

    pub fn write_operand(
        &mut self,
        operand: &Operand,
        value: Word,
        at: InstrNo,
    ) -> Result<(), VmError> {
        let addr = self.address(operand, at)?;
        trace!("mem[{}] <- {}", addr, value);
        self.memory
            .write(addr, value)
            .ok_or(VmError::AddressOutOfBounds(addr, at))
    }

    fn address(&self, operand: &Operand, at: InstrNo) -> Result<usize, VmError> {
        match operand {
            Operand::Address(addr) => Ok(*addr),
            Operand::Unresolved(name) => Err(VmError::UnresolvedOperand(name.clone(), at)),
        }
    }

    /// Move the program counter to a jump target. A target past the last
    /// instruction leaves the counter at the end of the stream.
    pub fn jump(&mut self, target: Target, at: InstrNo) -> Result<(), VmError> {
        let number = match target {
            Target::Resolved(number) => number,
            Target::Unresolved => return Err(VmError::UnresolvedTarget(at)),
        };
        self.pc = self
            .instructions
            .position_of_target(number)
            .unwrap_or_else(|| self.instructions.len());
        Ok(())
    }
}
