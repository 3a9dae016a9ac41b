use crate::compiler::ir::Operation;
use crate::console::Console;
use crate::memory::Memory;
use crate::vm::{VmError, VM};
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Fall through to the next instruction
    Continue,
    /// Control flow moved the program counter
    Branched,
    /// END executed or the instruction stream ran out
    Halted,
}

/// Runs a VM against a console
pub struct Interpreter<'c> {
    pub vm: VM,
    console: &'c mut dyn Console,
}

impl<'c> Interpreter<'c> {
    pub fn new(vm: VM, console: &'c mut dyn Console) -> Self {
        Interpreter { vm, console }
    }

    /// Run until END or the end of the instruction stream
    pub fn run(&mut self) -> Result<(), VmError> {
        self.run_with_limit(None)
    }

    pub fn run_with_limit(&mut self, max_steps: Option<u64>) -> Result<(), VmError> {
        info!("Executing {} instructions", self.vm.instructions.len());
        loop {
            if let Some(limit) = max_steps {
                if self.vm.steps >= limit {
                    return Err(VmError::StepLimitExceeded(limit));
                }
            }
            if self.step()? == ExecutionResult::Halted {
                debug!("Halted after {} steps", self.vm.steps);
                return Ok(());
            }
        }
    }

    /// Execute the instruction at the program counter
    pub fn step(&mut self) -> Result<ExecutionResult, VmError> {
        let instruction = match self.vm.current() {
            Some(instruction) => instruction.clone(),
            None => return Ok(ExecutionResult::Halted),
        };
        let at = instruction.number;
        self.vm.steps += 1;
        debug!("pc={} {}", self.vm.pc, instruction);

        let result = match &instruction.operation {
            Operation::MovMemToReg { dest, src } | Operation::MovRegToMem { dest, src } => {
                let value = self.vm.read_operand(src, at)?;
                self.vm.write_operand(dest, value, at)?;
                ExecutionResult::Continue
            }
            Operation::Arith { op, dest, lhs, rhs } => {
                let lhs = self.vm.read_operand(lhs, at)?;
                let rhs = self.vm.read_operand(rhs, at)?;
                self.vm.write_operand(dest, op.apply(lhs, rhs), at)?;
                ExecutionResult::Continue
            }
            Operation::Read { dest } => {
                let value = self
                    .console
                    .read_value()
                    .map_err(|e| VmError::Console(e.message))?;
                self.vm.write_operand(dest, value, at)?;
                ExecutionResult::Continue
            }
            Operation::Print { src } => {
                let value = self.vm.read_operand(src, at)?;
                self.console
                    .print_value(value)
                    .map_err(|e| VmError::Console(e.message))?;
                ExecutionResult::Continue
            }
            Operation::If {
                lhs,
                rhs,
                cmp,
                on_false,
            } => {
                let lhs = self.vm.read_operand(lhs, at)?;
                let rhs = self.vm.read_operand(rhs, at)?;
                if cmp.evaluate(lhs, rhs) {
                    ExecutionResult::Continue
                } else {
                    self.vm.jump(*on_false, at)?;
                    ExecutionResult::Branched
                }
            }
            Operation::Jump { target } => {
                self.vm.jump(*target, at)?;
                ExecutionResult::Branched
            }
            Operation::End => return Ok(ExecutionResult::Halted),
        };

        if result == ExecutionResult::Continue {
            self.vm.pc += 1;
        }
        Ok(result)
    }

    /// Hand back the final memory image
    pub fn into_memory(self) -> Memory {
        self.vm.memory
    }
}
