// Intermediate Representation
//
// The instruction stream produced by the code generator and consumed by the VM.
// Parameters are typed: "not yet resolved" and "no further parameters" are
// variants, not magic numbers. The integer encoding with sentinels exists only
// for the persisted dump format.

use indexmap::IndexMap;
use std::fmt;

/// A memory cell value
pub type Word = i32;

/// Instruction number: source ordinal of an instruction line, starting at 1
pub type InstrNo = usize;

/// Marks a jump target that has not been backpatched yet
pub const WILDCARD_VALUE: Word = -2;

/// Terminates the parameter list in the integer encoding
pub const END_OF_PARAMS: Word = -1;

/// Written for an operand whose identifier could not be resolved
pub const INVALID_ADDRESS: Word = -1;

/// Instruction opcodes. The numeric values are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    MovMemToReg = 1,
    MovRegToMem = 2,
    Add = 3,
    Sub = 4,
    Mul = 5,
    Jump = 6,
    If = 7,
    Eq = 8,
    Lt = 9,
    Gt = 10,
    LtEq = 11,
    GtEq = 12,
    Print = 13,
    Read = 14,
    EndIf = 15,
    End = 16,
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::MovMemToReg,
        Opcode::MovRegToMem,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Jump,
        Opcode::If,
        Opcode::Eq,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::LtEq,
        Opcode::GtEq,
        Opcode::Print,
        Opcode::Read,
        Opcode::EndIf,
        Opcode::End,
    ];

    pub fn code(self) -> Word {
        self as Word
    }

    pub fn from_code(code: Word) -> Option<Opcode> {
        Opcode::ALL.iter().copied().find(|op| op.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::MovMemToReg | Opcode::MovRegToMem => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Jump => "JUMP",
            Opcode::If => "IF",
            Opcode::Eq => "EQ",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::LtEq => "LTEQ",
            Opcode::GtEq => "GTEQ",
            Opcode::Print => "PRINT",
            Opcode::Read => "READ",
            Opcode::EndIf => "ENDIF",
            Opcode::End => "END",
        }
    }
}

/// Comparison operators accepted by IF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl Comparison {
    pub fn from_mnemonic(name: &str) -> Option<Comparison> {
        match name {
            "EQ" => Some(Comparison::Eq),
            "LT" => Some(Comparison::Lt),
            "GT" => Some(Comparison::Gt),
            "LTEQ" => Some(Comparison::LtEq),
            "GTEQ" => Some(Comparison::GtEq),
            _ => None,
        }
    }

    pub fn opcode(self) -> Opcode {
        match self {
            Comparison::Eq => Opcode::Eq,
            Comparison::Lt => Opcode::Lt,
            Comparison::Gt => Opcode::Gt,
            Comparison::LtEq => Opcode::LtEq,
            Comparison::GtEq => Opcode::GtEq,
        }
    }

    pub fn evaluate(self, lhs: Word, rhs: Word) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::LtEq => lhs <= rhs,
            Comparison::GtEq => lhs >= rhs,
        }
    }
}

/// ADD, SUB and MUL share one instruction shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    pub fn opcode(self) -> Opcode {
        match self {
            ArithOp::Add => Opcode::Add,
            ArithOp::Sub => Opcode::Sub,
            ArithOp::Mul => Opcode::Mul,
        }
    }

    /// Wrapping, like the machine word it models
    pub fn apply(self, lhs: Word, rhs: Word) -> Word {
        match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mul => lhs.wrapping_mul(rhs),
        }
    }
}

/// A memory operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Address(usize),
    /// The identifier text that failed to resolve
    Unresolved(String),
}

impl Operand {
    fn encode(&self) -> Word {
        match self {
            Operand::Address(addr) => *addr as Word,
            Operand::Unresolved(_) => INVALID_ADDRESS,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Address(addr) => write!(f, "{}", addr),
            Operand::Unresolved(name) => write!(f, "?{}", name),
        }
    }
}

/// A control-flow target, as an instruction number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Waiting for the matching ENDIF
    Unresolved,
    Resolved(InstrNo),
}

impl Target {
    pub fn is_resolved(self) -> bool {
        matches!(self, Target::Resolved(_))
    }

    fn encode(self) -> Word {
        match self {
            Target::Unresolved => WILDCARD_VALUE,
            Target::Resolved(no) => no as Word,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Target::Unresolved => write!(f, "*"),
            Target::Resolved(no) => write!(f, "{}", no),
        }
    }
}

/// What an instruction does, with its parameters in positional order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    MovMemToReg {
        dest: Operand,
        src: Operand,
    },
    MovRegToMem {
        dest: Operand,
        src: Operand,
    },
    Arith {
        op: ArithOp,
        dest: Operand,
        lhs: Operand,
        rhs: Operand,
    },
    Read {
        dest: Operand,
    },
    Print {
        src: Operand,
    },
    Jump {
        target: Target,
    },
    If {
        lhs: Operand,
        rhs: Operand,
        cmp: Comparison,
        on_false: Target,
    },
    End,
}

/// One resolved unit of the intermediate program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub number: InstrNo,
    pub operation: Operation,
}

impl Instruction {
    pub fn new(number: InstrNo, operation: Operation) -> Self {
        Instruction { number, operation }
    }

    pub fn opcode(&self) -> Opcode {
        match &self.operation {
            Operation::MovMemToReg { .. } => Opcode::MovMemToReg,
            Operation::MovRegToMem { .. } => Opcode::MovRegToMem,
            Operation::Arith { op, .. } => op.opcode(),
            Operation::Read { .. } => Opcode::Read,
            Operation::Print { .. } => Opcode::Print,
            Operation::Jump { .. } => Opcode::Jump,
            Operation::If { .. } => Opcode::If,
            Operation::End => Opcode::End,
        }
    }

    /// Integer parameters in the persisted layout, including the end marker
    pub fn encode_params(&self) -> Vec<Word> {
        let mut params = match &self.operation {
            Operation::MovMemToReg { dest, src } | Operation::MovRegToMem { dest, src } => {
                vec![dest.encode(), src.encode()]
            }
            Operation::Arith { dest, lhs, rhs, .. } => {
                vec![dest.encode(), lhs.encode(), rhs.encode()]
            }
            Operation::Read { dest } => vec![dest.encode()],
            Operation::Print { src } => vec![src.encode()],
            Operation::Jump { target } => vec![target.encode()],
            Operation::If {
                lhs,
                rhs,
                cmp,
                on_false,
            } => vec![
                lhs.encode(),
                rhs.encode(),
                cmp.opcode().code(),
                on_false.encode(),
            ],
            Operation::End => vec![],
        };
        params.push(END_OF_PARAMS);
        params
    }

    /// Targets still waiting for a backpatch
    pub fn has_unresolved_target(&self) -> bool {
        match &self.operation {
            Operation::Jump { target } => !target.is_resolved(),
            Operation::If { on_false, .. } => !on_false.is_resolved(),
            _ => false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>4}  {:<5} ({:>2})", self.number, self.opcode().name(), self.opcode().code())?;
        match &self.operation {
            Operation::MovMemToReg { dest, src } | Operation::MovRegToMem { dest, src } => {
                write!(f, "  {} <- {}", dest, src)
            }
            Operation::Arith { dest, lhs, rhs, .. } => {
                write!(f, "  {} <- {}, {}", dest, lhs, rhs)
            }
            Operation::Read { dest } => write!(f, "  {}", dest),
            Operation::Print { src } => write!(f, "  {}", src),
            Operation::Jump { target } => write!(f, "  -> {}", target),
            Operation::If {
                lhs,
                rhs,
                cmp,
                on_false,
            } => write!(
                f,
                "  {} {} {} else -> {}",
                lhs,
                cmp.opcode().name(),
                rhs,
                on_false
            ),
            Operation::End => Ok(()),
        }
    }
}

/// The emitted instructions plus an index from instruction number to position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionTable {
    instructions: Vec<Instruction>,
    positions: IndexMap<InstrNo, usize>,
}

impl InstructionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.positions
            .insert(instruction.number, self.instructions.len());
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn by_number(&self, number: InstrNo) -> Option<&Instruction> {
        self.positions
            .get(&number)
            .map(|&position| &self.instructions[position])
    }

    pub fn by_number_mut(&mut self, number: InstrNo) -> Option<&mut Instruction> {
        match self.positions.get(&number) {
            Some(&position) => self.instructions.get_mut(position),
            None => None,
        }
    }

    /// Position of the first instruction numbered at or after `target`.
    /// `None` means the target lies past the end of the program.
    pub fn position_of_target(&self, target: InstrNo) -> Option<usize> {
        let position = self
            .instructions
            .partition_point(|inst| inst.number < target);
        if position < self.instructions.len() {
            Some(position)
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a InstructionTable {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_opcode_codes_are_stable() {
        let codes: Vec<Word> = Opcode::ALL.iter().map(|op| op.code()).collect();
        assert_eq!(codes, (1..=16).collect::<Vec<Word>>());
        assert_eq!(Opcode::from_code(13), Some(Opcode::Print));
        assert_eq!(Opcode::from_code(0), None);
        assert_eq!(Opcode::from_code(17), None);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(Comparison::from_mnemonic("LTEQ"), Some(Comparison::LtEq));
        assert_eq!(Comparison::from_mnemonic("lt"), None);
        assert!(Comparison::Eq.evaluate(3, 3));
        assert!(Comparison::Lt.evaluate(-1, 0));
        assert!(!Comparison::Gt.evaluate(2, 2));
        assert!(Comparison::GtEq.evaluate(2, 2));
        assert!(!Comparison::LtEq.evaluate(5, 4));
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(ArithOp::Add.apply(Word::MAX, 1), Word::MIN);
        assert_eq!(ArithOp::Sub.apply(2, 5), -3);
        assert_eq!(ArithOp::Mul.apply(-4, 6), -24);
    }

    #[test]
    fn test_targets_map_across_numbering_gaps() {
        let mut table = InstructionTable::new();
        for number in [1, 2, 4, 7] {
            table.push(Instruction::new(number, Operation::End));
        }
        assert_eq!(table.position_of_target(0), Some(0));
        assert_eq!(table.position_of_target(3), Some(2));
        assert_eq!(table.position_of_target(7), Some(3));
        assert_eq!(table.position_of_target(8), None);
        assert_eq!(table.by_number(4).map(|inst| inst.number), Some(4));
        assert!(table.by_number(3).is_none());
    }

    #[test]
    fn test_unresolved_encodings() {
        let inst = Instruction::new(
            3,
            Operation::If {
                lhs: Operand::Unresolved("q".to_string()),
                rhs: Operand::Address(9),
                cmp: Comparison::Lt,
                on_false: Target::Unresolved,
            },
        );
        assert!(inst.has_unresolved_target());
        assert_eq!(
            inst.encode_params(),
            vec![INVALID_ADDRESS, 9, 9, WILDCARD_VALUE, END_OF_PARAMS]
        );
        assert_eq!(Instruction::new(4, Operation::End).encode_params(), vec![END_OF_PARAMS]);
    }
}
