// Code generator tests: translation, label resolution and IF/ELSE/ENDIF backpatching

use super::*;
use crate::compiler::{Compiler, Program};
use test_log::test;

fn compile(source: &str) -> Program {
    Compiler::default().compile(source).unwrap()
}

fn compile_with(config: Config, source: &str) -> Result<Program, CompilerError> {
    Compiler::new(config).compile(source)
}

fn numbers(program: &Program) -> Vec<InstrNo> {
    program.instructions.iter().map(|inst| inst.number).collect()
}

fn kinds(program: &Program) -> Vec<DiagnosticKind> {
    program.diagnostics.iter().map(|d| d.kind.clone()).collect()
}

fn if_false_target(program: &Program, number: InstrNo) -> Target {
    match &program.instructions.by_number(number).unwrap().operation {
        Operation::If { on_false, .. } => *on_false,
        other => panic!("instruction {} is not an IF: {:?}", number, other),
    }
}

fn jump_target(program: &Program, number: InstrNo) -> Target {
    match &program.instructions.by_number(number).unwrap().operation {
        Operation::Jump { target } => *target,
        other => panic!("instruction {} is not a JUMP: {:?}", number, other),
    }
}

#[test]
fn test_mov_direction_follows_destination() {
    let program = compile("DATA x\nSTART:\nMOV AX, x\nMOV x, BX\nEND\n");
    assert!(program.diagnostics.is_empty());

    let first = program.instructions.get(0).unwrap();
    assert_eq!(first.opcode(), Opcode::MovRegToMem);
    assert_eq!(first.opcode().code(), 2);
    assert_eq!(first.encode_params(), vec![0, 8, END_OF_PARAMS]);

    let second = program.instructions.get(1).unwrap();
    assert_eq!(second.opcode(), Opcode::MovMemToReg);
    assert_eq!(second.opcode().code(), 1);
    assert_eq!(second.encode_params(), vec![8, 1, END_OF_PARAMS]);
}

#[test]
fn test_arithmetic_layout() {
    let program = compile("DATA a\nDATA b\nDATA c\nSTART:\nADD a, b, c\nSUB c a b\nMUL AX, BX, a\nEND");
    let codes: Vec<Word> = program
        .instructions
        .iter()
        .map(|inst| inst.opcode().code())
        .collect();
    assert_eq!(codes, vec![3, 4, 5]);
    assert_eq!(
        program.instructions.get(0).unwrap().encode_params(),
        vec![8, 9, 10, END_OF_PARAMS]
    );
    assert_eq!(
        program.instructions.get(2).unwrap().encode_params(),
        vec![0, 1, 8, END_OF_PARAMS]
    );
}

#[test]
fn test_if_else_backpatch() {
    let program = compile(
        "DATA a\nDATA b\nSTART:\nREAD a\nREAD b\nIF a EQ b\nPRINT a\nELSE\nPRINT b\nENDIF\nPRINT a\nEND\n",
    );
    assert!(program.diagnostics.is_empty());
    assert_eq!(numbers(&program), vec![1, 2, 3, 4, 5, 6, 7]);

    // IF resumes right after the ELSE jump, ELSE jumps past the ENDIF
    assert_eq!(if_false_target(&program, 3), Target::Resolved(6));
    assert_eq!(jump_target(&program, 5), Target::Resolved(7));
    assert_eq!(
        program.instructions.by_number(3).unwrap().encode_params(),
        vec![8, 9, Opcode::Eq.code(), 6, END_OF_PARAMS]
    );
    assert!(program.is_fully_resolved());
}

#[test]
fn test_if_without_else_targets_after_endif() {
    let program = compile("DATA a\nDATA b\nSTART:\nIF a GT b\nPRINT a\nENDIF\nPRINT b\nEND");
    assert!(program.diagnostics.is_empty());
    assert_eq!(if_false_target(&program, 1), Target::Resolved(3));
    // the operands of the IF are left alone
    assert_eq!(
        program.instructions.by_number(1).unwrap().encode_params(),
        vec![8, 9, Opcode::Gt.code(), 3, END_OF_PARAMS]
    );
}

#[test]
fn test_nested_if_else() {
    let source = "\
DATA a
DATA b
DATA c
START:
IF a GT b
IF a GT c
PRINT a
ELSE
PRINT c
ENDIF
ELSE
PRINT b
ENDIF
END
";
    let program = compile(source);
    assert!(program.diagnostics.is_empty());
    assert_eq!(numbers(&program), vec![1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(if_false_target(&program, 2), Target::Resolved(5));
    assert_eq!(jump_target(&program, 4), Target::Resolved(6));
    assert_eq!(if_false_target(&program, 1), Target::Resolved(7));
    assert_eq!(jump_target(&program, 6), Target::Resolved(8));
    assert!(program.is_fully_resolved());
}

#[test]
fn test_if_without_else_nested_in_else_branch() {
    let source = "\
DATA a
DATA b
START:
IF a EQ b
PRINT a
ELSE
IF a LT b
PRINT a
ENDIF
PRINT b
ENDIF
END
";
    let program = compile(source);
    assert!(program.diagnostics.is_empty());
    assert_eq!(if_false_target(&program, 1), Target::Resolved(4));
    assert_eq!(jump_target(&program, 3), Target::Resolved(7));
    assert_eq!(if_false_target(&program, 4), Target::Resolved(6));
    assert!(program.is_fully_resolved());
}

#[test]
fn test_jump_to_earlier_label() {
    let source = "\
DATA n
START:
READ n
top:
PRINT n
SUB n, n, 1
IF n GT 0
JUMP top
ENDIF
END
";
    let program = compile(source);
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.labels.lookup("top"), Some(2));
    assert_eq!(jump_target(&program, 5), Target::Resolved(2));
    assert_eq!(if_false_target(&program, 4), Target::Resolved(6));
}

#[test]
fn test_undefined_label_defaults_to_zero() {
    let program = compile("START:\nJUMP nowhere\nEND");
    assert_eq!(jump_target(&program, 1), Target::Resolved(0));
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::UnresolvedLabel("nowhere".to_string())]
    );
}

#[test]
fn test_forward_label_is_unresolved() {
    let program = compile("START:\nJUMP later\nPRINT AX\nlater:\nPRINT BX\nEND");
    assert_eq!(jump_target(&program, 1), Target::Resolved(0));
    assert_eq!(program.labels.lookup("later"), Some(3));
    assert_eq!(program.diagnostics[0].line, 2);
}

#[test]
fn test_literals_are_pooled_after_symbols() {
    let program = compile("DATA x\nSTART:\nADD x, x, 1\nIF x GT 0\nPRINT 1\nENDIF\nEND");
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.literals.get(&1), Some(&9));
    assert_eq!(program.literals.get(&0), Some(&10));
    assert_eq!(program.literals.len(), 2);
    assert_eq!(program.memory.read(9), Some(1));
    assert_eq!(program.memory.read(10), Some(0));
    assert_eq!(
        program.instructions.by_number(3).unwrap().operation,
        Operation::Print {
            src: Operand::Address(9)
        }
    );
}

#[test]
fn test_literal_destination_rejected() {
    let program = compile("START:\nREAD 5\nEND");
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::LiteralDestination("5".to_string())]
    );
    assert_eq!(
        program.instructions.get(0).unwrap().operation,
        Operation::Read {
            dest: Operand::Unresolved("5".to_string())
        }
    );
}

#[test]
fn test_unresolved_identifier_keeps_generating() {
    let program = compile("DATA x\nSTART:\nPRINT y\nPRINT x\nEND");
    assert_eq!(program.instructions.len(), 2);
    assert_eq!(
        program.instructions.get(0).unwrap().encode_params(),
        vec![INVALID_ADDRESS, END_OF_PARAMS]
    );
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::UnresolvedIdentifier("y".to_string())]
    );
}

#[test]
fn test_array_indexing_and_bounds() {
    let program = compile("DATA arr[3]\nDATA k\nSTART:\nREAD arr[2]\nPRINT arr[3]\nPRINT k*\nEND");
    assert_eq!(
        program.instructions.get(0).unwrap().operation,
        Operation::Read {
            dest: Operand::Address(10)
        }
    );
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::IndexOutOfBounds("arr".to_string(), 3, 3)]
    );
    assert_eq!(
        program.instructions.get(2).unwrap().operation,
        Operation::Print {
            src: Operand::Address(11)
        }
    );
}

#[test]
fn test_unknown_instruction_leaves_numbering_gap() {
    let program = compile("START:\nPRINT AX\nFOO x\nPRINT BX\nEND");
    assert_eq!(numbers(&program), vec![1, 3]);
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::UnknownInstruction("FOO".to_string())]
    );
}

#[test]
fn test_malformed_operands() {
    let program = compile("DATA a\nSTART:\nMOV a\nIF a a\nIF a NE a\nPRINT a\nEND");
    assert_eq!(numbers(&program), vec![4]);
    assert_eq!(
        kinds(&program),
        vec![
            DiagnosticKind::MalformedOperands("MOV".to_string(), "a".to_string()),
            DiagnosticKind::MalformedOperands("IF".to_string(), "a a".to_string()),
            DiagnosticKind::UnknownComparison("NE".to_string()),
        ]
    );
}

#[test]
fn test_control_flow_diagnostics() {
    let program = compile("DATA a\nSTART:\nENDIF\nIF a EQ a\nPRINT a\n");
    assert_eq!(
        kinds(&program),
        vec![
            DiagnosticKind::UnmatchedEndif,
            DiagnosticKind::MissingEnd,
            DiagnosticKind::UnclosedBlock(1),
        ]
    );
    assert!(!program.is_fully_resolved());
}

#[test]
fn test_else_without_if() {
    let program = compile("START:\nELSE\nPRINT AX\nENDIF\nEND");
    assert_eq!(kinds(&program), vec![DiagnosticKind::UnmatchedElse(1)]);
    assert_eq!(jump_target(&program, 1), Target::Resolved(3));
}

#[test]
fn test_lines_after_end_are_ignored() {
    let program = compile("START:\nPRINT AX\nEND\nPRINT BX\nbogus line\n");
    assert_eq!(program.instructions.len(), 1);
    assert!(program.diagnostics.is_empty());
}

#[test]
fn test_duplicate_label_reported() {
    let program = compile("START:\nhere:\nPRINT AX\nhere:\nPRINT BX\nJUMP here\nEND");
    assert_eq!(jump_target(&program, 3), Target::Resolved(1));
    assert_eq!(
        kinds(&program),
        vec![DiagnosticKind::DuplicateLabel("here".to_string())]
    );
}

#[test]
fn test_generation_is_deterministic() {
    let source = "DATA x\nCONST k 4\nSTART:\nREAD x\nIF x LT k\nPRINT 1\nELSE\nPRINT 2\nENDIF\nEND";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_instruction_capacity() {
    let config = Config {
        max_instructions: 2,
        ..Config::default()
    };
    let result = compile_with(config, "START:\nPRINT AX\nPRINT AX\nPRINT AX\nEND");
    assert_eq!(
        result,
        Err(CompilerError::TableExhausted(Table::Instruction, 2))
    );
}

#[test]
fn test_nesting_capacity() {
    let config = Config {
        max_nesting: 1,
        ..Config::default()
    };
    let result = compile_with(config, "START:\nIF AX EQ BX\nIF AX EQ BX\nENDIF\nENDIF\nEND");
    assert_eq!(result, Err(CompilerError::NestingTooDeep(1, 3)));
}

#[test]
fn test_literal_pool_exhausts_memory() {
    let config = Config {
        memory_size: 10,
        ..Config::default()
    };
    let result = compile_with(config, "DATA x\nSTART:\nPRINT 1\nPRINT 2\nEND");
    assert_eq!(result, Err(CompilerError::MemoryExhausted(10)));
}
