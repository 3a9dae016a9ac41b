#![crate_name = "asmc"]

#[macro_use]
extern crate lazy_static;

pub mod compiler;
pub mod config;
pub mod console;
pub mod dump;
pub mod interpreter;
pub mod memory;
pub mod vm;

/*
Memory layout of a compiled program (default 100 cells)

        0..8    registers AX BX CX DX EX FX GX HX
        8..     CONST and DATA symbols in declaration order
        ..      literal pool, one cell per distinct numeric literal
        ..100   free

Instruction parameters in integer form, END_OF_PARAMS (-1) terminated

        MOV     dest src
        ADD     dest lhs rhs        (SUB, MUL likewise)
        READ    dest
        PRINT   src
        JUMP    target
        IF      lhs rhs cmp target  (target -2 until its ENDIF is seen)
*/
