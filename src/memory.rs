/// Memory image shared by the compiler and the VM
///
/// Layout:
///   0..8     registers AX..HX
///   8..      declared symbols in declaration order, then the literal pool
use crate::compiler::ir::Word;
use std::fmt;

/// Number of named registers (AX through HX)
pub const REGISTER_COUNT: usize = 8;

/// First address available to declarations
pub const VARIABLE_MEMORY_START: usize = REGISTER_COUNT;

/// Map a register name (`AX`..`HX`) to its fixed address
pub fn register_address(name: &str) -> Option<usize> {
    match name.as_bytes() {
        [first @ b'A'..=b'H', b'X'] => Some((first - b'A') as usize),
        _ => None,
    }
}

pub fn register_name(address: usize) -> Option<String> {
    if address < REGISTER_COUNT {
        Some(format!("{}X", (b'A' + address as u8) as char))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Memory {
            cells: vec![0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn read(&self, address: usize) -> Option<Word> {
        self.cells.get(address).copied()
    }

    /// Returns `None` when the address is outside the image
    pub fn write(&mut self, address: usize, value: Word) -> Option<()> {
        let cell = self.cells.get_mut(address)?;
        *cell = value;
        Some(())
    }

    pub fn registers(&self) -> &[Word] {
        &self.cells[..REGISTER_COUNT.min(self.cells.len())]
    }

    pub fn cells(&self) -> &[Word] {
        &self.cells
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (address, value) in self.registers().iter().enumerate() {
            if let Some(name) = register_name(address) {
                write!(f, "{}={} ", name, value)?;
            }
        }
        writeln!(f)?;
        for (row, chunk) in self.cells.chunks(10).enumerate() {
            write!(f, "{:04}:", row * 10)?;
            for value in chunk {
                write!(f, " {:>6}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_register_addresses() {
        assert_eq!(register_address("AX"), Some(0));
        assert_eq!(register_address("DX"), Some(3));
        assert_eq!(register_address("HX"), Some(7));
        assert_eq!(register_address("IX"), None);
        assert_eq!(register_address("AXE"), None);
        assert_eq!(register_address("ax"), None);
        assert_eq!(register_name(2).as_deref(), Some("CX"));
        assert_eq!(register_name(8), None);
    }

    #[test]
    fn test_bounds() {
        let mut mem = Memory::new(10);
        assert_eq!(mem.write(9, 42), Some(()));
        assert_eq!(mem.read(9), Some(42));
        assert_eq!(mem.write(10, 1), None);
        assert_eq!(mem.read(10), None);
    }

    #[test]
    fn test_display() {
        let mut mem = Memory::new(12);
        mem.write(1, -7);
        mem.write(11, 3);
        let text = mem.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].trim_end(), "AX=0 BX=-7 CX=0 DX=0 EX=0 FX=0 GX=0 HX=0");
        assert!(lines[1].starts_with("0000:"));
        assert!(lines[2].starts_with("0010:"));
        assert!(lines[2].ends_with("     3"));
    }
}
