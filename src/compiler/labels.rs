// Label Table Builder
// Records label name -> instruction number as the generator scans the source.

use crate::compiler::error::{CompilerError, Table};
use crate::compiler::ir::InstrNo;
use log::debug;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    /// Number of the first real instruction after the label
    pub target: InstrNo,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:<12} {:>5}", self.name, self.target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    labels: Vec<Label>,
    capacity: usize,
}

impl LabelTable {
    pub fn new(capacity: usize) -> Self {
        LabelTable {
            labels: Vec::new(),
            capacity,
        }
    }

    /// Record a label. Returns `Ok(false)` when the name was already taken;
    /// the entry is kept but lookups keep returning the first one.
    pub fn define(&mut self, name: &str, target: InstrNo) -> Result<bool, CompilerError> {
        if self.labels.len() >= self.capacity {
            return Err(CompilerError::TableExhausted(Table::Label, self.capacity));
        }
        let fresh = self.lookup(name).is_none();
        debug!("label {} -> instruction {}", name, target);
        self.labels.push(Label {
            name: name.to_string(),
            target,
        });
        Ok(fresh)
    }

    pub fn lookup(&self, name: &str) -> Option<InstrNo> {
        self.labels
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.target)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }
}
