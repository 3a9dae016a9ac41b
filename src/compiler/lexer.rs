// Source Splitter
// Splits assembly source into the declaration and instruction sections and
// tokenizes each line on whitespace.

use log::debug;

/// Line that separates declarations from instructions
pub const START_SENTINEL: &str = "START:";

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// 1-based line number in the source file
    pub line: usize,
    /// The line with surrounding whitespace removed
    pub text: String,
    pub tokens: Vec<String>,
}

impl SourceLine {
    pub fn new(line: usize, text: &str) -> Self {
        let text = text.trim();
        SourceLine {
            line,
            text: text.to_string(),
            tokens: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn first_token(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the first token, trimmed
    pub fn rest(&self) -> &str {
        match self.text.find(char::is_whitespace) {
            Some(idx) => self.text[idx..].trim(),
            None => "",
        }
    }

    pub fn is_label(&self) -> bool {
        self.text.ends_with(':')
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections {
    pub declarations: Vec<SourceLine>,
    pub instructions: Vec<SourceLine>,
}

fn is_declaration(line: &SourceLine) -> bool {
    matches!(line.first_token(), Some("DATA") | Some("CONST"))
}

/// Split the source at the `START:` sentinel. Without a sentinel the leading
/// run of DATA/CONST lines forms the declaration section.
pub fn split_sections(source: &str) -> Sections {
    let lines: Vec<SourceLine> = source
        .lines()
        .enumerate()
        .map(|(idx, text)| SourceLine::new(idx + 1, text))
        .filter(|line| !line.text.is_empty())
        .collect();

    let mut declarations = lines;
    let instructions = match declarations.iter().position(|l| l.text == START_SENTINEL) {
        Some(pos) => {
            debug!("START sentinel at line {}", declarations[pos].line);
            let instructions = declarations.split_off(pos + 1);
            declarations.pop();
            instructions
        }
        None => {
            let split_at = declarations.iter().take_while(|l| is_declaration(l)).count();
            debug!("No START sentinel, {} leading declarations", split_at);
            declarations.split_off(split_at)
        }
    };

    Sections {
        declarations,
        instructions,
    }
}
