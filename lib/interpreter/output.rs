use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

/// Where print statements go. Each call writes exactly one line and must not
/// hold it back in a buffer.
pub trait Output {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Process stdout, flushed after every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()
    }
}

impl Output for Vec<String> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Collects lines in memory; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Output for SharedBuffer {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}
