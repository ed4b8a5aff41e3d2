//! Console seam for `print` and `input`.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::{RuntimeError, RuntimeResult};

/// Where `print` writes and `input` reads.
pub trait Console {
    /// Write one line. The line does not include the newline.
    fn write_line(&mut self, line: &[u8]) -> RuntimeResult<()>;

    /// Read one line without its line terminator.
    fn read_line(&mut self) -> RuntimeResult<Vec<u8>>;
}

/// Standard output and standard input.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&mut self, line: &[u8]) -> RuntimeResult<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(line)
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|e| RuntimeError::Io(e.to_string()))
    }

    fn read_line(&mut self) -> RuntimeResult<Vec<u8>> {
        let mut line = Vec::new();
        let n = std::io::stdin()
            .lock()
            .read_until(b'\n', &mut line)
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        if n == 0 {
            return Err(RuntimeError::EndOfInput);
        }
        Ok(trim_newline(line))
    }
}

/// Captures output lines and serves queued input lines.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    pub output: Vec<String>,
    input: VecDeque<Vec<u8>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// A console whose `input` reads `lines` in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: Vec::new(),
            input: lines.into_iter().map(|s| s.into().into_bytes()).collect(),
        }
    }

    /// Everything printed so far, one `\n`-terminated line per `print`.
    pub fn text(&self) -> String {
        self.output.iter().map(|l| format!("{l}\n")).collect()
    }
}

impl Console for BufferConsole {
    fn write_line(&mut self, line: &[u8]) -> RuntimeResult<()> {
        self.output.push(String::from_utf8_lossy(line).into_owned());
        Ok(())
    }

    fn read_line(&mut self) -> RuntimeResult<Vec<u8>> {
        self.input.pop_front().ok_or(RuntimeError::EndOfInput)
    }
}

fn trim_newline(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_round_trip() {
        let mut c = BufferConsole::with_input(["first", "second"]);
        assert_eq!(c.read_line().unwrap(), b"first");
        assert_eq!(c.read_line().unwrap(), b"second");
        assert_eq!(c.read_line(), Err(RuntimeError::EndOfInput));
        c.write_line(b"a b").unwrap();
        c.write_line(b"").unwrap();
        assert_eq!(c.text(), "a b\n\n");
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline(b"x\r\n".to_vec()), b"x");
        assert_eq!(trim_newline(b"x\n".to_vec()), b"x");
        assert_eq!(trim_newline(b"x".to_vec()), b"x");
    }
}
