use std::{
    ffi::CString,
    io::{self, Write},
};

#[cfg(windows)]
use windows::{core::PCSTR, Win32::System::Diagnostics::Debug::OutputDebugStringA};

pub trait AsCString {
    fn as_c_string(&self) -> CString;
}

impl AsCString for String {
    fn as_c_string(&self) -> CString {
        CString::new(self.clone()).unwrap_or_default()
    }
}

impl AsCString for &str {
    fn as_c_string(&self) -> CString {
        self.to_string().as_c_string()
    }
}

pub fn print_debug_string(s: &str) {
    #[cfg(windows)]
    {
        let message = s.as_c_string();
        unsafe {
            OutputDebugStringA(PCSTR(message.as_ptr() as _));
        }
    }

    #[cfg(not(windows))]
    let _ = s;
}

/// Log sink that copies every record to the debugger output and stderr.
/// GUI-subsystem binaries have no console, so the debugger is the only place
/// the text is reliably visible.
#[derive(Debug, Default)]
pub struct DebugStringWriter {
    line: Vec<u8>,
}

impl io::Write for DebugStringWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.line.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.line.is_empty() {
            return Ok(());
        }

        let text = String::from_utf8_lossy(&self.line);
        print_debug_string(&text);
        let _ = io::stderr().write_all(text.as_bytes());
        self.line.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn interior_nul_becomes_empty_string() {
        assert_eq!("a\0b".as_c_string(), CString::default());
        assert_eq!("abc".as_c_string().as_bytes(), b"abc");
    }

    #[test]
    fn writer_buffers_until_flush() {
        let mut writer = DebugStringWriter::default();
        writer.write_all(b"INFO probe: ").unwrap();
        writer.write_all(b"ready\n").unwrap();
        assert_eq!(writer.line, b"INFO probe: ready\n");

        writer.flush().unwrap();
        assert!(writer.line.is_empty());
    }
}
