use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{Result as IoResult, Write};
use std::path::Path;
use std::rc::Rc;

/// Memory-backed writer whose contents stay readable after it is boxed and
/// handed to a [`Shell`](crate::Shell).
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    /// Drop everything written so far.
    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

/// Append `data` to the file at `path`, creating it if needed.
pub fn append_to_file(path: &Path, data: &[u8]) -> IoResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(data)?;
    file.flush()
}
