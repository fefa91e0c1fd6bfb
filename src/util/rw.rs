use std::{cell::RefCell, fmt::Write, fs::File, io, path::PathBuf, rc::Rc};

/// In-memory sink for text output. Used by tests, and anywhere a report
/// needs to be fully rendered before it is written out.
pub struct StringBuffer {
    s: String,
}

impl StringBuffer {
    pub fn new() -> StringBuffer {
        StringBuffer { s: String::new() }
    }

    pub fn as_str(&self) -> &str {
        self.s.as_str()
    }

    pub fn clear(&mut self) {
        self.s.clear();
    }
}

// String only implements fmt::Write
impl io::Write for StringBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let str_rep = std::str::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.s
            .write_str(str_rep)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// A cloneable, shared stream writer (single threaded).
//
// Warnings of interest to the user (eg. an unmatched fractional share)
// go through one of these, so they can go to stderr, or be captured
// by tests.
#[derive(Clone)]
pub struct WriteHandle {
    w: Rc<RefCell<dyn io::Write>>,
}

impl WriteHandle {
    pub fn stderr_write_handle() -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::stderr())) }
    }

    pub fn string_buff_write_handle() -> (WriteHandle, Rc<RefCell<StringBuffer>>) {
        let buffer = Rc::new(RefCell::new(StringBuffer::new()));
        let h = WriteHandle { w: buffer.clone() };
        (h, buffer)
    }

    pub fn file_write_handle(f: File) -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::BufWriter::new(f))) }
    }

    pub fn empty_write_handle() -> WriteHandle {
        WriteHandle { w: Rc::new(RefCell::new(io::sink())) }
    }
}

impl io::Write for WriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.w.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.w.borrow_mut().flush()
    }
}

// An input source along with a description for error messages.
// Either a file on disk, or text already in memory.
pub enum DescribedReader {
    String((String, String)),
    FilePath(PathBuf),
}

impl DescribedReader {
    pub fn from_string(desc: String, data: String) -> DescribedReader {
        DescribedReader::String((desc, data))
    }

    pub fn from_file_path(path: PathBuf) -> DescribedReader {
        DescribedReader::FilePath(path)
    }

    pub fn desc(&self) -> &str {
        match self {
            DescribedReader::String((name, _)) => name,
            DescribedReader::FilePath(path) =>
                path.to_str().unwrap_or("<unknown path>"),
        }
    }

    pub fn reader<'a>(&'a self) -> Result<Box<dyn io::Read + 'a>, io::Error> {
        match self {
            DescribedReader::String((_, text)) => Ok(Box::new(text.as_bytes())),
            DescribedReader::FilePath(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}
