//! Shared fixtures for the request parsing benchmarks.

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    read_size: usize,
}

impl TestCase {
    /// A case that hands the whole file to the parser in one read.
    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self { name, file, read_size: file.content().len() }
    }

    /// A case that hands the file to the parser `read_size` bytes at a time.
    pub fn fragmented(name: &'static str, file: TestFile, read_size: usize) -> Self {
        Self { name, file, read_size: read_size.max(1) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn read_size(&self) -> usize {
        self.read_size
    }

    /// A fresh source over the file content, honouring the case's read size.
    pub fn source(&self) -> SteppedSource {
        SteppedSource { data: self.file.content().as_bytes(), step: self.read_size }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// A [`std::io::Read`] over static bytes that returns at most `step` bytes per read.
#[derive(Debug)]
pub struct SteppedSource {
    data: &'static [u8],
    step: usize,
}

impl std::io::Read for SteppedSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.len().min(buf.len()).min(self.step);
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}
