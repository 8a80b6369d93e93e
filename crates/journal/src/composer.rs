use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Reusable path buffer anchored to a fixed root.
///
/// The engine renders every relative path against up to two `(root,
/// prefix)` pairs per stage; this type keeps the root (and the remembered
/// directory) in place and only rewrites the tail, so no stage allocates a
/// fresh path string per record.
///
/// The optional prefix salts the *filename only*: a record with final
/// relative path `/a/b/c` composes to `<root>/a/b/<prefix>c`. Because the
/// directory part never changes, committing a salted sibling onto its
/// final name is a rename within one directory.
#[derive(Clone, Debug)]
pub struct PathComposer {
    buf: Vec<u8>,
    root_len: usize,
    dir_len: usize,
    prefix: Vec<u8>,
}

impl PathComposer {
    /// Creates a composer with no filename salt.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self::with_prefix(root, OsStr::new(""))
    }

    /// Creates a composer that salts every filename with `prefix`.
    #[must_use]
    pub fn with_prefix(root: &Path, prefix: &OsStr) -> Self {
        let buf = root.as_os_str().as_bytes().to_vec();
        let root_len = buf.len();

        Self {
            buf,
            root_len,
            dir_len: root_len,
            prefix: prefix.as_bytes().to_vec(),
        }
    }

    /// Sets the buffer to `root + rel_path` and remembers the directory
    /// boundary for subsequent [`set_filename`](Self::set_filename) calls.
    ///
    /// A trailing `/` is appended unless `rel_path` is the root `"/"`
    /// itself. `rel_path` must begin with `/`.
    pub fn set_directory(&mut self, rel_path: &OsStr) {
        let rel = rel_path.as_bytes();
        assert!(rel.starts_with(b"/"), "relative path must begin with '/'");

        self.buf.truncate(self.root_len);
        self.buf.extend_from_slice(rel);
        if rel != b"/" {
            self.buf.push(b'/');
        }
        self.dir_len = self.buf.len();
    }

    /// Replaces the filename part with `prefix + name`, keeping the
    /// directory set by the last [`set_directory`](Self::set_directory).
    pub fn set_filename(&mut self, name: &OsStr) {
        self.buf.truncate(self.dir_len);
        self.buf.extend_from_slice(&self.prefix);
        self.buf.extend_from_slice(name.as_bytes());
    }

    /// Sets the buffer to `root + rel_path` with the prefix spliced in
    /// after the last `/`, salting the filename but not the directory.
    ///
    /// `rel_path` must contain at least one `/`.
    pub fn set_path(&mut self, rel_path: &OsStr) {
        let rel = rel_path.as_bytes();
        let split = rel
            .iter()
            .rposition(|&b| b == b'/')
            .expect("relative path must contain '/'");

        self.buf.truncate(self.root_len);
        self.buf.extend_from_slice(&rel[..=split]);
        self.buf.extend_from_slice(&self.prefix);
        self.buf.extend_from_slice(&rel[split + 1..]);
    }

    /// The composed path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(&self.buf))
    }

    /// The part after the root, i.e. the relative path of the composed
    /// location.
    #[must_use]
    pub fn relative_path(&self) -> &OsStr {
        OsStr::from_bytes(&self.buf[self.root_len..])
    }
}
