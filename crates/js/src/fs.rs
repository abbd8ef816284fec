//! Synchronous file-system facade.

use serde::{Deserialize, Serialize};

use crate::bindings::{JSError, JSValue};
use crate::bridge::{HostBridge, HostFailure};
use crate::url::Url;

/// File metadata returned by [`Fs::stat_sync`].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blksize: u64,
    pub blocks: u64,
    pub atime_ms: f64,
    pub mtime_ms: f64,
    pub ctime_ms: f64,
    pub birthtime_ms: f64,
    #[serde(rename = "isFile")]
    file: bool,
    #[serde(rename = "isDirectory")]
    directory: bool,
    #[serde(rename = "isSymbolicLink")]
    symbolic_link: bool,
}

impl Stats {
    pub const fn is_file(&self) -> bool {
        self.file
    }

    pub const fn is_directory(&self) -> bool {
        self.directory
    }

    pub const fn is_symbolic_link(&self) -> bool {
        self.symbolic_link
    }

    pub const fn is_block_device(&self) -> bool {
        false
    }

    pub const fn is_character_device(&self) -> bool {
        false
    }

    pub const fn is_fifo(&self) -> bool {
        false
    }

    pub const fn is_socket(&self) -> bool {
        false
    }
}

/// A path argument: a plain path or a `file:` URL.
#[derive(Copy, Clone, Debug)]
pub enum FsPath<'a> {
    Path(&'a str),
    Url(&'a Url),
}

impl<'a> From<&'a str> for FsPath<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a String> for FsPath<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a Url> for FsPath<'a> {
    fn from(url: &'a Url) -> Self {
        Self::Url(url)
    }
}

/// Options for [`Fs::write_file_sync`] and [`Fs::write_text_file_sync`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileOptions {
    /// Add to the end of the file instead of replacing it.
    pub append: bool,
    /// Create the file when it is missing. Defaults to true.
    pub create: bool,
    /// Fail when the file already exists.
    pub create_new: bool,
}

impl Default for WriteFileOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
            create_new: false,
        }
    }
}

impl WriteFileOptions {
    pub const fn appending() -> Self {
        Self {
            append: true,
            create: true,
            create_new: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fs {
    bridge: HostBridge,
}

fn host_error(failure: HostFailure) -> JSError {
    failure.into_error(JSError::Host)
}

impl Fs {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// Turn a path argument into a host path. URLs must use the `file:`
    /// scheme; the host decodes them for its platform.
    ///
    /// # Errors
    /// Returns a `TypeError` for non-file URLs and URLs the host cannot map
    /// to a path, such as a file URL with a host on POSIX.
    pub fn resolve(&self, path: FsPath<'_>) -> Result<String, JSError> {
        let url = match path {
            FsPath::Path(path) => return Ok(path.to_string()),
            FsPath::Url(url) => url,
        };
        if url.protocol() != "file:" {
            return Err(JSError::TypeError(String::from("Must be a file URL")));
        }
        self.bridge
            .call_string("fs", "pathFromUrl", vec![JSValue::from(url.href())])
            .map_err(|failure| failure.into_error(JSError::TypeError))
    }

    /// The file's bytes.
    ///
    /// # Errors
    /// Returns a host error when the file cannot be read.
    pub fn read_file_sync<'a>(&self, path: impl Into<FsPath<'a>>) -> Result<Vec<u8>, JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_bytes("fs", "readFileSync", vec![JSValue::String(path)])
            .map_err(host_error)
    }

    /// The file's content as UTF-8 text, taken verbatim.
    ///
    /// # Errors
    /// Returns a host error when the file cannot be read.
    pub fn read_text_file_sync<'a>(&self, path: impl Into<FsPath<'a>>) -> Result<String, JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_string("fs", "readTextFileSync", vec![JSValue::String(path)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error when the file cannot be written, or already
    /// exists and `create_new` is set.
    pub fn write_file_sync<'a>(
        &self,
        path: impl Into<FsPath<'a>>,
        data: &[u8],
        options: WriteFileOptions,
    ) -> Result<(), JSError> {
        let path = self.resolve(path.into())?;
        let args = vec![
            JSValue::String(path),
            JSValue::ArrayBuffer(data.to_vec()),
            options_json(options)?,
        ];
        self.bridge
            .call_unit("fs", "writeFileSync", args)
            .map_err(host_error)
    }

    /// # Errors
    /// Same as [`Fs::write_file_sync`].
    pub fn write_text_file_sync<'a>(
        &self,
        path: impl Into<FsPath<'a>>,
        text: &str,
        options: WriteFileOptions,
    ) -> Result<(), JSError> {
        let path = self.resolve(path.into())?;
        let args = vec![JSValue::String(path), JSValue::from(text), options_json(options)?];
        self.bridge
            .call_unit("fs", "writeTextFileSync", args)
            .map_err(host_error)
    }

    /// Host failures, and URLs that do not map to a path, count as "does not exist".
    pub fn exists_sync<'a>(&self, path: impl Into<FsPath<'a>>) -> bool {
        let Ok(path) = self.resolve(path.into()) else {
            return false;
        };
        matches!(
            self.bridge.call("fs", "existsSync", vec![JSValue::String(path)]),
            Ok(JSValue::Boolean(true))
        )
    }

    /// # Errors
    /// Returns a host error when the path cannot be inspected.
    pub fn stat_sync<'a>(&self, path: impl Into<FsPath<'a>>) -> Result<Stats, JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_json("fs", "statSync", vec![JSValue::String(path)])
            .map_err(host_error)
    }

    /// Entry names in the directory.
    ///
    /// # Errors
    /// Returns a host error when the directory cannot be listed.
    pub fn readdir_sync<'a>(&self, path: impl Into<FsPath<'a>>) -> Result<Vec<String>, JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_json("fs", "readdirSync", vec![JSValue::String(path)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error when the directory cannot be created.
    pub fn mkdir_sync<'a>(
        &self,
        path: impl Into<FsPath<'a>>,
        recursive: bool,
    ) -> Result<(), JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_unit("fs", "mkdirSync", vec![JSValue::String(path), JSValue::from(recursive)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error when the path cannot be removed.
    pub fn remove_sync<'a>(
        &self,
        path: impl Into<FsPath<'a>>,
        recursive: bool,
    ) -> Result<(), JSError> {
        let path = self.resolve(path.into())?;
        self.bridge
            .call_unit("fs", "removeSync", vec![JSValue::String(path), JSValue::from(recursive)])
            .map_err(host_error)
    }

    /// # Errors
    /// Returns a host error when the copy fails.
    pub fn copy_file_sync<'a, 'b>(
        &self,
        from: impl Into<FsPath<'a>>,
        to: impl Into<FsPath<'b>>,
    ) -> Result<(), JSError> {
        let from = self.resolve(from.into())?;
        let to = self.resolve(to.into())?;
        self.bridge
            .call_unit("fs", "copyFileSync", vec![JSValue::String(from), JSValue::String(to)])
            .map_err(host_error)
    }
}

fn options_json(options: WriteFileOptions) -> Result<JSValue, JSError> {
    serde_json::to_string(&options)
        .map(JSValue::String)
        .map_err(|error| JSError::InternalError(error.to_string()))
}
