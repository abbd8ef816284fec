//! The `fs` namespace, backed by `std::fs`.

use std::fs::{self, Metadata, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use js_shim::bindings::{optional_flag, optional_string, parse_bytes, parse_string};
use js_shim::{HostFnSync, HostNamespace, JSError, JSValue};
use log::warn;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// Options sent as JSON with `writeFileSync` and `writeTextFileSync`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WriteOptions {
    append: bool,
    create: bool,
    create_new: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: true,
            create_new: false,
        }
    }
}

pub fn build_fs_namespace() -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn("readFileSync", build_read_file())
        .with_sync_fn("readTextFileSync", build_read_text_file())
        .with_sync_fn("writeFileSync", build_write_file(false))
        .with_sync_fn("writeTextFileSync", build_write_file(true))
        .with_sync_fn("pathFromUrl", build_path_from_url())
        .with_sync_fn("existsSync", build_exists())
        .with_sync_fn("statSync", build_stat())
        .with_sync_fn("readdirSync", build_readdir())
        .with_sync_fn("mkdirSync", build_mkdir())
        .with_sync_fn("removeSync", build_remove())
        .with_sync_fn("copyFileSync", build_copy_file())
}

fn io_error(path: &str, error: std::io::Error) -> JSError {
    warn!("fs: {path}: {error}");
    JSError::Host(format!("{path}: {error}"))
}

fn build_read_file() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        fs::read(&path)
            .map(JSValue::ArrayBuffer)
            .map_err(|error| io_error(&path, error))
    })
}

fn build_read_text_file() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        fs::read_to_string(&path)
            .map(JSValue::String)
            .map_err(|error| io_error(&path, error))
    })
}

/// `writeFileSync(path, bytes, options)`, or with `text` set,
/// `writeTextFileSync(path, text, options)`.
fn build_write_file(text: bool) -> Arc<HostFnSync> {
    Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        let data = if text {
            parse_string(&args, 1, "data")?.into_bytes()
        } else {
            parse_bytes(&args, 1, "data")?
        };
        let options = optional_string(&args, 2, "");
        let options: WriteOptions = if options.is_empty() {
            WriteOptions::default()
        } else {
            serde_json::from_str(&options)
                .map_err(|error| JSError::TypeError(format!("invalid write options: {error}")))?
        };
        write_with(&path, &data, &options).map_err(|error| io_error(&path, error))?;
        Ok(JSValue::Undefined)
    })
}

fn write_with(path: &str, data: &[u8], options: &WriteOptions) -> std::io::Result<()> {
    let mut open = OpenOptions::new();
    open.write(true);
    if options.append {
        open.append(true);
    } else {
        open.truncate(true);
    }
    if options.create_new {
        open.create_new(true);
    } else {
        open.create(options.create);
    }
    open.open(path)?.write_all(data)
}

/// Decode a `file:` URL into a path for this platform.
fn build_path_from_url() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let href = parse_string(&args, 0, "url")?;
        let url = Url::parse(&href).map_err(|_| JSError::InvalidUrl(href.clone()))?;
        if url.scheme() != "file" {
            return Err(JSError::TypeError(String::from("Must be a file URL")));
        }
        if !cfg!(windows) && url.host_str().is_some_and(|host| !host.is_empty()) {
            return Err(JSError::TypeError(String::from("Host must be empty")));
        }
        let path = url
            .to_file_path()
            .map_err(|()| JSError::TypeError(format!("{href} is not a valid file path")))?;
        Ok(JSValue::String(path.to_string_lossy().into_owned()))
    })
}

fn build_exists() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        Ok(JSValue::Boolean(Path::new(&path).exists()))
    })
}

fn build_stat() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        let metadata = fs::metadata(&path).map_err(|error| io_error(&path, error))?;
        let symbolic_link = fs::symlink_metadata(&path)
            .map(|link| link.file_type().is_symlink())
            .unwrap_or(false);
        Ok(JSValue::String(stat_json(&metadata, symbolic_link).to_string()))
    })
}

fn millis(time: std::io::Result<SystemTime>) -> f64 {
    time.ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |elapsed| elapsed.as_secs_f64() * 1000.0)
}

fn stat_json(metadata: &Metadata, symbolic_link: bool) -> Value {
    let mut stats = json!({
        "size": metadata.len(),
        "atimeMs": millis(metadata.accessed()),
        "mtimeMs": millis(metadata.modified()),
        "birthtimeMs": millis(metadata.created()),
        "isFile": metadata.is_file(),
        "isDirectory": metadata.is_dir(),
        "isSymbolicLink": symbolic_link,
    });
    if let Value::Object(map) = &mut stats {
        for (key, value) in platform_fields(metadata) {
            map.insert(key.to_string(), value);
        }
    }
    stats
}

#[cfg(unix)]
fn platform_fields(metadata: &Metadata) -> Vec<(&'static str, Value)> {
    use std::os::unix::fs::MetadataExt as _;

    vec![
        ("dev", json!(metadata.dev())),
        ("ino", json!(metadata.ino())),
        ("mode", json!(metadata.mode())),
        ("nlink", json!(metadata.nlink())),
        ("uid", json!(metadata.uid())),
        ("gid", json!(metadata.gid())),
        ("rdev", json!(metadata.rdev())),
        ("blksize", json!(metadata.blksize())),
        ("blocks", json!(metadata.blocks())),
        (
            "ctimeMs",
            json!(metadata.ctime() as f64 * 1000.0 + metadata.ctime_nsec() as f64 / 1e6),
        ),
    ]
}

/// No status-change time outside unix; `ctimeMs` is left out and reads as 0.
#[cfg(not(unix))]
fn platform_fields(metadata: &Metadata) -> Vec<(&'static str, Value)> {
    let mode: u32 = if metadata.permissions().readonly() { 0o444 } else { 0o666 };
    vec![("mode", json!(mode)), ("nlink", json!(1))]
}

fn build_readdir() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&path).map_err(|error| io_error(&path, error))? {
            let entry = entry.map_err(|error| io_error(&path, error))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(JSValue::String(json!(names).to_string()))
    })
}

fn build_mkdir() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        let created = if optional_flag(&args, 1) {
            fs::create_dir_all(&path)
        } else {
            fs::create_dir(&path)
        };
        created.map_err(|error| io_error(&path, error))?;
        Ok(JSValue::Undefined)
    })
}

fn build_remove() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let path = parse_string(&args, 0, "path")?;
        let recursive = optional_flag(&args, 1);
        let metadata = fs::symlink_metadata(&path).map_err(|error| io_error(&path, error))?;
        let removed = match (metadata.is_dir(), recursive) {
            (true, true) => fs::remove_dir_all(&path),
            (true, false) => fs::remove_dir(&path),
            (false, _) => fs::remove_file(&path),
        };
        removed.map_err(|error| io_error(&path, error))?;
        Ok(JSValue::Undefined)
    })
}

fn build_copy_file() -> Arc<HostFnSync> {
    Arc::new(|args: Vec<JSValue>| -> Result<JSValue, JSError> {
        let from = parse_string(&args, 0, "source")?;
        let to = parse_string(&args, 1, "destination")?;
        fs::copy(&from, &to).map_err(|error| io_error(&from, error))?;
        Ok(JSValue::Undefined)
    })
}
