//! File-system, process and navigator facades.

mod common;

use common::MockHost;
use js_shim::{BuildInfo, ErrorKind, JSError, Runtime, WriteFileOptions};

fn setup() -> (MockHost, Runtime) {
    let host = MockHost::new();
    let runtime = Runtime::new(host.bindings()).unwrap();
    (host, runtime)
}

#[test]
fn files_round_trip() {
    let (_host, runtime) = setup();
    let fs = runtime.fs();
    assert!(!fs.exists_sync("/work/a.txt"));
    fs.write_text_file_sync("/work/a.txt", "alpha", WriteFileOptions::default())
        .unwrap();
    assert!(fs.exists_sync("/work/a.txt"));
    assert_eq!(fs.read_text_file_sync("/work/a.txt").unwrap(), "alpha");
    assert_eq!(fs.read_file_sync("/work/a.txt").unwrap(), b"alpha");
    fs.copy_file_sync("/work/a.txt", "/work/b.txt").unwrap();
    assert_eq!(fs.readdir_sync("/work").unwrap(), vec!["a.txt", "b.txt"]);
    fs.remove_sync("/work/a.txt", false).unwrap();
    assert_eq!(fs.readdir_sync("/work").unwrap(), vec!["b.txt"]);
    fs.mkdir_sync("/work/nested", true).unwrap();
}

#[test]
fn missing_files_surface_host_errors() {
    let (_host, runtime) = setup();
    let error = runtime.fs().read_text_file_sync("/nope").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Host);
    assert_eq!(error.to_string(), "Error: ENOENT: no such file, '/nope'");
}

#[test]
fn stat_reports_file_kind() {
    let (_host, runtime) = setup();
    let fs = runtime.fs();
    fs.write_file_sync("/s.txt", b"12345", WriteFileOptions::default())
        .unwrap();
    let stats = fs.stat_sync("/s.txt").unwrap();
    assert_eq!(stats.size, 5);
    assert_eq!(stats.mode, 0o100_644);
    assert!((stats.mtime_ms - 1_000.5).abs() < f64::EPSILON);
    assert!(stats.is_file());
    assert!(!stats.is_directory());
    assert!(!stats.is_symbolic_link());
    assert!(!stats.is_fifo());
}

#[test]
fn text_that_starts_like_a_host_error_is_content() {
    let (_host, runtime) = setup();
    let fs = runtime.fs();
    fs.write_text_file_sync("/log.txt", "ERROR: boom", WriteFileOptions::default())
        .unwrap();
    assert_eq!(fs.read_text_file_sync("/log.txt").unwrap(), "ERROR: boom");
}

#[test]
fn bytes_and_write_options() {
    let (_host, runtime) = setup();
    let fs = runtime.fs();
    fs.write_file_sync("/bin", &[0, 255], WriteFileOptions::default())
        .unwrap();
    fs.write_file_sync("/bin", &[7], WriteFileOptions::appending())
        .unwrap();
    assert_eq!(fs.read_file_sync("/bin").unwrap(), vec![0, 255, 7]);
    assert_eq!(fs.read_text_file_sync("/bin").unwrap(), "\0\u{fffd}\u{7}");

    let create_new = WriteFileOptions {
        create_new: true,
        ..WriteFileOptions::default()
    };
    let error = fs.write_file_sync("/bin", &[1], create_new).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Host);
    fs.write_file_sync("/fresh", &[1], create_new).unwrap();

    let no_create = WriteFileOptions {
        create: false,
        ..WriteFileOptions::default()
    };
    assert!(fs.write_text_file_sync("/absent", "x", no_create).is_err());
    assert!(!fs.exists_sync("/absent"));
    fs.write_text_file_sync("/bin", "over", WriteFileOptions::default())
        .unwrap();
    assert_eq!(fs.read_file_sync("/bin").unwrap(), b"over");
}

#[test]
fn file_urls_are_accepted_as_paths() {
    let (_host, runtime) = setup();
    let fs = runtime.fs();
    let url = runtime.url("file:///work/a%20b.txt", None).unwrap();
    fs.write_text_file_sync(&url, "spaced", WriteFileOptions::default())
        .unwrap();
    assert!(fs.exists_sync("/work/a b.txt"));
    assert_eq!(fs.read_text_file_sync(&url).unwrap(), "spaced");
    assert_eq!(fs.resolve((&url).into()).unwrap(), "/work/a b.txt");

    let web = runtime.url("https://example.com/a.txt", None).unwrap();
    assert_eq!(
        fs.read_file_sync(&web).unwrap_err(),
        JSError::TypeError(String::from("Must be a file URL"))
    );
    assert!(!fs.exists_sync(&web));
    let remote = runtime.url("file://server/share/a.txt", None).unwrap();
    assert_eq!(
        fs.stat_sync(&remote).unwrap_err(),
        JSError::TypeError(String::from("Host must be empty"))
    );
}

#[test]
fn environment_operations() {
    let (_host, runtime) = setup();
    let process = runtime.process();
    assert_eq!(process.env_get("HOME").unwrap().as_deref(), Some("/home/guest"));
    assert_eq!(process.env_get("MISSING").unwrap(), None);
    process.env_set("MODE", "test").unwrap();
    assert!(process.env_has("MODE").unwrap());
    assert_eq!(process.env().unwrap().get("MODE").map(String::as_str), Some("test"));
    process.env_delete("MODE").unwrap();
    assert!(!process.env_has("MODE").unwrap());
    assert_eq!(process.argv().unwrap(), vec!["shim", "main.js"]);
    assert!(process.no_color());
    assert_eq!(
        process.build(),
        BuildInfo {
            os: String::from("linux"),
            arch: String::from("x86_64"),
        }
    );
}

#[test]
fn exit_is_forwarded() {
    let (host, runtime) = setup();
    runtime.process().exit(2).unwrap();
    assert_eq!(host.state.lock().unwrap().exit_codes, vec![2]);
}

#[test]
fn navigator_reads_host_constants() {
    let (_host, runtime) = setup();
    let navigator = runtime.navigator();
    assert_eq!(navigator.user_agent, "mock/1.0");
    assert_eq!(navigator.platform.as_deref(), Some("Linux x86_64"));
    assert_eq!(navigator.hardware_concurrency, 4);
}
