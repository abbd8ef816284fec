//! In-memory call table shared by the integration tests.
//!
//! The mock mirrors the reply formats of the real host: JSON payloads, the
//! `"ERROR: "` sentinel from `encoding.decode`/`encoding.atob`, `{"error": ...}`
//! objects for url calls, and `null` from `fetch.poll` while a task is pending.
//! URLs go through the same WHATWG parser the real host uses.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use js_shim::bindings::parse_bytes;
use js_shim::{HostBindings, HostFnSync, HostNamespace, JSError, JSValue};
use serde_json::{Value, json};
use url::{Url, quirks};

/// A scripted fetch outcome: `pending_polls` null replies, then `reply`.
#[derive(Clone, Debug)]
pub struct PlannedFetch {
    pub pending_polls: usize,
    pub reply: Value,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub fetch_plans: HashMap<String, PlannedFetch>,
    pub fetch_starts: Vec<(String, String, String, String)>,
    pub fetch_tasks: HashMap<String, PlannedFetch>,
    pub poll_log: Vec<String>,
    pub next_task: u64,
    pub files: BTreeMap<String, Vec<u8>>,
    pub env: BTreeMap<String, String>,
    pub argv: Vec<String>,
    pub exit_codes: Vec<i32>,
}

#[derive(Clone, Default)]
pub struct MockHost {
    pub state: Arc<Mutex<MockState>>,
}

impl MockHost {
    pub fn new() -> Self {
        let host = Self::default();
        {
            let mut state = host.state.lock().unwrap();
            state.argv = vec![String::from("shim"), String::from("main.js")];
            state.env.insert(String::from("HOME"), String::from("/home/guest"));
        }
        host
    }

    pub fn plan_fetch(&self, url: &str, pending_polls: usize, reply: Value) {
        self.state.lock().unwrap().fetch_plans.insert(
            url.to_string(),
            PlannedFetch {
                pending_polls,
                reply,
            },
        );
    }

    pub fn stdout(&self) -> Vec<String> {
        self.state.lock().unwrap().stdout.clone()
    }

    pub fn stderr(&self) -> Vec<String> {
        self.state.lock().unwrap().stderr.clone()
    }

    pub fn bindings(&self) -> HostBindings {
        HostBindings::new()
            .with_namespace("encoding", encoding_namespace())
            .with_namespace("url", url_namespace())
            .with_namespace("fetch", self.fetch_namespace())
            .with_namespace("console", self.console_namespace())
            .with_namespace("fs", self.fs_namespace())
            .with_namespace("process", self.process_namespace())
            .with_namespace(
                "navigator",
                HostNamespace::new()
                    .with_property("userAgent", JSValue::from("mock/1.0"))
                    .with_property("platform", JSValue::from("Linux x86_64"))
                    .with_property("hardwareConcurrency", JSValue::Number(4.0)),
            )
    }

    fn with_state<F>(&self, function: F) -> Arc<HostFnSync>
    where
        F: Fn(&mut MockState, Vec<JSValue>) -> Result<JSValue, JSError> + Send + Sync + 'static,
    {
        let state = Arc::clone(&self.state);
        Arc::new(move |args: Vec<JSValue>| -> Result<JSValue, JSError> {
            let mut guard = state.lock().unwrap();
            function(&mut guard, args)
        })
    }

    fn fetch_namespace(&self) -> HostNamespace {
        HostNamespace::new()
            .with_sync_fn(
                "start",
                self.with_state(|state, args| {
                    let url = text(&args, 0);
                    state.fetch_starts.push((
                        url.clone(),
                        text(&args, 1),
                        text(&args, 2),
                        text(&args, 3),
                    ));
                    let Some(plan) = state.fetch_plans.get(&url).cloned() else {
                        return Err(JSError::TypeError(format!("no route to {url}")));
                    };
                    state.next_task += 1;
                    let id = state.next_task.to_string();
                    state.fetch_tasks.insert(id.clone(), plan);
                    Ok(JSValue::String(id))
                }),
            )
            .with_sync_fn(
                "poll",
                self.with_state(|state, args| {
                    let id = text(&args, 0);
                    state.poll_log.push(id.clone());
                    let Some(task) = state.fetch_tasks.get_mut(&id) else {
                        return Err(JSError::TypeError(format!("unknown fetch task {id}")));
                    };
                    if task.pending_polls > 0 {
                        task.pending_polls -= 1;
                        return Ok(JSValue::Null);
                    }
                    let reply = task.reply.to_string();
                    state.fetch_tasks.remove(&id);
                    Ok(JSValue::String(reply))
                }),
            )
    }

    fn console_namespace(&self) -> HostNamespace {
        HostNamespace::new()
            .with_sync_fn(
                "print",
                self.with_state(|state, args| {
                    state.stdout.push(text(&args, 0));
                    Ok(JSValue::Undefined)
                }),
            )
            .with_sync_fn(
                "printError",
                self.with_state(|state, args| {
                    state.stderr.push(text(&args, 0));
                    Ok(JSValue::Undefined)
                }),
            )
    }

    fn fs_namespace(&self) -> HostNamespace {
        let missing = |path: &str| JSError::TypeError(format!("ENOENT: no such file, '{path}'"));
        HostNamespace::new()
            .with_sync_fn(
                "readFileSync",
                self.with_state(move |state, args| {
                    let path = text(&args, 0);
                    let content = state.files.get(&path).ok_or_else(|| missing(&path))?;
                    Ok(JSValue::ArrayBuffer(content.clone()))
                }),
            )
            .with_sync_fn(
                "readTextFileSync",
                self.with_state(move |state, args| {
                    let path = text(&args, 0);
                    let content = state.files.get(&path).ok_or_else(|| missing(&path))?;
                    Ok(JSValue::String(String::from_utf8_lossy(content).into_owned()))
                }),
            )
            .with_sync_fn(
                "writeFileSync",
                self.with_state(|state, args| {
                    let data = parse_bytes(&args, 1, "data")?;
                    write(state, &text(&args, 0), data, &text(&args, 2))
                }),
            )
            .with_sync_fn(
                "writeTextFileSync",
                self.with_state(|state, args| {
                    let data = text(&args, 1).into_bytes();
                    write(state, &text(&args, 0), data, &text(&args, 2))
                }),
            )
            .with_sync_fn(
                "pathFromUrl",
                stateless(|args| {
                    let url = Url::parse(&text(&args, 0)).unwrap();
                    if url.host_str().is_some_and(|host| !host.is_empty()) {
                        return Err(JSError::TypeError(String::from("Host must be empty")));
                    }
                    let path = url.to_file_path().unwrap();
                    Ok(JSValue::String(path.to_string_lossy().into_owned()))
                }),
            )
            .with_sync_fn(
                "existsSync",
                self.with_state(|state, args| {
                    Ok(JSValue::Boolean(state.files.contains_key(&text(&args, 0))))
                }),
            )
            .with_sync_fn(
                "statSync",
                self.with_state(move |state, args| {
                    let path = text(&args, 0);
                    let content = state.files.get(&path).ok_or_else(|| missing(&path))?;
                    let stats = json!({
                        "size": content.len(),
                        "mode": 0o100_644,
                        "isFile": true,
                        "isDirectory": false,
                        "isSymbolicLink": false,
                        "mtimeMs": 1_000.5,
                    });
                    Ok(JSValue::String(stats.to_string()))
                }),
            )
            .with_sync_fn(
                "readdirSync",
                self.with_state(|state, args| {
                    let prefix = format!("{}/", text(&args, 0));
                    let names: Vec<String> = state
                        .files
                        .keys()
                        .filter_map(|path| path.strip_prefix(&prefix).map(str::to_string))
                        .collect();
                    Ok(JSValue::String(json!(names).to_string()))
                }),
            )
            .with_sync_fn("mkdirSync", self.with_state(|_state, _args| Ok(JSValue::Undefined)))
            .with_sync_fn(
                "removeSync",
                self.with_state(move |state, args| {
                    let path = text(&args, 0);
                    state
                        .files
                        .remove(&path)
                        .map(|_| JSValue::Undefined)
                        .ok_or_else(|| missing(&path))
                }),
            )
            .with_sync_fn(
                "copyFileSync",
                self.with_state(move |state, args| {
                    let from = text(&args, 0);
                    let content = state.files.get(&from).cloned().ok_or_else(|| missing(&from))?;
                    state.files.insert(text(&args, 1), content);
                    Ok(JSValue::Undefined)
                }),
            )
    }

    fn process_namespace(&self) -> HostNamespace {
        HostNamespace::new()
            .with_sync_fn(
                "env",
                self.with_state(|state, _args| Ok(JSValue::String(json!(state.env).to_string()))),
            )
            .with_sync_fn(
                "envGet",
                self.with_state(|state, args| {
                    Ok(state
                        .env
                        .get(&text(&args, 0))
                        .cloned()
                        .map_or(JSValue::Null, JSValue::String))
                }),
            )
            .with_sync_fn(
                "envSet",
                self.with_state(|state, args| {
                    state.env.insert(text(&args, 0), text(&args, 1));
                    Ok(JSValue::Undefined)
                }),
            )
            .with_sync_fn(
                "envDelete",
                self.with_state(|state, args| {
                    state.env.remove(&text(&args, 0));
                    Ok(JSValue::Undefined)
                }),
            )
            .with_sync_fn(
                "envHas",
                self.with_state(|state, args| {
                    Ok(JSValue::Boolean(state.env.contains_key(&text(&args, 0))))
                }),
            )
            .with_sync_fn(
                "argv",
                self.with_state(|state, _args| Ok(JSValue::String(json!(state.argv).to_string()))),
            )
            .with_sync_fn(
                "exit",
                self.with_state(|state, args| {
                    let code = match args.first() {
                        Some(JSValue::Number(code)) => *code as i32,
                        _ => 0,
                    };
                    state.exit_codes.push(code);
                    Ok(JSValue::Undefined)
                }),
            )
            .with_property("noColor", JSValue::Boolean(true))
            .with_property("os", JSValue::from("linux"))
            .with_property("arch", JSValue::from("x86_64"))
    }
}

/// Apply `writeFileSync` options the way the real host does.
fn write(
    state: &mut MockState,
    path: &str,
    data: Vec<u8>,
    options: &str,
) -> Result<JSValue, JSError> {
    let options: Value = if options.is_empty() {
        json!({})
    } else {
        serde_json::from_str(options).unwrap()
    };
    let flag = |key: &str, default: bool| options[key].as_bool().unwrap_or(default);
    let exists = state.files.contains_key(path);
    if flag("createNew", false) && exists {
        return Err(JSError::TypeError(format!("EEXIST: file already exists, '{path}'")));
    }
    if !flag("create", true) && !exists {
        return Err(JSError::TypeError(format!("ENOENT: no such file, '{path}'")));
    }
    let file = state.files.entry(path.to_string()).or_default();
    if !flag("append", false) {
        file.clear();
    }
    file.extend(data);
    Ok(JSValue::Undefined)
}

pub fn text(args: &[JSValue], index: usize) -> String {
    args.get(index)
        .and_then(JSValue::as_str)
        .unwrap_or_default()
        .to_string()
}

fn stateless<F>(function: F) -> Arc<HostFnSync>
where
    F: Fn(Vec<JSValue>) -> Result<JSValue, JSError> + Send + Sync + 'static,
{
    Arc::new(function)
}

fn encoding_namespace() -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn(
            "encode",
            stateless(|args| Ok(JSValue::String(json!(text(&args, 0).as_bytes()).to_string()))),
        )
        .with_sync_fn(
            "decode",
            stateless(|args| {
                let bytes: Vec<u8> = serde_json::from_str(&text(&args, 0)).unwrap();
                Ok(JSValue::String(match String::from_utf8(bytes) {
                    Ok(decoded) => decoded,
                    Err(error) => format!("ERROR: {error}"),
                }))
            }),
        )
        .with_sync_fn(
            "decodeLossy",
            stateless(|args| {
                let bytes: Vec<u8> = serde_json::from_str(&text(&args, 0)).unwrap();
                Ok(JSValue::String(String::from_utf8_lossy(&bytes).into_owned()))
            }),
        )
        .with_sync_fn(
            "btoa",
            stateless(|args| match text(&args, 0).as_str() {
                "abc" => Ok(JSValue::from("YWJj")),
                "" => Ok(JSValue::from("")),
                other => Err(JSError::TypeError(format!("cannot encode {other:?}"))),
            }),
        )
        .with_sync_fn(
            "atob",
            stateless(|args| match text(&args, 0).as_str() {
                "YWJj" => Ok(JSValue::from("abc")),
                _ => Ok(JSValue::from("ERROR: Invalid character")),
            }),
        )
}

fn record(url: &Url) -> Value {
    json!({
        "href": quirks::href(url),
        "origin": quirks::origin(url),
        "protocol": quirks::protocol(url),
        "username": quirks::username(url),
        "password": quirks::password(url),
        "host": quirks::host(url),
        "hostname": quirks::hostname(url),
        "port": quirks::port(url),
        "pathname": quirks::pathname(url),
        "search": quirks::search(url),
        "hash": quirks::hash(url),
    })
}

fn set_component(url: &mut Url, component: &str, value: &str) -> Result<(), String> {
    let rejected = |()| format!("invalid {component}: {value}");
    match component {
        "href" => quirks::set_href(url, value).map_err(|error| error.to_string()),
        "protocol" => quirks::set_protocol(url, value).map_err(rejected),
        "username" => quirks::set_username(url, value).map_err(rejected),
        "password" => quirks::set_password(url, value).map_err(rejected),
        "host" => quirks::set_host(url, value).map_err(rejected),
        "hostname" => quirks::set_hostname(url, value).map_err(rejected),
        "port" => quirks::set_port(url, value).map_err(rejected),
        "pathname" => {
            quirks::set_pathname(url, value);
            Ok(())
        }
        "search" => {
            quirks::set_search(url, value);
            Ok(())
        }
        "hash" => {
            quirks::set_hash(url, value);
            Ok(())
        }
        other => Err(format!("unknown component {other}")),
    }
}

fn url_namespace() -> HostNamespace {
    HostNamespace::new()
        .with_sync_fn(
            "parse",
            stateless(|args| {
                let input = text(&args, 0);
                let base = text(&args, 1);
                let parsed = if base.is_empty() {
                    Url::parse(&input)
                } else {
                    Url::parse(&base).and_then(|base| base.join(&input))
                };
                let reply = parsed.map_or_else(
                    |error| json!({"error": format!("Invalid URL: {error}")}),
                    |url| record(&url),
                );
                Ok(JSValue::String(reply.to_string()))
            }),
        )
        .with_sync_fn(
            "setComponent",
            stateless(|args| {
                let mut url = Url::parse(&text(&args, 0)).unwrap();
                let reply = match set_component(&mut url, &text(&args, 1), &text(&args, 2)) {
                    Ok(()) => record(&url),
                    Err(message) => json!({ "error": message }),
                };
                Ok(JSValue::String(reply.to_string()))
            }),
        )
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
