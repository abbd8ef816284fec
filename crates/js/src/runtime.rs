//! Runtime initialization: owns the injected call table and registers the
//! guest-visible globals into an engine exactly once.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use log::debug;

use crate::bindings::{
    HostBindings, HostFnKind, HostFnSync, HostNamespace, JSError, JSObject, JSValue,
};
use crate::bridge::HostBridge;
use crate::console::Console;
use crate::encoding::{Base64, TextDecoder, TextDecoderOptions, TextEncoder};
use crate::fetch::Fetch;
use crate::fs::Fs;
use crate::globals::{
    HostClass, HostFnAsync, fetch_function, headers_class, response_class, text_decoder_class,
    text_encoder_class, url_class,
};
use crate::navigator::Navigator;
use crate::process::Process;
use crate::url::Url;

/// The engine-side registration surface.
///
/// Engine adapters implement this to place host functions and namespaces on
/// the guest global object.
pub trait GlobalRegistry {
    /// Define a global object holding `namespace`'s functions and properties.
    ///
    /// # Errors
    /// Implementations report engine failures.
    fn define_namespace(&mut self, name: &str, namespace: HostNamespace) -> Result<()>;

    /// Define a global function.
    ///
    /// # Errors
    /// Implementations report engine failures.
    fn define_function(&mut self, name: &str, function: HostFnKind) -> Result<()>;

    /// Define a global class whose instances are host objects.
    ///
    /// # Errors
    /// Implementations report engine failures.
    fn define_class(&mut self, name: &str, class: HostClass) -> Result<()>;

    /// Define a global function that returns a promise.
    ///
    /// # Errors
    /// Implementations report engine failures.
    fn define_async_function(&mut self, name: &str, function: Box<HostFnAsync>) -> Result<()>;
}

/// The shim, bound to one native call table.
#[derive(Debug)]
pub struct Runtime {
    bridge: HostBridge,
    installed: bool,
}

impl Runtime {
    /// Bind the shim to `table`.
    ///
    /// # Errors
    /// Fails when the table lacks any call the shim depends on.
    pub fn new(table: HostBindings) -> Result<Self> {
        let bridge = HostBridge::new(table);
        let missing = bridge.missing_calls();
        if !missing.is_empty() {
            bail!("host call table is missing: {}", missing.join(", "));
        }
        Ok(Self {
            bridge,
            installed: false,
        })
    }

    pub fn bridge(&self) -> &HostBridge {
        &self.bridge
    }

    /// `new URL(input, base)`.
    ///
    /// # Errors
    /// Returns `InvalidUrl` when the input does not parse.
    pub fn url(&self, input: &str, base: Option<&str>) -> Result<Url, JSError> {
        Url::parse(&self.bridge, input, base)
    }

    /// `URL.parse(input, base)`.
    pub fn url_parse(&self, input: &str, base: Option<&str>) -> Option<Url> {
        Url::try_parse(&self.bridge, input, base)
    }

    /// `URL.canParse(input, base)`.
    pub fn url_can_parse(&self, input: &str, base: Option<&str>) -> bool {
        Url::can_parse(&self.bridge, input, base)
    }

    pub fn fetch(&self) -> Fetch {
        Fetch::new(self.bridge.clone())
    }

    pub fn text_encoder(&self) -> TextEncoder {
        TextEncoder::new(self.bridge.clone())
    }

    /// `new TextDecoder(label, options)`.
    ///
    /// # Errors
    /// Returns a `RangeError` for labels other than UTF-8.
    pub fn text_decoder(
        &self,
        label: Option<&str>,
        options: TextDecoderOptions,
    ) -> Result<TextDecoder, JSError> {
        TextDecoder::new(self.bridge.clone(), label, options)
    }

    /// # Errors
    /// See [`Base64::btoa`].
    pub fn btoa(&self, input: &JSValue) -> Result<String, JSError> {
        Base64::new(self.bridge.clone()).btoa(input)
    }

    /// # Errors
    /// See [`Base64::atob`].
    pub fn atob(&self, input: &JSValue) -> Result<String, JSError> {
        Base64::new(self.bridge.clone()).atob(input)
    }

    pub fn console(&self) -> Console {
        Console::new(self.bridge.clone())
    }

    pub fn fs(&self) -> Fs {
        Fs::new(self.bridge.clone())
    }

    pub fn process(&self) -> Process {
        Process::new(self.bridge.clone())
    }

    pub fn navigator(&self) -> Navigator {
        Navigator::from_bridge(&self.bridge)
    }

    /// Register the guest-visible globals: the `URL`, `Response`, `Headers`,
    /// `TextEncoder` and `TextDecoder` classes, `fetch`, `btoa`, `atob`, and
    /// the `console`, `navigator` and `process` objects.
    ///
    /// # Errors
    /// Fails on a second call, or when the registry or host reports an error.
    pub fn install(&mut self, registry: &mut dyn GlobalRegistry) -> Result<()> {
        if self.installed {
            bail!("runtime globals are already installed");
        }
        registry.define_class("URL", url_class(&self.bridge))?;
        registry.define_async_function("fetch", fetch_function(&self.bridge))?;
        registry.define_class("Response", response_class())?;
        registry.define_class("Headers", headers_class())?;
        registry.define_class("TextEncoder", text_encoder_class(&self.bridge))?;
        registry.define_class("TextDecoder", text_decoder_class(&self.bridge))?;
        registry.define_namespace("console", self.console_namespace())?;

        let base64 = Base64::new(self.bridge.clone());
        let encoder = base64.clone();
        registry.define_function(
            "btoa",
            HostFnKind::Sync(sync_fn(move |args| {
                encoder
                    .btoa(args.first().unwrap_or(&JSValue::Undefined))
                    .map(JSValue::String)
            })),
        )?;
        registry.define_function(
            "atob",
            HostFnKind::Sync(sync_fn(move |args| {
                base64
                    .atob(args.first().unwrap_or(&JSValue::Undefined))
                    .map(JSValue::String)
            })),
        )?;

        registry.define_namespace("navigator", self.navigator_namespace())?;
        registry.define_namespace("process", self.process_namespace()?)?;

        self.installed = true;
        debug!("runtime globals installed");
        Ok(())
    }

    pub const fn is_installed(&self) -> bool {
        self.installed
    }

    fn console_namespace(&self) -> HostNamespace {
        let console = self.console();
        type Method = fn(&Console, &[JSValue]) -> Result<(), JSError>;
        let methods: [(&str, Method); 4] = [
            ("log", Console::log),
            ("info", Console::info),
            ("warn", Console::warn),
            ("error", Console::error),
        ];
        methods
            .into_iter()
            .fold(HostNamespace::new(), |namespace, (name, method)| {
                let console = console.clone();
                namespace.with_sync_fn(
                    name,
                    sync_fn(move |args| {
                        method(&console, &args)?;
                        Ok(JSValue::Undefined)
                    }),
                )
            })
    }

    fn navigator_namespace(&self) -> HostNamespace {
        let navigator = self.navigator();
        let namespace = HostNamespace::new()
            .with_property("userAgent", JSValue::String(navigator.user_agent))
            .with_property(
                "hardwareConcurrency",
                JSValue::Number(f64::from(navigator.hardware_concurrency)),
            );
        match navigator.platform {
            Some(platform) => namespace.with_property("platform", JSValue::String(platform)),
            None => namespace,
        }
    }

    fn process_namespace(&self) -> Result<HostNamespace> {
        let process = self.process();
        let argv = process.argv().map_err(|error| anyhow!("{error}"))?;
        let env = process.env().map_err(|error| anyhow!("{error}"))?;
        let env_object = env
            .into_iter()
            .fold(JSObject::plain(), |object, (key, value)| {
                object.with(&key, JSValue::String(value))
            });
        let build = process.build();
        let exit = process.clone();
        Ok(HostNamespace::new()
            .with_property(
                "argv",
                JSValue::Array(argv.into_iter().map(JSValue::String).collect()),
            )
            .with_property("env", JSValue::Object(env_object))
            .with_property("noColor", JSValue::Boolean(process.no_color()))
            .with_property(
                "build",
                JSValue::Object(
                    JSObject::plain()
                        .with("os", JSValue::String(build.os))
                        .with("arch", JSValue::String(build.arch)),
                ),
            )
            .with_sync_fn(
                "exit",
                sync_fn(move |args| {
                    let code = match args.first() {
                        Some(JSValue::Number(code)) => *code as i32,
                        _ => 0,
                    };
                    exit.exit(code)?;
                    Ok(JSValue::Undefined)
                }),
            ))
    }
}

fn sync_fn<F>(function: F) -> Arc<HostFnSync>
where
    F: Fn(Vec<JSValue>) -> Result<JSValue, JSError> + Send + Sync + 'static,
{
    Arc::new(function)
}
