use cfg_if::cfg_if;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use tracing_subscriber::util::SubscriberInitExt;

/// `RUST_LOG`, or `info` when it is unset or unparsable
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Route events to the browser console. Calling it twice is harmless.
        pub fn init() {
            let console = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console)
                .try_init();

            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::ffi::OsStr;
        use std::io;
        use std::any::Any;
        use std::panic::Location;
        use std::path::{Path, PathBuf};

        use once_cell::sync::OnceCell;
        use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
        use tracing_subscriber::fmt;

        /// Flushes the file writer when the process exits
        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        /// Used when `RUST_LOG_FILE` is unset, relative to the working directory
        pub const DEFAULT_LOG_FILE: &str = "logs/ballerone.log";

        /// Steering edges and replay reports go to stderr and to a log file
        /// that rolls over daily. A second call keeps the first subscriber.
        pub fn init() {
            let stderr_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_file(true)
                .with_line_number(true)
                .compact();

            let file_layer = fmt::layer()
                .with_writer(file_writer(&log_file_path()))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .compact();

            let installed = tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(file_layer)
                .try_init();
            if installed.is_err() {
                return;
            }

            std::panic::set_hook(Box::new(|info| {
                let backtrace = std::backtrace::Backtrace::force_capture();
                tracing::error!("{}\nBacktrace:\n{:?}", panic_message(info.payload(), info.location()), backtrace);
            }));
        }

        fn log_file_path() -> PathBuf {
            std::env::var_os("RUST_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
        }

        fn file_writer(path: &Path) -> NonBlocking {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("ballerone.log"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            let _ = FILE_GUARD.set(guard);
            writer
        }

        fn panic_message(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
            let payload = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string panic>");
            match location {
                Some(loc) => format!("panic at {}:{}:{} {payload}", loc.file(), loc.line(), loc.column()),
                None => payload.to_string(),
            }
        }
    }
}
