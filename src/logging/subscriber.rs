//! Tracing subscriber setup: console formatter and initialisation.
use tracing_subscriber::EnvFilter;

/// Target used by [`Logger::stage`](super::Logger::stage) for section headers.
pub(super) const STAGE_TARGET: &str = "vkdispatch::stage";

/// Extracts the `message` field and any structured fields from a
/// [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
    fields: String,
}

impl MessageExtractor {
    fn into_line(self) -> String {
        self.message + &self.fields
    }
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push_str(&format!(" {}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.record_debug(field, &value);
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits vkdispatch-style
/// console output.
#[derive(Debug, Clone, Copy)]
pub(super) struct ConsoleFormatter {
    /// Emit ANSI colour codes.
    pub(super) ansi: bool,
}

impl ConsoleFormatter {
    fn paint(self, code: &str, text: &str) -> String {
        if self.ansi {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.into_line();

        match level {
            tracing::Level::ERROR => writeln!(writer, "{} {msg}", self.paint("31", "ERROR")),
            tracing::Level::WARN => writeln!(writer, "{}  {msg}", self.paint("33", "WARN")),
            tracing::Level::INFO if target == STAGE_TARGET => {
                writeln!(writer, "{} {}", self.paint("1;34", "==>"), self.paint("1", msg))
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            _ => writeln!(writer, "  {}", self.paint("2", msg)),
        }
    }
}

/// Console filter: `RUST_LOG` when set, otherwise `debug` with `verbose`
/// and `info` without.
fn console_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialise the global [`tracing`] subscriber.
///
/// Every event goes to stderr; stdout is reserved for command output such
/// as the resolved bundle. Must be called once at program startup, before
/// any logging.
pub fn init_subscriber(verbose: bool) {
    use std::io::IsTerminal as _;
    use tracing_subscriber::{Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter {
            ansi: std::io::stderr().is_terminal(),
        })
        .with_writer(std::io::stderr)
        .with_filter(console_filter(verbose));

    tracing_subscriber::registry().with(console_layer).init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// A writer collecting formatted output in memory.
    #[derive(Clone, Default)]
    pub(crate) struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with a plain-text subscriber writing into the returned capture.
    pub(crate) fn capture(level: tracing::Level, f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(ConsoleFormatter { ansi: false })
            .with_writer(capture.clone())
            .with_max_level(level)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        capture.contents()
    }

    #[test]
    fn formats_each_level() {
        let out = capture(tracing::Level::DEBUG, || {
            tracing::info!(target: STAGE_TARGET, "Parsing");
            tracing::info!("plain");
            tracing::warn!("careful");
            tracing::error!("broken");
            tracing::debug!("detail");
        });
        assert_eq!(
            out,
            "==> Parsing\n  plain\nWARN  careful\nERROR broken\n  detail\n"
        );
    }

    #[test]
    fn structured_fields_are_appended() {
        let out = capture(tracing::Level::DEBUG, || {
            tracing::debug!(commands = 3, "parsed specification");
        });
        assert_eq!(out, "  parsed specification commands=3\n");
    }

    #[test]
    fn ansi_codes_only_when_enabled() {
        let plain = ConsoleFormatter { ansi: false };
        let colored = ConsoleFormatter { ansi: true };
        assert_eq!(plain.paint("31", "ERROR"), "ERROR");
        assert_eq!(colored.paint("31", "ERROR"), "\x1b[31mERROR\x1b[0m");
    }

    #[test]
    fn debug_is_filtered_at_info() {
        let out = capture(tracing::Level::INFO, || {
            tracing::debug!("hidden");
            tracing::info!("shown");
        });
        assert_eq!(out, "  shown\n");
    }
}
