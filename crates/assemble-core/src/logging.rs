//! Logging setup for assemble command line tools

use fern::{Dispatch, FormatCallback};
use log::{Level, LevelFilter, Record, SetLoggerError};
use std::fmt;
use std::io::stdout;
use std::path::Path;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Provides helpful logging args for clap clis
#[derive(Debug, Default, Clone, clap::Args)]
#[clap(next_help_heading = "Log Level")]
pub struct LoggingArgs {
    /// Only display error level log messages
    #[clap(short, long)]
    #[clap(conflicts_with_all = ["warn", "info", "debug", "trace"])]
    #[clap(display_order = 1)]
    error: bool,

    /// Display warning and above level log messages
    #[clap(short, long)]
    #[clap(conflicts_with_all = ["error", "info", "debug", "trace"])]
    #[clap(display_order = 2)]
    warn: bool,

    /// Display info and above level log messages
    #[clap(short, long)]
    #[clap(conflicts_with_all = ["error", "warn", "debug", "trace"])]
    #[clap(display_order = 3)]
    info: bool,

    /// Display debug and above level log messages
    #[clap(long)]
    #[clap(conflicts_with_all = ["error", "warn", "info", "trace"])]
    #[clap(display_order = 4)]
    debug: bool,

    /// Display trace and above level log messages
    #[clap(long)]
    #[clap(conflicts_with_all = ["error", "warn", "info", "debug"])]
    #[clap(display_order = 5)]
    trace: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum OutputType {
    Basic,
    TimeOnly,
    Complicated,
}

static DATE_TIME_FORMAT: &[FormatItem] = format_description!(
    "[year]/[month]/[day] [hour]:[minute]:[second].[subsecond digits:4]"
);

impl LoggingArgs {
    /// Gets the level filter from this args
    pub fn log_level_filter(&self) -> LevelFilter {
        self.config_from_settings().0
    }

    fn config_from_settings(&self) -> (LevelFilter, OutputType) {
        if self.error {
            (LevelFilter::Error, OutputType::Basic)
        } else if self.warn {
            (LevelFilter::Warn, OutputType::Basic)
        } else if self.info {
            (LevelFilter::Info, OutputType::TimeOnly)
        } else if self.debug {
            (LevelFilter::Debug, OutputType::Complicated)
        } else if self.trace {
            (LevelFilter::Trace, OutputType::Complicated)
        } else {
            (LevelFilter::Info, OutputType::Basic)
        }
    }

    /// Sets up the global logger.
    ///
    /// # Error
    /// Errors if a global logger was already set.
    pub fn init_root_logger(&self) -> Result<(), SetLoggerError> {
        let (filter, output_mode) = self.config_from_settings();

        Dispatch::new()
            .format(message_format(output_mode))
            .level(filter)
            .chain(stdout())
            .apply()
    }
}

fn message_format(
    output_mode: OutputType,
) -> impl Fn(FormatCallback, &fmt::Arguments, &Record) + Sync + Send + 'static {
    move |out, message, record| {
        out.finish(format_args!(
            "{} {}",
            format_prefix(output_mode, record),
            message
        ))
    }
}

fn format_prefix(output_mode: OutputType, record: &Record) -> String {
    use colored::Colorize;
    let level_string = record.level().to_string().to_lowercase();

    let level_string = match record.level() {
        Level::Error => level_string.red().to_string(),
        Level::Warn => level_string.yellow().to_string(),
        Level::Info => level_string.green().to_string(),
        Level::Debug => level_string.blue().to_string(),
        Level::Trace => level_string.bright_black().to_string(),
    };
    match output_mode {
        OutputType::Basic => format!("{}:", level_string),
        OutputType::TimeOnly => {
            let time = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
            format!("[{}] {}:", format_time(time), level_string)
        }
        OutputType::Complicated => {
            let time = OffsetDateTime::now_utc();
            let file_name = record
                .file()
                .and_then(|file| Path::new(file).file_name())
                .and_then(|s| s.to_str())
                .unwrap_or("unknown");
            format!(
                "[{} {}{} {}]",
                format_time(time),
                file_name,
                record
                    .line()
                    .map(|l| format!(":{l}"))
                    .unwrap_or_default(),
                level_string
            )
        }
    }
}

fn format_time(time: OffsetDateTime) -> String {
    time.format(DATE_TIME_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        logging: LoggingArgs,
    }

    #[test]
    fn default_level_is_info() {
        let cli = Cli::parse_from(["test"]);
        assert_eq!(cli.logging.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn levels_conflict() {
        let cli = Cli::parse_from(["test", "--debug"]);
        assert_eq!(cli.logging.log_level_filter(), LevelFilter::Debug);
        assert!(Cli::try_parse_from(["test", "--debug", "--trace"]).is_err());
    }
}
