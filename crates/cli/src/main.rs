//! CLI for contextguard.
//!
//! Drives a recording guard through one scoped block or one decorated call
//! and reports what the hooks saw.

use clap::{Parser, Subcommand, ValueEnum};
use contextguard_core::{decorate, ContextDecoratorExt, Failure, Outcome};
use contextguard_hooks::{Exit, Recorder, Traced};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "contextguard", version, about = "Scoped guard / decorator demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one guarded operation and report the hook trace.
    Run {
        #[arg(short, long, value_enum, default_value_t = Mode::Scope)]
        mode: Mode,

        /// Name passed to the guarded operation.
        #[arg(short, long, default_value = "world")]
        name: String,

        /// Make the guarded operation fail with this message.
        #[arg(short, long)]
        raise: Option<String>,

        /// Have the exit hook suppress the failure.
        #[arg(long, env = "CONTEXTGUARD_CATCH", default_value_t = false)]
        catch: bool,

        #[arg(long, value_enum, env = "CONTEXTGUARD_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the library version.
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    /// Guard a block.
    Scope,
    /// Guard every call of a wrapped function.
    Decorator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct OperationFailed(String);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("guarded operation failed: {0}")]
    Propagated(#[source] OperationFailed),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The operation under guard.
fn greet(name: &str, raise: Option<&str>) -> Result<String, OperationFailed> {
    match raise {
        Some(msg) => Err(OperationFailed(msg.to_string())),
        None => Ok(format!("hello, {name}")),
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum Verdict {
    Returned { value: String },
    Suppressed,
    Propagated { error: String },
}

#[derive(Debug, Serialize)]
struct Report {
    mode: Mode,
    callable: Option<String>,
    started: bool,
    entries: u32,
    exit: Exit,
    #[serde(flatten)]
    verdict: Verdict,
}

impl Report {
    fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("mode:     {:?}\n", self.mode));
        if let Some(ref callable) = self.callable {
            out.push_str(&format!("callable: {callable}\n"));
        }
        out.push_str(&format!("started:  {} ({} entries)\n", self.started, self.entries));
        let exit = match &self.exit {
            Exit::Pending => "pending".to_string(),
            Exit::Clean => "clean (no exception)".to_string(),
            Exit::Raised(record) => format!("raised {record}"),
        };
        out.push_str(&format!("exit:     {exit}\n"));
        let verdict = match &self.verdict {
            Verdict::Returned { value } => format!("returned {value:?}"),
            Verdict::Suppressed => "suppressed (no result)".to_string(),
            Verdict::Propagated { error } => format!("propagated {error:?}"),
        };
        out.push_str(&format!("outcome:  {verdict}\n"));
        out
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            mode,
            name,
            raise,
            catch,
            format,
        } => {
            tracing::info!(?mode, catch, raise = raise.is_some(), "running guarded operation");

            let recorder = Recorder::new();
            recorder.set_catch(catch);
            let guard = Traced::new("greet", recorder.clone());

            let (callable, result) = match mode {
                Mode::Scope => {
                    let result = guard.scope(|bound| {
                        let bound = bound.map(|r| r.ptr_eq(&recorder)).unwrap_or(false);
                        tracing::debug!(bound, "inside scoped block");
                        greet(&name, raise.as_deref())
                    });
                    (None, result.map_err(Failure::into_raised))
                }
                Mode::Decorator => {
                    let mut wrapped = decorate(&guard, greet).named("greet");
                    let result = wrapped.call((name.as_str(), raise.as_deref()));
                    (
                        Some(wrapped.name().to_string()),
                        result.map_err(Failure::into_raised),
                    )
                }
            };

            let (verdict, failure) = match result {
                Ok(Outcome::Returned(value)) => (Verdict::Returned { value }, None),
                Ok(Outcome::Suppressed) => (Verdict::Suppressed, None),
                Err(err) => (
                    Verdict::Propagated {
                        error: err.to_string(),
                    },
                    Some(err),
                ),
            };

            let snapshot = recorder.snapshot();
            let report = Report {
                mode,
                callable,
                started: snapshot.started,
                entries: snapshot.entries,
                exit: snapshot.exit,
                verdict,
            };

            match format {
                Format::Json => {
                    let json = serde_json::to_string_pretty(&report).map_err(CliError::from)?;
                    println!("{json}");
                }
                Format::Text => print!("{}", report.render()),
            }

            if let Some(err) = failure {
                return Err(CliError::Propagated(err).into());
            }
        }
        Commands::Version => {
            println!("contextguard {}", contextguard_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_arguments() {
        let cli = Cli::try_parse_from([
            "contextguard",
            "run",
            "--mode",
            "decorator",
            "--raise",
            "boom",
            "--catch",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                mode,
                raise,
                catch,
                format,
                ..
            } => {
                assert_eq!(mode, Mode::Decorator);
                assert_eq!(raise.as_deref(), Some("boom"));
                assert!(catch);
                assert_eq!(format, Format::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn greet_fails_on_request() {
        assert_eq!(greet("ada", None).unwrap(), "hello, ada");
        assert_eq!(greet("ada", Some("nope")).unwrap_err().to_string(), "nope");
    }

    #[test]
    fn report_flattens_verdict() {
        let report = Report {
            mode: Mode::Scope,
            callable: None,
            started: true,
            entries: 1,
            exit: Exit::Clean,
            verdict: Verdict::Suppressed,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "suppressed");
        assert_eq!(json["exit"]["status"], "clean");
        assert!(report.render().contains("suppressed (no result)"));
    }
}
