//! logveil - redact MongoDB server logs
//!
//! Reads structured (JSON) MongoDB log lines from files or stdin and writes
//! them back with user data replaced, keeping query shapes intact.

use clap::{Args, Parser, Subcommand};
use lv_core::exit_codes::ExitCode;
use lv_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use lv_core::{redact_file, redact_files, redact_stream, stdin_source, RunError, RunStats};
use lv_core::{open_path, WriterEmitter};
use lv_redact::{AesSivEncryptor, EncryptionKey, Encryptor, RedactionConfig, RedactionEngine};
use std::io::{BufWriter, IsTerminal};
use std::path::PathBuf;

const DEFAULT_KEY_FILE: &str = "./logveil.enc.key";

/// Redact values, field names and namespaces from MongoDB logs
#[derive(Parser)]
#[command(name = "logveil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Diagnostic log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Diagnostic log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact log files or stdin
    Redact(RedactArgs),

    /// Decrypt a value produced by `redact --encrypt`
    Decrypt(DecryptArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input log files, plain or gzip. Reads stdin when omitted
    inputs: Vec<PathBuf>,

    /// Write output here instead of stdout. With several inputs, input N is
    /// written to OUTPUT.N
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replacement string for redacted values
    #[arg(short, long)]
    replacement: Option<String>,

    /// Redact numeric values to 0
    #[arg(short = 'n', long)]
    redact_numbers: bool,

    /// Redact boolean values to false
    #[arg(short = 'b', long)]
    redact_booleans: bool,

    /// Redact client endpoints to 255.255.255.255:65535
    #[arg(short = 'i', long)]
    redact_ips: bool,

    /// Namespace prefix whose field names are hashed as well (repeatable)
    #[arg(short = 'f', long = "redact-field-names", value_name = "NAMESPACE")]
    eager_namespaces: Vec<String>,

    /// Only redact fields whose names match this regex
    #[arg(short = 'z', long = "redact-field-regex", value_name = "REGEX")]
    field_regex: Option<String>,

    /// Hash database and collection names
    #[arg(short = 'w', long)]
    redact_namespaces: bool,

    /// Encrypt redacted strings with a deterministic cipher
    #[arg(short = 'y', long)]
    encrypt: bool,

    /// Encryption key file, created if missing
    #[arg(short = 'q', long, default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,

    /// JSON redaction config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecryptArgs {
    /// Base64 ciphertext taken from redacted output
    value: String,

    /// Key file used when redacting
    #[arg(long, default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let result = match &cli.command {
        Commands::Redact(args) => run_redact(args).map(|_| ()),
        Commands::Decrypt(args) => run_decrypt(args),
        Commands::Version => {
            println!("logveil {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            let code = err.exit_code();
            tracing::error!(code = %code, "{}", err);
            eprintln!("Error: {}", err);
            code
        }
    };
    std::process::exit(exit_code.as_i32());
}

/// Build the redaction config: the config file if given, then flags.
fn build_config(args: &RedactArgs) -> Result<RedactionConfig, RunError> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading redaction config");
            RedactionConfig::load(path)?
        }
        None => RedactionConfig::default(),
    };

    if let Some(replacement) = &args.replacement {
        config = config.with_placeholder(replacement);
    }
    if args.redact_numbers {
        config = config.with_redact_numbers(true);
    }
    if args.redact_booleans {
        config = config.with_redact_booleans(true);
    }
    if args.redact_ips {
        config = config.with_redact_ips(true);
    }
    if args.redact_namespaces {
        config = config.with_redact_namespaces(true);
    }
    for prefix in &args.eager_namespaces {
        config = config.with_eager_namespace(prefix);
    }
    if let Some(pattern) = &args.field_regex {
        config = config.with_field_regex(pattern);
    }
    if args.encrypt {
        config = config.with_encryption_key(EncryptionKey::load_or_generate(&args.key_file)?);
    }
    Ok(config)
}

fn check_redact_args(args: &RedactArgs) -> Result<(), RunError> {
    if args.inputs.len() > 1 && args.output.is_none() {
        return Err(RunError::Args(
            "--output is required with more than one input file".to_string(),
        ));
    }
    if args.encrypt && (args.inputs.is_empty() || args.output.is_none()) {
        return Err(RunError::Args(
            "--encrypt needs an input file and --output; it cannot be used with stdin or stdout"
                .to_string(),
        ));
    }
    if args.inputs.is_empty() && std::io::stdin().is_terminal() {
        return Err(RunError::Args(
            "no input: pass a log file or pipe logs to stdin".to_string(),
        ));
    }
    Ok(())
}

fn run_redact(args: &RedactArgs) -> Result<RunStats, RunError> {
    check_redact_args(args)?;
    let engine = RedactionEngine::new(build_config(args)?)?;

    let stats = match (args.inputs.as_slice(), &args.output) {
        ([], output) => {
            let mut source = stdin_source();
            redact_to(&engine, &mut source, output.as_ref(), "stdin")?
        }
        ([input], Some(output)) => redact_file(&engine, input, output)?,
        ([input], None) => {
            let mut source = open_path(input).map_err(|source| RunError::Open {
                path: input.clone(),
                source,
            })?;
            redact_to(&engine, source.as_mut(), None, &input.display().to_string())?
        }
        (inputs, Some(prefix)) => redact_files(&engine, inputs, prefix)?,
        (_, None) => {
            return Err(RunError::Args(
                "--output is required with more than one input file".to_string(),
            ))
        }
    };

    if stats.skipped > 0 {
        tracing::warn!(skipped = stats.skipped, "skipped malformed lines");
    }
    Ok(stats)
}

/// Redact one source into `output`, or stdout when there is none.
fn redact_to(
    engine: &RedactionEngine,
    source: &mut dyn lv_core::LineSource,
    output: Option<&PathBuf>,
    label: &str,
) -> Result<RunStats, RunError> {
    let stream_err = |source| RunError::Stream {
        label: label.to_string(),
        source,
    };
    let stats = match output {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| RunError::Create {
                path: path.clone(),
                source,
            })?;
            let mut emitter = WriterEmitter::new(BufWriter::new(file));
            redact_stream(engine, source, &mut emitter).map_err(stream_err)?
        }
        None => {
            let mut emitter = WriterEmitter::new(BufWriter::new(std::io::stdout().lock()));
            redact_stream(engine, source, &mut emitter).map_err(stream_err)?
        }
    };
    tracing::info!(
        input = label,
        read = stats.read,
        emitted = stats.emitted,
        skipped = stats.skipped,
        "redaction complete"
    );
    Ok(stats)
}

fn run_decrypt(args: &DecryptArgs) -> Result<(), RunError> {
    let key = EncryptionKey::load(&args.key_file)?;
    let plaintext = AesSivEncryptor::new(key).decrypt_from_base64(&args.value)?;
    println!("{}", plaintext);
    Ok(())
}
