//! `huff` – compress and decompress text with a static Huffman code.
//!
//! ```text
//! huff compress --symbols word notes.txt       → notes.txt.huf
//! huff decompress notes.txt.huf                → notes-decompressed.txt
//! huff inspect notes.txt.huf                   → header and code table
//! ```
//!
//! Stage timings are logged to stderr at `info`, the default level; pass
//! `--log-level warn` (or set `RUST_LOG`) to silence them.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use huff::{
    decompress, Artifact, CodeTable, Error, FrequencyModel, Granularity, HuffmanEncoder,
    HuffmanTree,
};

#[derive(Parser, Debug)]
#[command(name = "huff")]
#[command(version)]
#[command(about = "Static Huffman compression over characters or words", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a text file into a .huf artifact
    Compress {
        /// Symbol granularity: char or word
        #[arg(short, long)]
        symbols: Granularity,

        /// Text file to compress
        input: PathBuf,

        /// Artifact path [default: <INPUT>.huf]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore the text stored in an artifact
    Decompress {
        /// Expected symbol granularity; must match the artifact if given
        #[arg(short, long)]
        symbols: Option<Granularity>,

        /// Artifact to decompress
        input: PathBuf,

        /// Output path [default: <NAME>-decompressed.<EXT> beside the artifact]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print an artifact's header and code table
    Inspect {
        /// Artifact to inspect
        input: PathBuf,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    info!("TIME ({label}): {:.2}", start.elapsed().as_secs_f64());
    out
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("huff: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Compress {
            symbols,
            input,
            output,
        } => {
            let output = output.unwrap_or_else(|| artifact_path(&input));
            compress_file(&input, &output, symbols)
        }
        Command::Decompress {
            symbols,
            input,
            output,
        } => {
            let output = output.unwrap_or_else(|| decompressed_path(&input));
            decompress_file(&input, &output, symbols)
        }
        Command::Inspect { input } => inspect(&input),
    }
}

fn compress_file(input: &Path, output: &Path, granularity: Granularity) -> Result<(), Error> {
    let open = || -> io::Result<_> { Ok(BufReader::new(File::open(input)?)) };

    let (model, table) = timed("SymbolModel", || -> Result<_, Error> {
        let model = FrequencyModel::from_reader(open()?, granularity)?;
        let table = CodeTable::from_tree(&HuffmanTree::build(&model));
        Ok((model, table))
    })?;

    let encoded = timed("Encoding", || -> Result<_, Error> {
        HuffmanEncoder::new(&table).encode_reader(open()?, granularity)
    })?;

    let artifact = Artifact {
        granularity,
        table,
        encoded,
    };
    artifact.write_to(BufWriter::new(File::create(output)?))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        symbols = model.total(),
        distinct = model.len(),
        bits = artifact.encoded.bit_len,
        "compressed"
    );
    Ok(())
}

fn decompress_file(
    input: &Path,
    output: &Path,
    expected: Option<Granularity>,
) -> Result<(), Error> {
    let text = timed("Decompressing", || -> Result<_, Error> {
        let artifact = Artifact::read_from(BufReader::new(File::open(input)?))?;
        if let Some(expected) = expected {
            if expected != artifact.granularity {
                return Err(Error::InvalidFormat(format!(
                    "artifact uses {} symbols, not {expected}",
                    artifact.granularity
                )));
            }
        }
        decompress(&artifact)
    })?;

    let mut w = BufWriter::new(File::create(output)?);
    w.write_all(text.as_bytes())?;
    w.flush()?;
    info!(output = %output.display(), bytes = text.len(), "decompressed");
    Ok(())
}

fn inspect(input: &Path) -> Result<(), Error> {
    let artifact = Artifact::read_from(BufReader::new(File::open(input)?))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "granularity:  {}", artifact.granularity)?;
    writeln!(out, "symbols:      {}", artifact.encoded.symbol_count)?;
    writeln!(out, "distinct:     {}", artifact.table.len())?;
    writeln!(out, "bits:         {}", artifact.encoded.bit_len)?;
    writeln!(out, "padding bits: {}", artifact.padding_bits())?;
    writeln!(out, "payload:      {} bytes", artifact.encoded.bytes.len())?;
    writeln!(out)?;
    for (symbol, code) in artifact.table.iter() {
        writeln!(out, "{code:>20}  {symbol:?}")?;
    }
    Ok(())
}

fn artifact_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".huf");
    PathBuf::from(name)
}

fn decompressed_path(artifact: &Path) -> PathBuf {
    let original = match artifact.extension() {
        Some(ext) if ext == "huf" => artifact.with_extension(""),
        _ => artifact.to_path_buf(),
    };
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match original.extension() {
        Some(ext) => format!("{stem}-decompressed.{}", ext.to_string_lossy()),
        None => format!("{stem}-decompressed"),
    };
    original.with_file_name(name)
}
