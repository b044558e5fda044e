use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_textgen_core::{ChainModel, ChainStream, CorpusSource, FileCorpus, HandoffMode, StartWord, StreamConfig};

/// Corpus used when `--corpus` is not given.
const SAMPLE_CORPUS: &str = include_str!("../data/sample.txt");

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
	OnDemand,
	LookAhead,
}

impl From<Mode> for HandoffMode {
	fn from(mode: Mode) -> Self {
		match mode {
			Mode::OnDemand => HandoffMode::OnDemand,
			Mode::LookAhead => HandoffMode::LookAhead,
		}
	}
}

#[derive(Debug, Parser)]
#[command(name = "textgen")]
#[command(about = "Markov-chain synthetic text generator", long_about = None)]
struct Args {
	/// Seed text file. Defaults to a small built-in sample.
	#[arg(long)]
	corpus: Option<PathBuf>,

	/// Stream this many bytes of text (to --output, or stdout).
	#[arg(long, conflicts_with_all = ["words", "chars"])]
	bytes: Option<u64>,

	/// Print one passage of at least this many words.
	#[arg(long, conflicts_with = "chars")]
	words: Option<usize>,

	/// Print one passage of at least this many characters.
	#[arg(long)]
	chars: Option<usize>,

	/// First word of the passage (--words / --chars only).
	#[arg(long, conflicts_with = "bytes")]
	start: Option<String>,

	/// Output file for --bytes.
	#[arg(long, short)]
	output: Option<PathBuf>,

	/// Random seed, for reproducible output.
	#[arg(long)]
	seed: Option<u64>,

	/// JSON file with stream settings (chunk_chars, refill_every, mode, close_timeout).
	#[arg(long)]
	config: Option<PathBuf>,

	/// Chunk pacing of the stream. Overrides the config file.
	#[arg(long, value_enum)]
	mode: Option<Mode>,

	/// Characters per generated chunk. Overrides the config file.
	#[arg(long)]
	chunk_chars: Option<usize>,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let model = load_model(args.corpus.as_deref())?;
	let mut rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	if let Some(bytes) = args.bytes {
		let config = stream_config(&args)?;
		return stream_to_output(model, bytes, config, rng, args.output.as_deref());
	}

	let start = match &args.start {
		Some(word) => {
			if !model.contains_word(word) {
				bail!("'{word}' does not occur in the corpus");
			}
			StartWord::custom(word)
		}
		None => StartWord::Random,
	};
	let text = match (args.words, args.chars) {
		(_, Some(chars)) => model.generate_by_chars(&start, chars, &mut rng),
		(Some(words), None) => model.generate_by_words(&start, words, &mut rng),
		(None, None) => model.generate_by_words(&start, 50, &mut rng),
	};
	println!("{text}");
	Ok(())
}

fn load_model(corpus: Option<&Path>) -> Result<ChainModel> {
	let model = match corpus {
		Some(path) => {
			let root = path.parent().unwrap_or_else(|| Path::new("."));
			let name = path
				.file_name()
				.context("corpus path has no file name")?
				.to_string_lossy();
			let text = FileCorpus::new(root)
				.fetch(&name)
				.with_context(|| format!("failed to load corpus {}", path.display()))?;
			ChainModel::train(&text)
		}
		None => ChainModel::train(SAMPLE_CORPUS),
	};

	if model.is_degenerate() {
		bail!("corpus contains no words");
	}
	info!("Model ready: {} words, {} keys", model.word_count(), model.len());
	Ok(model)
}

fn stream_config(args: &Args) -> Result<StreamConfig> {
	let mut config = match &args.config {
		Some(path) => {
			let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
			serde_json::from_reader(file).with_context(|| format!("invalid config {}", path.display()))?
		}
		None => StreamConfig::default(),
	};
	if let Some(mode) = args.mode {
		config.mode = mode.into();
	}
	if let Some(chunk_chars) = args.chunk_chars {
		config.chunk_chars = chunk_chars;
	}
	config.validate()?;
	Ok(config)
}

fn stream_to_output(model: ChainModel, bytes: u64, config: StreamConfig, rng: StdRng, output: Option<&Path>) -> Result<()> {
	let mut stream = ChainStream::with_config(model, bytes, config, rng)?;
	let started = Instant::now();

	let copied = match output {
		Some(path) => {
			let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
			let mut writer = BufWriter::new(file);
			let copied = io::copy(&mut stream, &mut writer)?;
			writer.flush()?;
			copied
		}
		None => {
			let mut stdout = io::stdout().lock();
			let copied = io::copy(&mut stream, &mut stdout)?;
			stdout.flush()?;
			copied
		}
	};
	stream.close();

	info!(
		"Wrote {copied} bytes in {:.2?} ({} chunks generated)",
		started.elapsed(),
		stream.chunks_received()
	);
	Ok(())
}
