use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::StreamConfig;
use super::worker::{self, WorkerHandle};
use crate::error::{Result, TextGenError};
use crate::model::chain_model::ChainModel;

/// Lifecycle of a `ChainStream`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
	/// Constructed, worker not started yet.
	Idle,
	/// Worker running, producing chunks.
	Running,
	/// Shutdown requested; the worker may still be finishing a chunk.
	StopRequested,
	/// Worker gone. Terminal.
	Stopped,
}

/// Requests shutdown of a `ChainStream` from another thread.
///
/// The reader observes the request at its next pass over a chunk: the read
/// in progress returns what it already copied, the following ones fail with
/// `StreamClosed`.
#[derive(Clone, Debug)]
pub struct StopHandle {
	stop: Arc<AtomicBool>,
}

impl StopHandle {
	pub fn stop(&self) {
		self.stop.store(true, Ordering::Release);
	}

	pub fn is_stopped(&self) -> bool {
		self.stop.load(Ordering::Acquire)
	}
}

/// Read-only byte stream of synthetic text with a declared length.
///
/// Text is produced by a `ChainModel` on a dedicated worker thread, one
/// chunk at a time, and handed over by value. At most two chunks are alive:
/// the one being read and the one being produced.
///
/// # Behavior
/// - `read` serves bytes from the current chunk and never returns more than
///   the declared length in total; it returns 0 once that length is reached.
/// - An exhausted chunk is replayed until it has been read `refill_every`
///   times, then a fresh one is requested and the reader blocks until it
///   arrives.
/// - The worker starts on the first read, or with `start`.
/// - `close` (also run on drop) stops the worker and waits for it, bounded
///   by `close_timeout`.
///
/// # Notes
/// - Single reader: `read` takes `&mut self`. Use a `StopHandle` to stop
///   the stream from elsewhere.
/// - Seeking only reports the position; writes fail with `Unsupported`.
/// - An error hit mid-read (worker gone, empty chunk) ends that read with
///   the bytes already copied and is returned by the next one.
/// - Chunks are cut on byte boundaries; with a non-ASCII corpus a read may
///   end inside a UTF-8 sequence.
pub struct ChainStream<R = StdRng> {
	config: StreamConfig,
	/// Declared total length.
	length: u64,
	/// Bytes returned so far.
	delivered: u64,
	chunk: Vec<u8>,
	offset: usize,
	/// Completed passes over chunks; decides when to refill.
	passes: u64,
	chunks_received: u64,
	state: StreamState,
	stop: Arc<AtomicBool>,
	/// Model and random source, until the worker takes them.
	pending: Option<(Arc<ChainModel>, R)>,
	/// Error hit after a partial read, reported by the next read.
	failure: Option<TextGenError>,
	worker: Option<WorkerHandle>,
}

impl ChainStream<StdRng> {
	/// Creates a stream of `length` bytes with the default configuration
	/// and an OS-seeded random source.
	///
	/// # Errors
	/// Returns `DegenerateModel` if the model holds no word.
	pub fn new<M: Into<Arc<ChainModel>>>(model: M, length: u64) -> Result<Self> {
		Self::with_config(model, length, StreamConfig::default(), StdRng::from_os_rng())
	}

	/// Same as `new` with a fixed seed, for reproducible output.
	pub fn seeded<M: Into<Arc<ChainModel>>>(model: M, length: u64, seed: u64) -> Result<Self> {
		Self::with_config(model, length, StreamConfig::default(), StdRng::seed_from_u64(seed))
	}
}

impl<R: Rng + Send + 'static> ChainStream<R> {
	/// Creates a stream of `length` bytes.
	///
	/// # Errors
	/// - `InvalidConfig` if the configuration does not validate.
	/// - `DegenerateModel` if the model holds no word.
	pub fn with_config<M: Into<Arc<ChainModel>>>(model: M, length: u64, config: StreamConfig, rng: R) -> Result<Self> {
		config.validate()?;
		let model = model.into();
		if model.is_degenerate() {
			return Err(TextGenError::DegenerateModel);
		}

		Ok(Self {
			config,
			length,
			delivered: 0,
			chunk: Vec::new(),
			offset: 0,
			passes: 0,
			chunks_received: 0,
			state: StreamState::Idle,
			stop: Arc::new(AtomicBool::new(false)),
			pending: Some((model, rng)),
			failure: None,
			worker: None,
		})
	}

	/// Starts the worker. Does nothing if it is already running.
	///
	/// # Errors
	/// - `StreamClosed` if the stream was stopped.
	/// - `Io` if the thread cannot be spawned.
	pub fn start(&mut self) -> Result<()> {
		match self.state() {
			StreamState::Running => Ok(()),
			StreamState::StopRequested | StreamState::Stopped => Err(TextGenError::StreamClosed),
			StreamState::Idle => {
				let (model, rng) = self.pending.take().ok_or(TextGenError::StreamClosed)?;
				self.worker = Some(worker::spawn(model, rng, &self.config, Arc::clone(&self.stop))?);
				self.state = StreamState::Running;
				debug!("Chain stream started: {} bytes, {:?} hand-off", self.length, self.config.mode);
				Ok(())
			}
		}
	}

	fn read_chunked(&mut self, buf: &mut [u8]) -> Result<usize> {
		if let Some(err) = self.failure.take() {
			return Err(err);
		}
		if matches!(self.state(), StreamState::StopRequested | StreamState::Stopped) {
			self.close();
			return Err(TextGenError::StreamClosed);
		}

		let remaining = self.length.saturating_sub(self.delivered);
		let wanted = remaining.min(buf.len() as u64) as usize;
		if wanted == 0 {
			return Ok(0);
		}
		self.start()?;

		let mut copied = 0;
		while copied < wanted {
			if self.offset >= self.chunk.len() {
				if let Err(err) = self.advance() {
					if copied > 0 {
						self.failure = Some(err);
						break;
					}
					return Err(err);
				}
			}

			let n = (wanted - copied).min(self.chunk.len() - self.offset);
			buf[copied..copied + n].copy_from_slice(&self.chunk[self.offset..self.offset + n]);
			self.offset += n;
			copied += n;
		}

		self.delivered += copied as u64;
		Ok(copied)
	}

	/// Moves to the next pass: replays the current chunk, or fetches a fresh
	/// one every `refill_every` passes.
	fn advance(&mut self) -> Result<()> {
		if self.stop.load(Ordering::Acquire) {
			self.close();
			return Err(TextGenError::StreamClosed);
		}

		if self.chunks_received > 0 {
			self.passes += 1;
			if self.passes % self.config.refill_every as u64 != 0 {
				self.offset = 0;
				return Ok(());
			}
		}

		// Release the exhausted chunk before asking for the next one.
		self.chunk = Vec::new();
		self.offset = 0;

		let received = match &self.worker {
			Some(worker) => worker.next_chunk(),
			None => Err(TextGenError::StreamClosed),
		};
		let chunk = match received {
			Ok(chunk) => chunk,
			Err(err) => {
				let requested = self.stop.load(Ordering::Acquire);
				self.close();
				return Err(if requested { TextGenError::StreamClosed } else { err });
			}
		};
		if chunk.is_empty() {
			self.close();
			return Err(TextGenError::DegenerateModel);
		}

		self.chunks_received += 1;
		trace!("Chunk {} received: {} bytes", self.chunks_received, chunk.len());
		self.chunk = chunk;
		Ok(())
	}
}

impl<R> ChainStream<R> {
	/// Current lifecycle state.
	pub fn state(&self) -> StreamState {
		match self.state {
			StreamState::Idle | StreamState::Running if self.stop.load(Ordering::Acquire) => StreamState::StopRequested,
			state => state,
		}
	}

	/// Handle stopping this stream from another thread.
	pub fn stop_handle(&self) -> StopHandle {
		StopHandle {
			stop: Arc::clone(&self.stop),
		}
	}

	/// Declared total length, in bytes.
	pub fn len(&self) -> u64 {
		self.length
	}

	pub fn is_empty(&self) -> bool {
		self.length == 0
	}

	/// Bytes returned so far.
	pub fn position(&self) -> u64 {
		self.delivered
	}

	/// Number of fresh chunks received from the worker.
	pub fn chunks_received(&self) -> u64 {
		self.chunks_received
	}

	pub fn config(&self) -> &StreamConfig {
		&self.config
	}

	/// Changes the declared length.
	///
	/// # Errors
	/// Returns `LengthBelowPosition` if `new_length` is smaller than what
	/// has already been read.
	pub fn set_len(&mut self, new_length: u64) -> Result<()> {
		if new_length < self.delivered {
			return Err(TextGenError::LengthBelowPosition {
				requested: new_length,
				delivered: self.delivered,
			});
		}
		self.length = new_length;
		Ok(())
	}

	/// Stops the worker and waits for it to exit.
	///
	/// The wait is bounded by `close_timeout`; a worker stuck past it is
	/// abandoned with a warning. Idempotent.
	pub fn close(&mut self) {
		if self.state == StreamState::Stopped {
			return;
		}
		self.stop.store(true, Ordering::Release);
		self.state = StreamState::StopRequested;

		self.pending = None;
		if let Some(worker) = self.worker.take() {
			worker.shutdown(self.config.close_timeout);
		}
		self.chunk = Vec::new();
		self.offset = 0;
		self.state = StreamState::Stopped;
		debug!("Chain stream closed after {} of {} bytes", self.delivered, self.length);
	}
}

impl<R: Rng + Send + 'static> Read for ChainStream<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		Ok(self.read_chunked(buf)?)
	}
}

/// The stream cannot be repositioned: every seek fails with `Unsupported`,
/// except `SeekFrom::Current(0)` which reports the position without moving,
/// so that `stream_position` works.
impl<R> Seek for ChainStream<R> {
	fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
		match pos {
			SeekFrom::Current(0) => Ok(self.delivered),
			_ => Err(io::Error::new(io::ErrorKind::Unsupported, "chain stream is not seekable")),
		}
	}
}

impl<R> Write for ChainStream<R> {
	fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "chain stream is read-only"))
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<R> Drop for ChainStream<R> {
	fn drop(&mut self) {
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::RngCore;

	const SEED: &str = "The cat sat on the mat. The dog ran to the park!\n\
		Where did the bird go? It flew over the mat, then over the park.";

	fn small_config() -> StreamConfig {
		StreamConfig {
			chunk_chars: 48,
			refill_every: 1,
			..StreamConfig::default()
		}
	}

	fn stream(length: u64) -> ChainStream {
		ChainStream::with_config(ChainModel::train(SEED), length, small_config(), StdRng::seed_from_u64(7)).unwrap()
	}

	#[test]
	fn reads_30_30_30_10_then_eof() {
		let mut s = ChainStream::seeded(ChainModel::train(SEED), 100, 1).unwrap();
		let mut buf = [0u8; 30];
		assert_eq!(s.read(&mut buf).unwrap(), 30);
		assert_eq!(s.read(&mut buf).unwrap(), 30);
		assert_eq!(s.read(&mut buf).unwrap(), 30);
		assert_eq!(s.read(&mut buf).unwrap(), 10);
		assert_eq!(s.read(&mut buf).unwrap(), 0);
		assert_eq!(s.position(), 100);
	}

	#[test]
	fn starts_lazily() {
		let mut s = stream(10);
		assert_eq!(s.state(), StreamState::Idle);
		let mut buf = [0u8; 4];
		s.read(&mut buf).unwrap();
		assert_eq!(s.state(), StreamState::Running);
	}

	#[test]
	fn explicit_start_is_idempotent() {
		let mut s = stream(10);
		s.start().unwrap();
		s.start().unwrap();
		assert_eq!(s.state(), StreamState::Running);
	}

	#[test]
	fn zero_length_never_starts_worker() {
		let mut s = stream(0);
		let mut buf = [0u8; 8];
		assert_eq!(s.read(&mut buf).unwrap(), 0);
		assert_eq!(s.state(), StreamState::Idle);
		assert!(s.is_empty());
	}

	#[test]
	fn read_larger_than_chunk_is_filled() {
		let mut s = stream(1000);
		let mut buf = vec![0u8; 1000];
		assert_eq!(s.read(&mut buf).unwrap(), 1000);
		assert!(s.chunks_received() > 1);
		assert!(buf.iter().all(|b| *b != 0));
	}

	#[test]
	fn chunks_are_replayed_before_refill() {
		let config = StreamConfig {
			chunk_chars: 48,
			refill_every: 1000,
			..StreamConfig::default()
		};
		let mut s = ChainStream::with_config(ChainModel::train(SEED), 5000, config, StdRng::seed_from_u64(3)).unwrap();
		let mut out = Vec::new();
		s.read_to_end(&mut out).unwrap();
		assert_eq!(out.len(), 5000);
		assert_eq!(s.chunks_received(), 1);
	}

	#[test]
	fn set_len_cannot_go_below_position() {
		let mut s = stream(50);
		let mut buf = [0u8; 20];
		s.read(&mut buf).unwrap();

		assert!(matches!(
			s.set_len(10),
			Err(TextGenError::LengthBelowPosition { requested: 10, delivered: 20 })
		));
		s.set_len(20).unwrap();
		assert_eq!(s.read(&mut buf).unwrap(), 0);
		s.set_len(35).unwrap();
		assert_eq!(s.read(&mut buf).unwrap(), 15);
		assert_eq!(s.len(), 35);
	}

	#[test]
	fn write_and_seek_are_unsupported() {
		let mut s = stream(10);
		assert_eq!(s.write(b"x").unwrap_err().kind(), io::ErrorKind::Unsupported);
		assert_eq!(s.seek(SeekFrom::Start(0)).unwrap_err().kind(), io::ErrorKind::Unsupported);
		assert_eq!(s.seek(SeekFrom::Current(0)).unwrap(), 0);
	}

	#[test]
	fn read_after_close_fails() {
		let mut s = stream(100);
		let mut buf = [0u8; 10];
		s.read(&mut buf).unwrap();
		s.close();
		assert_eq!(s.state(), StreamState::Stopped);
		assert_eq!(s.read(&mut buf).unwrap_err().kind(), io::ErrorKind::BrokenPipe);
		s.close();
	}

	#[test]
	fn close_before_start() {
		let mut s = stream(100);
		s.close();
		assert_eq!(s.state(), StreamState::Stopped);
		assert!(matches!(s.start(), Err(TextGenError::StreamClosed)));
	}

	#[test]
	fn stop_handle_requests_stop() {
		let mut s = stream(10_000);
		let handle = s.stop_handle();
		let mut buf = [0u8; 10];
		s.read(&mut buf).unwrap();

		handle.stop();
		assert!(handle.is_stopped());
		assert_eq!(s.state(), StreamState::StopRequested);

		let mut sink = Vec::new();
		let err = s.read_to_end(&mut sink).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
		assert_eq!(s.state(), StreamState::Stopped);
	}

	/// Random source that panics once it has served `draws_left` draws.
	struct FailingRng {
		inner: StdRng,
		draws_left: usize,
	}

	impl FailingRng {
		fn draw(&mut self) {
			assert!(self.draws_left > 0, "random source exhausted");
			self.draws_left -= 1;
		}
	}

	impl RngCore for FailingRng {
		fn next_u32(&mut self) -> u32 {
			self.draw();
			self.inner.next_u32()
		}

		fn next_u64(&mut self) -> u64 {
			self.draw();
			self.inner.next_u64()
		}

		fn fill_bytes(&mut self, dst: &mut [u8]) {
			self.draw();
			self.inner.fill_bytes(dst);
		}
	}

	#[test]
	fn worker_failure_is_reported_after_partial_read() {
		let rng = FailingRng {
			inner: StdRng::seed_from_u64(5),
			draws_left: 1000,
		};
		let config = StreamConfig {
			chunk_chars: 1,
			..small_config()
		};
		let mut s = ChainStream::with_config(ChainModel::train(SEED), u64::MAX, config, rng).unwrap();
		let mut buf = vec![0u8; 1 << 20];

		let copied = s.read_chunked(&mut buf).unwrap();
		assert!(copied > 0);
		assert_eq!(s.position(), copied as u64);

		assert!(matches!(s.read_chunked(&mut buf), Err(TextGenError::WorkerGone)));
		assert_eq!(s.state(), StreamState::Stopped);
		assert!(matches!(s.read_chunked(&mut buf), Err(TextGenError::StreamClosed)));
	}

	#[test]
	fn blank_line_corpus_feeds_the_stream() {
		let corpus = format!("Hello world.{}", "\n".repeat(3000));
		for seed in 0..5 {
			let mut s =
				ChainStream::with_config(ChainModel::train(&corpus), 1000, small_config(), StdRng::seed_from_u64(seed))
					.unwrap();
			let mut out = Vec::new();
			s.read_to_end(&mut out).unwrap();
			assert_eq!(out.len(), 1000, "seed {seed}");
		}
	}

	#[test]
	fn degenerate_model_is_rejected() {
		let result = ChainStream::new(ChainModel::train("\n\n"), 10);
		assert!(matches!(result, Err(TextGenError::DegenerateModel)));
	}

	#[test]
	fn invalid_config_is_rejected() {
		let config = StreamConfig {
			refill_every: 0,
			..StreamConfig::default()
		};
		let result = ChainStream::with_config(ChainModel::train(SEED), 10, config, StdRng::seed_from_u64(0));
		assert!(matches!(result, Err(TextGenError::InvalidConfig(_))));
	}
}
