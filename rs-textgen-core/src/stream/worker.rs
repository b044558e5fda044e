use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, trace, warn};
use rand::Rng;

use super::config::{HandoffMode, StreamConfig};
use crate::error::{Result, TextGenError};
use crate::model::chain_model::ChainModel;
use crate::model::generation_input::StartWord;

/// Name given to the producer thread.
const WORKER_NAME: &str = "textgen-worker";

/// Producer side: owns the model, the random source and the sending ends.
///
/// Dropping it (when `run` returns, panicking or not) disconnects the
/// `exited` channel, which is how the reader learns that the thread is gone.
struct Worker<R> {
	model: Arc<ChainModel>,
	rng: R,
	chunk_chars: usize,
	stop: Arc<AtomicBool>,
	/// `None` in look-ahead mode: production is paced by `chunks` alone.
	requests: Option<Receiver<()>>,
	chunks: SyncSender<Vec<u8>>,
	_exited: Sender<()>,
}

impl<R: Rng> Worker<R> {
	fn run(mut self) {
		debug!("Text worker started ({} chars per chunk)", self.chunk_chars);
		let mut produced: u64 = 0;

		loop {
			if let Some(requests) = &self.requests {
				// Disconnected: the reader closed the stream.
				if requests.recv().is_err() {
					break;
				}
			}
			if self.stop.load(Ordering::Acquire) {
				break;
			}

			let chunk = self.generate_chunk();
			trace!("Chunk {produced} ready: {} bytes", chunk.len());

			if self.stop.load(Ordering::Acquire) {
				break;
			}
			// Blocks in look-ahead mode until the reader takes the chunk.
			if self.chunks.send(chunk).is_err() {
				break;
			}
			produced += 1;
		}

		debug!("Text worker exiting after {produced} chunks");
	}

	/// One passage, terminated by whitespace so that chunks (and replays of
	/// the same chunk) join without gluing two sentences.
	fn generate_chunk(&mut self) -> Vec<u8> {
		let mut text = self
			.model
			.generate_by_chars(&StartWord::Random, self.chunk_chars, &mut self.rng);
		if !text.is_empty() && !text.ends_with(char::is_whitespace) {
			text.push(' ');
		}
		text.into_bytes()
	}
}

/// Reader side of a running worker.
pub(crate) struct WorkerHandle {
	requests: Option<Sender<()>>,
	chunks: Receiver<Vec<u8>>,
	exited: Receiver<()>,
	thread: JoinHandle<()>,
}

/// Spawns the producer thread.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub(crate) fn spawn<R>(model: Arc<ChainModel>, rng: R, config: &StreamConfig, stop: Arc<AtomicBool>) -> Result<WorkerHandle>
where
	R: Rng + Send + 'static,
{
	let (request_tx, request_rx) = match config.mode {
		HandoffMode::OnDemand => {
			let (tx, rx) = mpsc::channel();
			(Some(tx), Some(rx))
		}
		HandoffMode::LookAhead => (None, None),
	};
	// On demand: one slot, filled only after a request.
	// Look-ahead: rendezvous, the finished chunk waits in the worker.
	let capacity = match config.mode {
		HandoffMode::OnDemand => 1,
		HandoffMode::LookAhead => 0,
	};
	let (chunk_tx, chunk_rx) = mpsc::sync_channel(capacity);
	let (exited_tx, exited_rx) = mpsc::channel();

	let worker = Worker {
		model,
		rng,
		chunk_chars: config.chunk_chars,
		stop,
		requests: request_rx,
		chunks: chunk_tx,
		_exited: exited_tx,
	};
	let thread = thread::Builder::new()
		.name(WORKER_NAME.to_owned())
		.spawn(move || worker.run())?;

	Ok(WorkerHandle {
		requests: request_tx,
		chunks: chunk_rx,
		exited: exited_rx,
		thread,
	})
}

impl WorkerHandle {
	/// Asks for a fresh chunk (on demand) and waits for it.
	///
	/// # Errors
	/// `WorkerGone` if the worker has exited; the caller decides whether
	/// that was requested.
	pub(crate) fn next_chunk(&self) -> Result<Vec<u8>> {
		if let Some(requests) = &self.requests {
			requests.send(()).map_err(|_| TextGenError::WorkerGone)?;
		}
		self.chunks.recv().map_err(|_| TextGenError::WorkerGone)
	}

	/// Wakes the worker, waits for it to exit and joins it.
	///
	/// Dropping both channel ends unblocks a worker waiting for a request or
	/// for the hand-off. A worker still busy generating is waited for, up to
	/// `timeout`; past that it is abandoned.
	///
	/// Returns `false` if the worker was abandoned.
	pub(crate) fn shutdown(self, timeout: Option<Duration>) -> bool {
		let WorkerHandle {
			requests,
			chunks,
			exited,
			thread,
		} = self;
		drop(requests);
		drop(chunks);

		let exited_in_time = match timeout {
			Some(timeout) => !matches!(exited.recv_timeout(timeout), Err(RecvTimeoutError::Timeout)),
			None => {
				let _ = exited.recv();
				true
			}
		};

		if !exited_in_time {
			warn!("Text worker did not exit within {timeout:?}, abandoning it");
			return false;
		}
		if thread.join().is_err() {
			warn!("Text worker panicked");
		}
		debug!("Text worker joined");
		true
	}
}
