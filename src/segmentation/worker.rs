use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::canvas::raster::BoolMask;
use crate::error::{AnnotatorError, Result};
use crate::segmentation::oracle::SegmentationOracle;
use crate::segmentation::prompts::PromptSet;

/// Message posted by the background initialization thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleEvent {
    Ready { generation: u64 },
    Failed { generation: u64, message: String },
}

type SharedOracle = Arc<Mutex<Box<dyn SegmentationOracle>>>;
type WakeFn = Arc<dyn Fn() + Send + Sync>;

/// Owns the oracle and runs `set_image` off the interactive thread.
///
/// Every image gets a new generation token. Events carrying an older token
/// are dropped, so switching images mid-initialization never marks the new
/// image ready with stale features.
pub struct OracleHandle {
    oracle: SharedOracle,
    generation: u64,
    latest: Arc<AtomicU64>,
    ready: bool,
    last_error: Option<String>,
    tx: Sender<OracleEvent>,
    rx: Receiver<OracleEvent>,
    waker: Option<WakeFn>,
}

impl OracleHandle {
    pub fn new(oracle: Box<dyn SegmentationOracle>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            oracle: Arc::new(Mutex::new(oracle)),
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
            ready: false,
            last_error: None,
            tx,
            rx,
            waker: None,
        }
    }

    /// Called from the worker after it posts an event, e.g. to request a repaint.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Some(Arc::new(waker));
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start loading `image` into the oracle. Readiness drops until the matching event arrives.
    pub fn begin_image(&mut self, image: RgbImage) -> u64 {
        self.generation += 1;
        self.ready = false;
        self.last_error = None;
        let generation = self.generation;
        self.latest.store(generation, Ordering::SeqCst);

        let oracle = Arc::clone(&self.oracle);
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        log::debug!("oracle initialization started (generation {generation})");

        thread::spawn(move || {
            let event = match oracle.lock() {
                // a newer image was queued while this one waited for the lock
                Ok(_) if latest.load(Ordering::SeqCst) != generation => return,
                Ok(mut guard) => match guard.set_image(&image) {
                    Ok(()) => OracleEvent::Ready { generation },
                    Err(err) => OracleEvent::Failed {
                        generation,
                        message: err.to_string(),
                    },
                },
                Err(_) => OracleEvent::Failed {
                    generation,
                    message: "oracle lock poisoned".to_string(),
                },
            };
            let _ = tx.send(event);
            if let Some(waker) = waker {
                waker();
            }
        });
        generation
    }

    /// Drain pending events. Returns `true` when readiness changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    fn apply(&mut self, event: OracleEvent) -> bool {
        match event {
            OracleEvent::Ready { generation } if generation == self.generation => {
                log::info!("segmentation oracle ready (generation {generation})");
                let changed = !self.ready;
                self.ready = true;
                changed
            }
            OracleEvent::Failed {
                generation,
                message,
            } if generation == self.generation => {
                log::error!("segmentation oracle failed to initialize: {message}");
                let changed = self.ready;
                self.ready = false;
                self.last_error = Some(message);
                changed
            }
            OracleEvent::Ready { generation } | OracleEvent::Failed { generation, .. } => {
                log::warn!(
                    "discarding stale oracle event (generation {generation}, current {})",
                    self.generation
                );
                false
            }
        }
    }

    /// Block until the current generation is ready or `timeout` elapses.
    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.ready {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.apply(event);
                    if self.last_error.is_some() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        self.ready
    }

    /// Run one synchronous prediction for the current image.
    pub fn predict(&self, prompts: &PromptSet) -> Result<BoolMask> {
        if !self.ready {
            return Err(AnnotatorError::OracleNotReady);
        }
        let (points, labels) = prompts.to_arrays();
        let mut oracle = self
            .oracle
            .lock()
            .map_err(|_| AnnotatorError::Oracle("oracle lock poisoned".to_string()))?;
        oracle.predict(&points, &labels)
    }
}
