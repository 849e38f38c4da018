// egress/websocket.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use circular_buffer::CircularBuffer;
use prometheus::IntGauge;
use tracing::{debug, error, instrument};

use crate::encoders;
use crate::metrics::get_metrics;
use crate::processing::FrameOutput;
use crate::services::topic_manager::TopicManager;

/// Room every connected client joins; filtered clouds and summaries are
/// broadcast to it.
pub const BROADCAST_ROOM: &str = "broadcast";

/// WebSocket egress responsible for publishing filtered frames.
///
/// Outputs are buffered most-recent-wins: the ring holds a single entry and
/// an undelivered output is dropped as soon as a newer one arrives. The
/// pipeline itself never buffers input frames.
#[derive(Clone, Debug)]
pub struct WebSocketEgress {
    topic_manager: Arc<TopicManager>,
    output_buffer: Arc<Mutex<CircularBuffer<1, FrameOutput>>>,
    threads_started: Arc<AtomicBool>,
    bytes_to_send: IntGauge,
    frame_drops_full_egress_buffer: IntGauge,
    frames_emitted: IntGauge,
}

impl WebSocketEgress {
    /// Initializes the WebSocket Egress module.
    #[instrument(skip_all)]
    pub fn initialize(topic_manager: Arc<TopicManager>) {
        let metrics = get_metrics();
        let instance = Arc::new(Self {
            topic_manager: topic_manager.clone(),
            output_buffer: Arc::new(Mutex::new(CircularBuffer::new())),
            threads_started: Arc::new(AtomicBool::new(false)),
            bytes_to_send: metrics
                .get_or_create_gauge("bytes_to_send", "Number of bytes to send")
                .unwrap(),
            frame_drops_full_egress_buffer: metrics
                .get_or_create_gauge(
                    "frame_drops_full_egress_buffer",
                    "Number of undelivered outputs dropped because a newer one arrived first.",
                )
                .unwrap(),
            frames_emitted: metrics
                .get_or_create_gauge(
                    "frames_emitted",
                    "Number of filtered frames emitted to clients",
                )
                .unwrap(),
        });

        // Store the instance in the TopicManager
        topic_manager.set_websocket_egress(instance);
    }

    fn ensure_threads_started(&self) {
        let already_started = self.threads_started.load(Ordering::Relaxed);
        if already_started {
            return;
        }

        // Set the threads as started
        self.threads_started.store(true, Ordering::Relaxed);

        let egress = self.clone();
        let _ = thread::Builder::new()
            .name("WS_E Transmission Thread".to_string())
            .spawn(move || {
                egress.send_outputs_to_clients();
            });
    }

    /// Queues one frame's outputs for transmission. If the previous output
    /// has not been sent yet it is replaced (most-recent-wins).
    #[instrument(skip_all)]
    pub fn push_output(&self, output: FrameOutput) {
        // Ensure the transmission thread is started
        self.ensure_threads_started();

        let mut buffer = self.output_buffer.lock().unwrap();
        if buffer.is_full() {
            debug!("Output buffer is full, dropping oldest output");
            self.frame_drops_full_egress_buffer.inc();
        }
        buffer.push_back(output);
    }

    #[instrument(skip_all)]
    fn send_outputs_to_clients(&self) {
        let metrics = get_metrics();
        let total_processing_time = metrics
            .get_or_create_gauge(
                "total_processing_time",
                "Total time taken to process a frame. From the moment the frame entered the filter, until its output was emitted.",
            )
            .unwrap();

        loop {
            let output_opt = { self.output_buffer.lock().unwrap().pop_front() };

            if let Some(output) = output_opt {
                total_processing_time.set(output.received_at.elapsed().as_micros() as i64);
                self.emit_output(output);
                thread::sleep(Duration::from_millis(1));
            } else {
                // Sleep to prevent busy-waiting
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    /// Emits the filtered cloud and its summary line to all connected clients.
    #[instrument(skip_all)]
    fn emit_output(&self, output: FrameOutput) {
        let io_option = self.topic_manager.get_socket_io();
        let io = match io_option {
            Some(io) => io,
            None => {
                error!("Socket IO is not initialized");
                return;
            }
        };

        // Convert to base64 bytes using the bitcode and rbase64 crates
        let bytes: Bytes = {
            let encoded: Vec<u8> = encoders::encode_frame(&output.cloud);
            let base64_encoded: String = rbase64::encode(&encoded);
            Bytes::from(base64_encoded)
        };
        self.bytes_to_send.set(bytes.len() as i64);
        debug!("Encoded frame to {} bytes", bytes.len());

        match io.to(BROADCAST_ROOM).emit::<Bytes>("points:filtered", &bytes) {
            Ok(_) => debug!("Emitted filtered cloud with {} points", output.cloud.width),
            Err(err) => error!("Socket error during cloud emit: {:?}", err),
        }

        match io
            .to(BROADCAST_ROOM)
            .emit::<String>("points:info", &output.summary)
        {
            Ok(_) => debug!("Emitted summary: {}", output.summary),
            Err(err) => error!("Socket error during summary emit: {:?}", err),
        }

        self.frames_emitted.inc();
    }
}
