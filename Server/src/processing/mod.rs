use std::sync::Arc;
use std::time::Instant;

use cloud_frame::{encode_xyzi, CloudFrame, DecodeError, PointReader, PointXYZI};
use prometheus::IntGauge;
use rayon::ThreadPool;
use tracing::{debug, error, instrument};

use crate::decoders;
use crate::metrics::get_metrics;
use crate::services::config_store::ConfigStore;
use crate::services::topic_manager::TopicManager;

pub mod filter;
pub mod summary;

use filter::filter_by_intensity;

/// Everything the node publishes for one processed frame: the re-encoded
/// cloud and the textual summary. Discarded as soon as it has been emitted.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub cloud: CloudFrame,
    pub summary: String,
    pub received_at: Instant,
}

#[derive(Clone, Debug)]
pub struct ProcessingPipeline {
    pub thread_pool: Arc<ThreadPool>,
    config_store: Arc<ConfigStore>,
    decoding_time: IntGauge,
    process_to_buffer_time: IntGauge,
    frames_to_decode: IntGauge,
    frames_dropped: IntGauge,
    points_kept: IntGauge,
}

impl ProcessingPipeline {
    #[instrument(skip_all)]
    pub fn new(thread_pool: Arc<ThreadPool>, config_store: Arc<ConfigStore>) -> Self {
        let metrics = get_metrics();
        Self {
            thread_pool,
            config_store,
            decoding_time: metrics
                .get_or_create_gauge("decoding_time", "Time taken to decode a frame")
                .unwrap(),
            process_to_buffer_time: metrics
                .get_or_create_gauge(
                    "process_to_buffer_time",
                    "Time taken to filter a frame and push it to the egress buffer.",
                )
                .unwrap(),
            frames_to_decode: metrics
                .get_or_create_gauge("frames_to_decode", "Number of frames to be decoded")
                .unwrap(),
            frames_dropped: metrics
                .get_or_create_gauge(
                    "frames_dropped",
                    "Number of frames dropped because they failed to decode",
                )
                .unwrap(),
            points_kept: metrics
                .get_or_create_gauge(
                    "points_kept",
                    "Number of points kept by the most recent filtering pass",
                )
                .unwrap(),
        }
    }

    /// Hands a raw frame payload to the worker pool. The pool has a single
    /// thread, so frames are filtered strictly one after another.
    #[instrument(skip_all)]
    pub fn push_to_decoder(&self, raw_data: Vec<u8>, topic_manager: Arc<TopicManager>) {
        let processing_pipeline = Arc::new(self.clone());
        let thread_pool = Arc::clone(&self.thread_pool);

        thread_pool.spawn(move || {
            ProcessingPipeline::handle_decoding_and_processing(
                processing_pipeline,
                raw_data,
                topic_manager,
            );
        });
    }

    /// Runs on the worker thread: unwraps the transport envelope, filters
    /// the frame, and forwards the output to the egress. Every failure is
    /// local to this frame; the next frame starts fresh.
    #[instrument(skip_all)]
    fn handle_decoding_and_processing(
        processing_pipeline: Arc<ProcessingPipeline>,
        raw_data: Vec<u8>,
        topic_manager: Arc<TopicManager>,
    ) {
        let start_time = Instant::now();
        processing_pipeline.frames_to_decode.inc();

        // Decode the raw data
        let frame = match decoders::decode_frame(raw_data) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Decoding failed: {:?}", e);
                processing_pipeline.frames_dropped.inc();
                return;
            }
        };

        // Capture how long it took to decode the frame
        processing_pipeline
            .decoding_time
            .set(start_time.elapsed().as_micros() as i64);

        let start_time = Instant::now();

        match processing_pipeline.process_frame(frame) {
            Ok(Some(output)) => {
                if let Some(egress) = topic_manager.get_websocket_egress() {
                    egress.push_output(output);
                } else {
                    error!("WebSocket egress is not initialized");
                }
            }
            Ok(None) => debug!("No points passed the filter, nothing to publish"),
            Err(e) => {
                error!("Frame rejected: {}", e);
                processing_pipeline.frames_dropped.inc();
            }
        }

        // Capture how long it took to process the frame
        processing_pipeline
            .process_to_buffer_time
            .set(start_time.elapsed().as_micros() as i64);
    }

    /// Filters one frame against the threshold in effect when it arrived.
    ///
    /// The threshold is read exactly once, so a concurrent reconfiguration
    /// never splits a frame between two values. Records with a non-finite
    /// coordinate are excluded before the intensity comparison. Returns
    /// `Ok(None)` when nothing passes; such frames produce no output at all.
    #[instrument(skip_all)]
    pub fn process_frame(&self, frame: CloudFrame) -> Result<Option<FrameOutput>, DecodeError> {
        let received_at = Instant::now();
        let threshold = self.config_store.intensity_threshold();

        let reader = PointReader::new(&frame)?;
        let result = filter_by_intensity(
            reader.points().filter(PointXYZI::has_finite_position),
            threshold,
        );

        if result.points.is_empty() {
            return Ok(None);
        }
        self.points_kept.set(result.points.len() as i64);

        let summary = summary::format_summary(&frame.header, &result);
        let cloud = encode_xyzi(frame.header, &result.points);

        Ok(Some(FrameOutput { cloud, summary, received_at }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::init_test_metrics;
    use cloud_frame::{FrameHeader, FrameStamp};
    use rayon::ThreadPoolBuilder;

    fn test_pipeline(threshold: f64) -> (ProcessingPipeline, Arc<ConfigStore>) {
        init_test_metrics();
        let thread_pool = Arc::new(ThreadPoolBuilder::new().num_threads(1).build().unwrap());
        let config_store = Arc::new(ConfigStore::new(threshold));
        (
            ProcessingPipeline::new(thread_pool, config_store.clone()),
            config_store,
        )
    }

    fn header() -> FrameHeader {
        FrameHeader {
            stamp: FrameStamp { sec: 12, nsec: 500_000_000 },
            frame_id: "velodyne".to_owned(),
        }
    }

    fn frame_with_intensities(intensities: &[f32]) -> CloudFrame {
        let points: Vec<PointXYZI> = intensities
            .iter()
            .enumerate()
            .map(|(i, &intensity)| PointXYZI { x: i as f32, y: 0.0, z: 0.0, intensity })
            .collect();
        encode_xyzi(header(), &points)
    }

    #[test]
    fn keeps_points_at_or_above_threshold_in_order() {
        let (pipeline, _) = test_pipeline(100.0);

        let output = pipeline
            .process_frame(frame_with_intensities(&[50.0, 150.0, 200.0]))
            .unwrap()
            .unwrap();

        assert_eq!(output.cloud.width, 2);
        assert_eq!(output.cloud.height, 1);
        let reader = PointReader::new(&output.cloud).unwrap();
        let kept: Vec<f32> = reader.points().map(|p| p.intensity).collect();
        assert_eq!(kept, vec![150.0, 200.0]);
        assert_eq!(output.summary, "time=12.500, count=2, max_intensity=200.0");
    }

    #[test]
    fn empty_result_produces_no_output() {
        let (pipeline, _) = test_pipeline(100.0);

        let output = pipeline
            .process_frame(frame_with_intensities(&[10.0, 20.0]))
            .unwrap();
        assert!(output.is_none());
    }

    #[test]
    fn threshold_change_applies_to_the_next_frame() {
        let (pipeline, config_store) = test_pipeline(100.0);

        let first = pipeline
            .process_frame(frame_with_intensities(&[80.0]))
            .unwrap();
        assert!(first.is_none());

        config_store.set_intensity_threshold(50.0);

        let second = pipeline
            .process_frame(frame_with_intensities(&[80.0]))
            .unwrap()
            .unwrap();
        assert_eq!(second.cloud.width, 1);
    }

    #[test]
    fn non_finite_position_is_excluded_despite_high_intensity() {
        let (pipeline, _) = test_pipeline(100.0);

        let points = [PointXYZI { x: f32::NAN, y: 0.0, z: 0.0, intensity: 500.0 }];
        let output = pipeline.process_frame(encode_xyzi(header(), &points)).unwrap();
        assert!(output.is_none());
    }

    #[test]
    fn missing_intensity_field_rejects_the_frame() {
        let (pipeline, _) = test_pipeline(100.0);

        let mut frame = frame_with_intensities(&[150.0]);
        frame.fields.retain(|field| field.name != "intensity");

        match pipeline.process_frame(frame) {
            Err(DecodeError::MissingField(name)) => assert_eq!(name, "intensity"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn header_is_carried_over_verbatim() {
        let (pipeline, _) = test_pipeline(100.0);

        let output = pipeline
            .process_frame(frame_with_intensities(&[150.0]))
            .unwrap()
            .unwrap();
        assert_eq!(output.cloud.header, header());
    }

    #[test]
    fn concurrent_reconfiguration_never_splits_a_frame() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let (pipeline, config_store) = test_pipeline(100.0);

        // Threshold 100.0 keeps all three points, threshold 300.0 keeps one.
        // A frame filtered against a single value can only ever yield 3 or 1.
        let intensities = [150.0, 200.0, 400.0];
        let stop = Arc::new(AtomicBool::new(false));
        let writer = {
            let config_store = config_store.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut flip = false;
                while !stop.load(Ordering::Relaxed) {
                    config_store.set_intensity_threshold(if flip { 100.0 } else { 300.0 });
                    flip = !flip;
                }
            })
        };

        for _ in 0..1000 {
            let output = pipeline
                .process_frame(frame_with_intensities(&intensities))
                .unwrap()
                .unwrap();
            let count = output.cloud.width;
            assert!(
                count == 3 || count == 1,
                "frame observed a mixed threshold: {} points kept",
                count
            );
        }

        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
    }
}
