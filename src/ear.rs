use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SupportedStreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::assistant::StopSignal;
use crate::{Error, Result};

/// Ring buffer capacity, in frames
const RING_FRAMES: usize = 8;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Block of 16-bit mono PCM samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Vec<i16>,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Continuous producer of fixed-size audio frames
pub trait AudioSource {
    /// Opens the underlying device or file. Failure is fatal to the caller.
    fn open(&mut self) -> Result<()>;

    /// Sample rate of the frames, valid after `open`
    fn sample_rate(&self) -> u32;

    /// Blocks until a full frame is available. `None` means the input ended
    /// or a stop was requested while waiting.
    fn read_frame(&mut self) -> Option<AudioFrame>;

    /// Releases the device; safe to call more than once
    fn close(&mut self);
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn read_frame(&mut self) -> Option<AudioFrame> {
        (**self).read_frame()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Averages interleaved channels down to mono
pub fn downmix(interleaved: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / chunk.len() as i32) as i16
        })
        .collect()
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn log_stream_error(err: cpal::StreamError) {
    tracing::error!(error = %err, "audio stream error");
}

/// Writer half living in the cpal callback
struct CaptureSink {
    producer: HeapProd<i16>,
    channels: usize,
    dropped: Arc<AtomicU64>,
}

impl CaptureSink {
    fn push(&mut self, interleaved: &[i16]) {
        let mono = downmix(interleaved, self.channels);
        let written = self.producer.push_slice(&mono);
        if written < mono.len() {
            self.dropped
                .fetch_add((mono.len() - written) as u64, Ordering::Relaxed);
        }
    }
}

/// Microphone capture from the default input device
pub struct CpalSource {
    requested_rate: u32,
    frame_samples: usize,
    stop: StopSignal,
    sample_rate: u32,
    stream: Option<cpal::Stream>,
    consumer: Option<HeapCons<i16>>,
    dropped: Arc<AtomicU64>,
}

impl CpalSource {
    pub fn new(requested_rate: u32, frame_samples: usize, stop: StopSignal) -> Self {
        Self {
            requested_rate,
            frame_samples,
            stop,
            sample_rate: requested_rate,
            stream: None,
            consumer: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    // Prefers a mono config at the requested rate, else the device default.
    fn pick_config(&self, device: &cpal::Device) -> Result<SupportedStreamConfig> {
        let wanted = SampleRate(self.requested_rate);
        if let Ok(mut configs) = device.supported_input_configs() {
            let mono = configs.find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= wanted
                    && c.max_sample_rate() >= wanted
                    && matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32)
            });
            if let Some(config) = mono {
                return Ok(config.with_sample_rate(wanted));
            }
        }
        device
            .default_input_config()
            .map_err(|e| Error::Audio(format!("no usable input config: {}", e)))
    }

    fn report_overruns(&self) {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(dropped, "audio buffer overrun, samples dropped");
        }
    }
}

impl AudioSource for CpalSource {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device found".to_string()))?;

        let supported = self.pick_config(&device)?;
        let channels = supported.channels() as usize;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();

        let ring = HeapRb::<i16>::new(self.frame_samples * RING_FRAMES);
        let (producer, consumer) = ring.split();
        let mut sink = CaptureSink {
            producer,
            channels,
            dropped: self.dropped.clone(),
        };

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| sink.push(data),
                log_stream_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                    sink.push(&converted);
                },
                log_stream_error,
                None,
            ),
            other => {
                return Err(Error::Audio(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| Error::Audio(format!("error building stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::Audio(format!("error starting stream: {}", e)))?;

        self.sample_rate = config.sample_rate.0;
        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate = self.sample_rate,
            channels,
            frame_samples = self.frame_samples,
            "audio capture started"
        );

        self.stream = Some(stream);
        self.consumer = Some(consumer);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frame(&mut self) -> Option<AudioFrame> {
        let mut frame = vec![0i16; self.frame_samples];
        let mut filled = 0;
        while filled < frame.len() {
            if self.stop.is_raised() {
                return None;
            }
            let consumer = self.consumer.as_mut()?;
            let n = consumer.pop_slice(&mut frame[filled..]);
            filled += n;
            if n == 0 {
                thread::sleep(POLL_INTERVAL);
            }
        }
        self.report_overruns();
        Some(AudioFrame::new(frame))
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::info!("audio capture stopped");
        }
        self.consumer = None;
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replays a 16-bit PCM WAV file as if it were a microphone
pub struct WavSource {
    path: PathBuf,
    frame_samples: usize,
    reader: Option<hound::WavReader<BufReader<File>>>,
    channels: usize,
    sample_rate: u32,
}

impl WavSource {
    pub fn new(path: impl AsRef<Path>, frame_samples: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame_samples,
            reader: None,
            channels: 1,
            sample_rate: 0,
        }
    }
}

impl AudioSource for WavSource {
    fn open(&mut self) -> Result<()> {
        if self.reader.is_some() {
            return Ok(());
        }
        let reader = hound::WavReader::open(&self.path).map_err(|e| {
            Error::Audio(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(Error::Audio(format!(
                "{} is not 16-bit PCM",
                self.path.display()
            )));
        }

        self.channels = spec.channels.max(1) as usize;
        self.sample_rate = spec.sample_rate;
        tracing::info!(
            path = %self.path.display(),
            sample_rate = self.sample_rate,
            channels = self.channels,
            "replaying audio file"
        );
        self.reader = Some(reader);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frame(&mut self) -> Option<AudioFrame> {
        let reader = self.reader.as_mut()?;
        let wanted = self.frame_samples * self.channels;
        let mut interleaved = Vec::with_capacity(wanted);

        for sample in reader.samples::<i16>().take(wanted) {
            match sample {
                Ok(s) => interleaved.push(s),
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt sample, ending replay");
                    break;
                }
            }
        }

        if interleaved.is_empty() {
            return None;
        }
        Some(AudioFrame::new(downmix(&interleaved, self.channels)))
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_downmix() {
        assert_eq!(downmix(&[1, 3, -4, 4], 2), vec![2, 0]);
        assert_eq!(downmix(&[5, 6], 1), vec![5, 6]);
    }

    #[test]
    fn test_f32_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), -i16::MAX);
    }

    #[test]
    fn test_overrun_is_counted_and_next_frame_still_read() {
        let (producer, consumer) = HeapRb::<i16>::new(4).split();
        let mut source = CpalSource::new(16000, 4, StopSignal::new());
        let mut sink = CaptureSink {
            producer,
            channels: 1,
            dropped: source.dropped.clone(),
        };

        sink.push(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(source.dropped.load(Ordering::Relaxed), 2);

        source.consumer = Some(consumer);
        let frame = source.read_frame().unwrap();
        assert_eq!(frame.samples(), &[1, 2, 3, 4]);
        assert_eq!(source.dropped.load(Ordering::Relaxed), 0);

        // Space freed by the read is usable again
        sink.push(&[7, 8]);
        sink.push(&[9, 10]);
        assert_eq!(source.read_frame().unwrap().samples(), &[7, 8, 9, 10]);
    }

    #[test]
    fn test_capture_sink_downmixes_before_buffering() {
        let (producer, mut consumer) = HeapRb::<i16>::new(8).split();
        let dropped = Arc::new(AtomicU64::new(0));
        let mut sink = CaptureSink {
            producer,
            channels: 2,
            dropped: dropped.clone(),
        };

        sink.push(&[10, 20, 30, 50]);
        let mut out = [0i16; 8];
        assert_eq!(consumer.pop_slice(&mut out), 2);
        assert_eq!(&out[..2], &[15, 40]);
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_read_frame_returns_none_when_stopped() {
        let (_producer, consumer) = HeapRb::<i16>::new(4).split();
        let stop = StopSignal::new();
        let mut source = CpalSource::new(16000, 4, stop.clone());
        source.consumer = Some(consumer);

        stop.raise();
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn test_wav_source_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("speech.wav");
        let samples: Vec<i16> = (0..10).collect();
        write_wav(&path, 1, &samples);

        let mut source = WavSource::new(&path, 4);
        source.open().unwrap();
        assert_eq!(source.sample_rate(), 16000);

        assert_eq!(source.read_frame().unwrap().samples(), &[0, 1, 2, 3]);
        assert_eq!(source.read_frame().unwrap().samples(), &[4, 5, 6, 7]);
        assert_eq!(source.read_frame().unwrap().samples(), &[8, 9]);
        assert!(source.read_frame().is_none());

        source.close();
        source.close();
        assert!(source.read_frame().is_none());
    }

    #[test]
    fn test_wav_source_downmixes_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[10, 20, 30, 50]);

        let mut source = WavSource::new(&path, 4);
        source.open().unwrap();
        assert_eq!(source.read_frame().unwrap().samples(), &[15, 40]);
    }

    #[test]
    fn test_wav_source_missing_file() {
        let mut source = WavSource::new("/nonexistent/file.wav", 4);
        assert!(matches!(source.open(), Err(Error::Audio(_))));
    }
}
