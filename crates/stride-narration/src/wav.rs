//! WAV container encoding for raw PCM returned by the speech service.
//!
//! The speech service reports its output format as a MIME type. When that
//! type names a self-contained format (MP3, WAV, OGG, ...) the bytes are
//! stored as-is; raw `audio/L16`-style PCM is wrapped in a canonical
//! 44-byte RIFF/WAVE header first.

/// MIME type assumed when the service does not declare one.
pub const DEFAULT_PCM_MIME: &str = "audio/L16;rate=24000";
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
pub const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Size of the header written by [`wrap_pcm`].
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// MIME type of the container produced by [`wrap_pcm`].
pub const WAV_MIME: &str = "audio/wav";

/// Layout of raw PCM samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
            channels: 1,
        }
    }
}

impl PcmFormat {
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    /// Bytes per second, saturating at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    fn fits_header(&self) -> bool {
        self.sample_rate
            .checked_mul(u32::from(self.block_align()))
            .is_some()
    }
}

/// Reads sample rate and bit depth from a MIME descriptor such as
/// `audio/L16;codec=pcm;rate=24000`.
///
/// Missing or unparseable parameters fall back to 16-bit / 24000 Hz, as does
/// a declared format whose byte rate cannot be written in a WAV header.
/// Output is always mono.
pub fn parse_pcm_mime(mime_type: &str) -> PcmFormat {
    let mut format = PcmFormat::default();

    for segment in mime_type.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let lower = segment.to_ascii_lowercase();
        if let Some(rate) = lower.strip_prefix("rate=") {
            if let Some(rate) = rate.trim().parse::<u32>().ok().filter(|r| *r > 0) {
                format.sample_rate = rate;
            }
        } else if let Some(bits) = lower.strip_prefix("audio/l") {
            if let Some(bits) = bits.parse::<u16>().ok().filter(|b| *b > 0) {
                format.bits_per_sample = bits;
            }
        }
    }

    if !format.fits_header() {
        tracing::warn!(mime_type, "PCM format out of range, using defaults");
        return PcmFormat::default();
    }
    format
}

/// Wraps raw PCM samples described by `source_mime` in a WAV container.
pub fn wrap_pcm(raw: &[u8], source_mime: &str) -> Vec<u8> {
    encode_wav(raw, parse_pcm_mime(source_mime))
}

/// Writes a RIFF/WAVE header for `format` followed by `samples`.
pub fn encode_wav(samples: &[u8], format: PcmFormat) -> Vec<u8> {
    let data_len = u32::try_from(samples.len()).unwrap_or(u32::MAX);
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + samples.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36u32.saturating_add(data_len)).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    wav.extend_from_slice(&format.channels.to_le_bytes());
    wav.extend_from_slice(&format.sample_rate.to_le_bytes());
    wav.extend_from_slice(&format.byte_rate().to_le_bytes());
    wav.extend_from_slice(&format.block_align().to_le_bytes());
    wav.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(samples);

    wav
}

/// File extension for a self-contained audio MIME type, or `None` when the
/// type is raw samples that need a container.
pub fn container_extension(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some("wav"),
        "audio/ogg" | "audio/opus" => Some("ogg"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/aac" => Some("aac"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/webm" => Some("webm"),
        _ => None,
    }
}
