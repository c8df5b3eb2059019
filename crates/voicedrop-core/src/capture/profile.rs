/// Default capture rate, matching the 44.1 kHz the backend was tuned for.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Fixed encoding parameters for every artifact: mono 16-bit PCM in a WAV
/// container. Only the sample rate is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfile {
    sample_rate: u32,
}

impl EncodingProfile {
    /// Mono, 16-bit PCM at `sample_rate`.
    pub const fn mono_pcm16(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Samples per second.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Always mono.
    pub const fn channels(&self) -> u16 {
        1
    }

    /// Bits per PCM sample.
    pub const fn bits_per_sample(&self) -> u16 {
        16
    }

    /// File extension of artifacts, without the dot.
    pub const fn extension(&self) -> &'static str {
        "wav"
    }

    /// MIME type sent as the part's `Content-Type`.
    pub const fn content_type(&self) -> &'static str {
        "audio/wav"
    }

    /// WAV header parameters for `hound`.
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels(),
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample(),
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self::mono_pcm16(DEFAULT_SAMPLE_RATE)
    }
}
