//! Host capability probing.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorGamut {
    Srgb,
    P3,
    Rec2020,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Vp8,
    Vp9,
    Av1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
    Opus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCodecSupport {
    pub h264: bool,
    pub vp8: bool,
    pub vp9: bool,
    pub av1: bool,
}

impl VideoCodecSupport {
    fn probe(mut supports: impl FnMut(VideoCodec) -> bool) -> Self {
        Self {
            h264: supports(VideoCodec::H264),
            vp8: supports(VideoCodec::Vp8),
            vp9: supports(VideoCodec::Vp9),
            av1: supports(VideoCodec::Av1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioCodecSupport {
    pub aac: bool,
    pub opus: bool,
}

impl AudioCodecSupport {
    fn probe(mut supports: impl FnMut(AudioCodec) -> bool) -> Self {
        Self {
            aac: supports(AudioCodec::Aac),
            opus: supports(AudioCodec::Opus),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub waapi: bool,
    pub web_codecs: bool,
    pub offscreen_canvas: bool,
    pub webgl: bool,
    pub webgl2: bool,
    pub web_audio: bool,
    pub color_gamut: Option<ColorGamut>,
    pub video_codecs: VideoCodecSupport,
    pub audio_codecs: AudioCodecSupport,
    pub video_decoders: VideoCodecSupport,
    pub audio_decoders: AudioCodecSupport,
    pub user_agent: String,
}

/// What the embedding environment can do. Every probe defaults to "no".
pub trait HostCapabilities {
    fn native_animations(&self) -> bool {
        false
    }
    fn web_codecs(&self) -> bool {
        false
    }
    fn offscreen_canvas(&self) -> bool {
        false
    }
    fn webgl(&self) -> bool {
        false
    }
    fn webgl2(&self) -> bool {
        false
    }
    fn web_audio(&self) -> bool {
        false
    }
    fn color_gamut(&self) -> Option<ColorGamut> {
        None
    }
    fn can_encode_video(&self, _codec: VideoCodec) -> bool {
        false
    }
    fn can_decode_video(&self, _codec: VideoCodec) -> bool {
        false
    }
    fn can_encode_audio(&self, _codec: AudioCodec) -> bool {
        false
    }
    fn can_decode_audio(&self, _codec: AudioCodec) -> bool {
        false
    }
    fn user_agent(&self) -> String;
}

/// Server-side host with no browser APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl HostCapabilities for HeadlessHost {
    fn user_agent(&self) -> String {
        "Node/Server".to_string()
    }
}

pub fn diagnose(host: &dyn HostCapabilities) -> DiagnosticReport {
    DiagnosticReport {
        waapi: host.native_animations(),
        web_codecs: host.web_codecs(),
        offscreen_canvas: host.offscreen_canvas(),
        webgl: host.webgl(),
        webgl2: host.webgl2(),
        web_audio: host.web_audio(),
        color_gamut: host.color_gamut(),
        video_codecs: VideoCodecSupport::probe(|c| host.can_encode_video(c)),
        audio_codecs: AudioCodecSupport::probe(|c| host.can_encode_audio(c)),
        video_decoders: VideoCodecSupport::probe(|c| host.can_decode_video(c)),
        audio_decoders: AudioCodecSupport::probe(|c| host.can_decode_audio(c)),
        user_agent: host.user_agent(),
    }
}
