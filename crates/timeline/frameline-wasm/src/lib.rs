use js_sys::{Function, Promise, Reflect};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use frameline_core::diagnostics::{AudioCodec, ColorGamut, VideoCodec};
use frameline_core::{
    AudioTrackMeta, CaptionSource, Driver, DriverState, Engine, EngineOptions, EngineState,
    FramelineError, HostCapabilities, InputProps, ManualClock, ManualTicker, Marker,
    StabilityCheckId, StableFuture, SubscriptionId, TimelineBinding, TimelineClock,
    VirtualTimeSlot,
};

#[wasm_bindgen]
pub struct Frameline {
    core: Engine,
    ticker: ManualTicker,
    poller: ManualTicker,
    virtual_time: VirtualTimeSlot,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn js_err(e: FramelineError) -> JsError {
    JsError::new(&format!("{}: {e} ({})", e.code(), e.suggestion()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&swb::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("serialize error: {e}")))
}

fn optional_function(obj: &JsValue, key: &str) -> Option<Function> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
}

/// Driver backed by a JS object `{ update(positionMs, state), waitUntilStable?() }`.
struct JsDriver {
    update: Function,
    wait_until_stable: Option<Function>,
}

impl Driver for JsDriver {
    fn update(&mut self, position_ms: f64, state: &DriverState) {
        let state = match to_js(state) {
            Ok(v) => v,
            Err(_) => return,
        };
        if let Err(e) = self
            .update
            .call2(&JsValue::UNDEFINED, &JsValue::from_f64(position_ms), &state)
        {
            log::warn!("driver.update threw: {e:?}");
        }
    }

    fn wait_until_stable(&mut self) -> StableFuture {
        match &self.wait_until_stable {
            Some(f) => settle(f.call0(&JsValue::UNDEFINED)),
            None => frameline_core::driver::ready(),
        }
    }
}

/// Await the result of a JS call that may return a Promise. A throw or a
/// rejection becomes `StabilityCheckFailed`.
fn settle(result: Result<JsValue, JsValue>) -> StableFuture {
    Box::pin(async move {
        let value = result.map_err(|e| FramelineError::StabilityCheckFailed {
            reason: format!("{e:?}"),
        })?;
        if let Ok(promise) = value.dyn_into::<Promise>() {
            JsFuture::from(promise)
                .await
                .map_err(|e| FramelineError::StabilityCheckFailed {
                    reason: format!("{e:?}"),
                })?;
        }
        Ok(())
    })
}

/// Clock backed by a JS function returning milliseconds or null.
struct JsClock {
    f: Function,
}

impl TimelineClock for JsClock {
    fn current_time_ms(&self) -> Option<f64> {
        self.f
            .call0(&JsValue::UNDEFINED)
            .ok()
            .and_then(|v| v.as_f64())
    }
}

/// Capabilities reported by the JS host, e.g. gathered with feature detection.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProbedHost {
    waapi: bool,
    web_codecs: bool,
    offscreen_canvas: bool,
    webgl: bool,
    webgl2: bool,
    web_audio: bool,
    color_gamut: Option<ColorGamut>,
    video_encoders: Vec<VideoCodec>,
    video_decoders: Vec<VideoCodec>,
    audio_encoders: Vec<AudioCodec>,
    audio_decoders: Vec<AudioCodec>,
    user_agent: Option<String>,
}

impl HostCapabilities for ProbedHost {
    fn native_animations(&self) -> bool {
        self.waapi
    }
    fn web_codecs(&self) -> bool {
        self.web_codecs
    }
    fn offscreen_canvas(&self) -> bool {
        self.offscreen_canvas
    }
    fn webgl(&self) -> bool {
        self.webgl
    }
    fn webgl2(&self) -> bool {
        self.webgl2
    }
    fn web_audio(&self) -> bool {
        self.web_audio
    }
    fn color_gamut(&self) -> Option<ColorGamut> {
        self.color_gamut
    }
    fn can_encode_video(&self, codec: VideoCodec) -> bool {
        self.video_encoders.contains(&codec)
    }
    fn can_decode_video(&self, codec: VideoCodec) -> bool {
        self.video_decoders.contains(&codec)
    }
    fn can_encode_audio(&self, codec: AudioCodec) -> bool {
        self.audio_encoders.contains(&codec)
    }
    fn can_decode_audio(&self, codec: AudioCodec) -> bool {
        self.audio_decoders.contains(&codec)
    }
    fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| "unknown".to_string())
    }
}

#[wasm_bindgen]
impl Frameline {
    /// Create an engine. `options` is a JSON-like object (`{ duration, fps, ... }`);
    /// `driver`, if given, is `{ update(positionMs, state), waitUntilStable?() }`.
    /// Example:
    ///   new Frameline({ duration: 10, fps: 30, loop: true }, null)
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue, driver: JsValue) -> Result<Frameline, JsError> {
        console_error_panic_hook::set_once();

        if jsvalue_is_undefined_or_null(&options) {
            return Err(JsError::new("options error: `duration` is required"));
        }
        let opts: EngineOptions =
            swb::from_value(options).map_err(|e| JsError::new(&format!("options error: {e}")))?;

        let ticker = ManualTicker::new();
        let mut opts = opts.with_ticker(ticker.clone());
        if !jsvalue_is_undefined_or_null(&driver) {
            let update = optional_function(&driver, "update")
                .ok_or_else(|| JsError::new("driver must have an update(positionMs, state) function"))?;
            opts = opts.with_driver(JsDriver {
                update,
                wait_until_stable: optional_function(&driver, "waitUntilStable"),
            });
        }

        Ok(Frameline {
            core: Engine::new(opts).map_err(js_err)?,
            ticker,
            poller: ManualTicker::new(),
            virtual_time: VirtualTimeSlot::new(),
        })
    }

    /// Current state snapshot as a plain JS object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsError> {
        to_js(&self.core.get_state())
    }

    /// Feed elapsed wall time (e.g. from requestAnimationFrame). Also polls a
    /// bound document timeline. Returns whether the playback ticker consumed it.
    #[wasm_bindgen]
    pub fn tick(&self, delta_ms: f64) -> bool {
        self.poller.tick(delta_ms);
        self.ticker.tick(delta_ms)
    }

    #[wasm_bindgen]
    pub fn seek(&self, frame: f64) {
        self.core.seek(frame);
    }

    #[wasm_bindgen(js_name = seekToTime)]
    pub fn seek_to_time(&self, seconds: f64) {
        self.core.seek_to_time(seconds);
    }

    #[wasm_bindgen]
    pub fn play(&self) {
        self.core.play();
    }

    #[wasm_bindgen]
    pub fn pause(&self) {
        self.core.pause();
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) {
        self.core.set_playback_rate(rate);
    }

    #[wasm_bindgen(js_name = setLoop)]
    pub fn set_loop(&self, looping: bool) {
        self.core.set_loop(looping);
    }

    #[wasm_bindgen(js_name = setDuration)]
    pub fn set_duration(&self, seconds: f64) -> Result<(), JsError> {
        self.core.set_duration(seconds).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setFps)]
    pub fn set_fps(&self, fps: f64) -> Result<(), JsError> {
        self.core.set_fps(fps).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&self, width: i32, height: i32) -> Result<(), JsError> {
        self.core
            .set_size(i64::from(width), i64::from(height))
            .map_err(js_err)
    }

    #[wasm_bindgen(js_name = setPlaybackRange)]
    pub fn set_playback_range(&self, start: f64, end: f64) -> Result<(), JsError> {
        self.core.set_playback_range(start, end).map_err(js_err)
    }

    #[wasm_bindgen(js_name = clearPlaybackRange)]
    pub fn clear_playback_range(&self) {
        self.core.clear_playback_range();
    }

    #[wasm_bindgen(js_name = addMarker)]
    pub fn add_marker(&self, marker: JsValue) -> Result<(), JsError> {
        let marker: Marker =
            swb::from_value(marker).map_err(|e| JsError::new(&format!("marker error: {e}")))?;
        self.core.add_marker(marker).map_err(js_err)
    }

    #[wasm_bindgen(js_name = removeMarker)]
    pub fn remove_marker(&self, id: String) {
        self.core.remove_marker(&id);
    }

    #[wasm_bindgen(js_name = setMarkers)]
    pub fn set_markers(&self, markers: JsValue) -> Result<(), JsError> {
        let markers: Vec<Marker> =
            swb::from_value(markers).map_err(|e| JsError::new(&format!("markers error: {e}")))?;
        self.core.set_markers(markers).map_err(js_err)
    }

    #[wasm_bindgen(js_name = seekToMarker)]
    pub fn seek_to_marker(&self, id: String) -> Result<(), JsError> {
        self.core.seek_to_marker(&id).map_err(js_err)
    }

    /// Accepts SRT/WebVTT text or an array of `{ id, startTime, endTime, text }`.
    #[wasm_bindgen(js_name = setCaptions)]
    pub fn set_captions(&self, captions: JsValue) -> Result<(), JsError> {
        let source: CaptionSource = match captions.as_string() {
            Some(text) => CaptionSource::Text(text),
            None => swb::from_value(captions)
                .map_err(|e| JsError::new(&format!("captions error: {e}")))?,
        };
        self.core.set_captions(source).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setInputProps)]
    pub fn set_input_props(&self, props: JsValue) -> Result<(), JsError> {
        let props: InputProps =
            swb::from_value(props).map_err(|e| JsError::new(&format!("props error: {e}")))?;
        self.core.set_input_props(props).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setAudioVolume)]
    pub fn set_audio_volume(&self, volume: f64) {
        self.core.set_audio_volume(volume);
    }

    #[wasm_bindgen(js_name = setAudioMuted)]
    pub fn set_audio_muted(&self, muted: bool) {
        self.core.set_audio_muted(muted);
    }

    #[wasm_bindgen(js_name = setAudioTrackVolume)]
    pub fn set_audio_track_volume(&self, track_id: String, volume: f64) {
        self.core.set_audio_track_volume(&track_id, volume);
    }

    #[wasm_bindgen(js_name = setAudioTrackMuted)]
    pub fn set_audio_track_muted(&self, track_id: String, muted: bool) {
        self.core.set_audio_track_muted(&track_id, muted);
    }

    /// `tracks` is an array of `{ id, startTime?, duration? }`.
    #[wasm_bindgen(js_name = setAvailableAudioTracks)]
    pub fn set_available_audio_tracks(&self, tracks: JsValue) -> Result<(), JsError> {
        let tracks: Vec<AudioTrackMeta> =
            swb::from_value(tracks).map_err(|e| JsError::new(&format!("tracks error: {e}")))?;
        self.core.set_available_audio_tracks(tracks);
        Ok(())
    }

    /// `listener(state)` is called immediately and after every change.
    /// Returns an id for `unsubscribe`.
    #[wasm_bindgen]
    pub fn subscribe(&self, listener: Function) -> u32 {
        let id = self.core.subscribe(move |state: &EngineState| {
            let Ok(value) = to_js(state) else {
                return;
            };
            if let Err(e) = listener.call1(&JsValue::UNDEFINED, &value) {
                log::warn!("subscriber threw: {e:?}");
            }
        });
        id.0
    }

    #[wasm_bindgen]
    pub fn unsubscribe(&self, id: u32) -> bool {
        self.core.unsubscribe(SubscriptionId(id))
    }

    /// Follow a host timeline. `clock()` returns milliseconds (or null) and is
    /// polled on every `tick`. `setVirtualTime` overrides it synchronously.
    #[wasm_bindgen(js_name = bindToDocumentTimeline)]
    pub fn bind_to_document_timeline(&self, clock: Function) {
        let binding = TimelineBinding::new(
            std::rc::Rc::new(JsClock { f: clock }),
            Box::new(self.poller.clone()),
        )
        .with_virtual_time(self.virtual_time.clone());
        self.core.bind_to_document_timeline(binding);
    }

    /// Like `bindToDocumentTimeline` but with no host clock: time only moves via
    /// `setVirtualTime`. Intended for frame-exact capture.
    #[wasm_bindgen(js_name = bindToVirtualTime)]
    pub fn bind_to_virtual_time(&self) {
        let binding = TimelineBinding::new(
            std::rc::Rc::new(ManualClock::new()),
            Box::new(self.poller.clone()),
        )
        .with_virtual_time(self.virtual_time.clone());
        self.core.bind_to_document_timeline(binding);
    }

    #[wasm_bindgen(js_name = unbindFromDocumentTimeline)]
    pub fn unbind_from_document_timeline(&self) {
        self.core.unbind_from_document_timeline();
    }

    #[wasm_bindgen(js_name = setVirtualTime)]
    pub fn set_virtual_time(&self, time_ms: Option<f64>) {
        self.virtual_time.set(time_ms);
    }

    #[wasm_bindgen(js_name = isVirtualTimeBound)]
    pub fn is_virtual_time_bound(&self) -> bool {
        self.core.is_virtual_time_bound()
    }

    #[wasm_bindgen(js_name = bindTo)]
    pub fn bind_to(&self, master: &Frameline) {
        self.core.bind_to(&master.core);
    }

    #[wasm_bindgen]
    pub fn unbind(&self) {
        self.core.unbind();
    }

    /// `check()` may return a Promise; `waitUntilStable` awaits it on every call.
    #[wasm_bindgen(js_name = registerStabilityCheck)]
    pub fn register_stability_check(&self, check: Function) -> u32 {
        let id = self
            .core
            .register_stability_check(move || settle(check.call0(&JsValue::UNDEFINED)));
        id.0
    }

    #[wasm_bindgen(js_name = unregisterStabilityCheck)]
    pub fn unregister_stability_check(&self, id: u32) -> bool {
        self.core.unregister_stability_check(StabilityCheckId(id))
    }

    /// Promise resolving once the driver and all stability checks settle.
    #[wasm_bindgen(js_name = waitUntilStable)]
    pub fn wait_until_stable(&self) -> Promise {
        let fut = self.core.wait_until_stable();
        future_to_promise(async move {
            fut.await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from(js_err(e)))
        })
    }

    #[wasm_bindgen]
    pub fn dispose(&self) {
        self.core.dispose();
    }
}

/// Build a diagnostic report from host-gathered capability flags.
#[wasm_bindgen]
pub fn diagnose(probe: JsValue) -> Result<JsValue, JsError> {
    let host: ProbedHost = if jsvalue_is_undefined_or_null(&probe) {
        ProbedHost::default()
    } else {
        swb::from_value(probe).map_err(|e| JsError::new(&format!("probe error: {e}")))?
    };
    to_js(&Engine::diagnose(&host))
}

#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
