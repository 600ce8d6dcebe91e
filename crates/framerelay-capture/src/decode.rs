use std::sync::Once;

use ffmpeg_next as ffmpeg;

use ffmpeg::util::error::EAGAIN;
use ffmpeg::{codec, decoder, format, frame, media};
use framerelay_core::{CaptureError, FramebufferSink, TargetGeometry};
use tracing::{debug, info};

use crate::runner::{CaptureRunner, RunContext, RunStats};
use crate::scaler::{target_pixel, ScalerCache, StreamDescriptor};

static FFMPEG_INIT: Once = Once::new();

/// Register codecs/formats and enable network protocols, once per process.
fn ensure_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg::init() {
            // Leave the failure to surface on open, where it maps to the
            // run's error taxonomy.
            debug!("ffmpeg init failed: {e}");
        }
        format::network::init();
    });
}

// MARK: - FfmpegRunner

/// Production capture worker: demux → decode → rescale → publish.
pub struct FfmpegRunner;

impl CaptureRunner for FfmpegRunner {
    fn run(&self, ctx: RunContext) -> Result<RunStats, CaptureError> {
        // Precondition: the output geometry must be valid before any
        // decoder resource is touched. Depth is already restricted to
        // 24/32 by the type.
        ctx.target.validate()?;
        ensure_ffmpeg();

        // All ffmpeg handles created below (input context, decoder, frames)
        // are released by ownership on every exit path of this function.
        let mut ictx = open_input(&ctx)?;
        let (stream_index, mut video) = open_video_decoder(&ictx)?;

        let initial = StreamDescriptor {
            width: video.width(),
            height: video.height(),
            format: video.format(),
        };
        info!(
            source = %ctx.source,
            stream = stream_index,
            format = %initial,
            target = %ctx.target,
            "capture run starting"
        );

        let mut cache = ScalerCache::new(initial, ctx.target)?;

        // Destination-side allocations happen once and are reused for every
        // frame; only the source-side scale context reacts to mid-stream
        // format changes.
        let mut decoded = frame::Video::empty();
        let mut scaled = frame::Video::new(target_pixel(ctx.target.depth), ctx.target.width, ctx.target.height);
        let mut publish_buf = vec![0u8; ctx.target.buffer_len()];

        let mut stats = RunStats::default();

        // Cancellation is checked once per packet: a blocking read or decode
        // in flight when stop() is requested completes first.
        let mut packets = ictx.packets();
        while !ctx.cancel.is_cancelled() {
            let Some((stream, packet)) = packets.next() else {
                break;
            };
            if stream.index() != stream_index {
                continue;
            }

            video
                .send_packet(&packet)
                .map_err(|e| CaptureError::Decode(e.to_string()))?;
            stats.frames_published += drain_frames(
                &mut video,
                &mut decoded,
                &mut scaled,
                &mut cache,
                &mut publish_buf,
                ctx.target,
                ctx.sink.as_ref(),
            )?;
        }
        let end_of_input = !ctx.cancel.is_cancelled();
        drop(packets);

        if end_of_input {
            // Flush pass: drain the frames the decoder buffered internally,
            // with the same per-frame handling as the main loop.
            video
                .send_eof()
                .map_err(|e| CaptureError::Decode(e.to_string()))?;
            stats.frames_published += drain_frames(
                &mut video,
                &mut decoded,
                &mut scaled,
                &mut cache,
                &mut publish_buf,
                ctx.target,
                ctx.sink.as_ref(),
            )?;
            info!(frames = stats.frames_published, "demuxing done");
        } else {
            debug!(frames = stats.frames_published, "capture run cancelled");
        }

        Ok(stats)
    }
}

fn open_input(ctx: &RunContext) -> Result<format::context::Input, CaptureError> {
    let target = ctx.source.demux_target();
    let ictx = format::input(&target).map_err(|e| CaptureError::Open {
        input: ctx.source.to_string(),
        reason: e.to_string(),
    })?;
    if ictx.streams().count() == 0 {
        return Err(CaptureError::StreamInfo("input reports no streams".to_string()));
    }
    Ok(ictx)
}

fn open_video_decoder(
    ictx: &format::context::Input,
) -> Result<(usize, decoder::Video), CaptureError> {
    let stream = ictx
        .streams()
        .best(media::Type::Video)
        .ok_or(CaptureError::NoVideoStream)?;
    let index = stream.index();

    let decoder_ctx = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| CaptureError::Codec(e.to_string()))?;
    let video = decoder_ctx
        .decoder()
        .video()
        .map_err(|e| CaptureError::Codec(e.to_string()))?;

    Ok((index, video))
}

/// Receive every frame the decoder currently has, rescale, and publish.
///
/// One sent packet may yield zero frames (decoder still buffering) or
/// several; receive is repeated until the decoder asks for more input. Any
/// receive error other than "need more input" / end-of-stream is fatal to
/// the run.
#[allow(clippy::too_many_arguments)]
fn drain_frames(
    video: &mut decoder::Video,
    decoded: &mut frame::Video,
    scaled: &mut frame::Video,
    cache: &mut ScalerCache,
    publish_buf: &mut [u8],
    target: TargetGeometry,
    sink: &dyn FramebufferSink,
) -> Result<u64, CaptureError> {
    let mut produced = 0;
    loop {
        match video.receive_frame(decoded) {
            Ok(()) => {
                let scaler = cache.scaler_for(decoded.width(), decoded.height(), decoded.format())?;
                scaler
                    .run(decoded, scaled)
                    .map_err(|e| CaptureError::Scaler(e.to_string()))?;
                pack_frame(scaled, target, publish_buf);
                // Always the full rectangle; no dirty-region tracking.
                sink.publish(publish_buf, 0, 0, target.width, target.height);
                produced += 1;
            }
            Err(ffmpeg::Error::Other { errno: EAGAIN }) | Err(ffmpeg::Error::Eof) => break,
            Err(e) => return Err(CaptureError::Decode(e.to_string())),
        }
    }
    Ok(produced)
}

/// Copy the scaled frame's first plane into the packed publish buffer,
/// honoring the plane's row stride.
fn pack_frame(scaled: &frame::Video, target: TargetGeometry, out: &mut [u8]) {
    let row_len = target.row_len();
    let stride = scaled.stride(0);
    let data = scaled.data(0);

    if stride == row_len {
        out.copy_from_slice(&data[..row_len * target.height as usize]);
    } else {
        for (y, row) in out.chunks_exact_mut(row_len).enumerate() {
            let start = y * stride;
            row.copy_from_slice(&data[start..start + row_len]);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use framerelay_core::{PixelDepth, TargetGeometry};

    use super::*;
    use crate::cancel::CancelToken;
    use crate::test_support::CountingSink;

    fn run_on(source: &str) -> (Result<RunStats, CaptureError>, Arc<CountingSink>) {
        let sink = Arc::new(CountingSink::default());
        let ctx = RunContext {
            source: source.parse().unwrap(),
            target: TargetGeometry::new(64, 48, PixelDepth::Bpp32),
            cancel: CancelToken::new(),
            sink: sink.clone(),
        };
        (FfmpegRunner.run(ctx), sink)
    }

    #[test]
    fn unopenable_source_fails_with_zero_publishes() {
        let (result, sink) = run_on("/nonexistent/never-there.ts");
        assert!(matches!(result, Err(CaptureError::Open { .. })));
        assert_eq!(sink.publishes(), 0);
    }

    #[test]
    fn zero_dimension_target_fails_before_open() {
        let sink = Arc::new(CountingSink::default());
        let ctx = RunContext {
            // Open would fail too — the point is which error comes first.
            source: "/nonexistent/never-there.ts".parse().unwrap(),
            target: TargetGeometry::new(0, 48, PixelDepth::Bpp32),
            cancel: CancelToken::new(),
            sink: sink.clone(),
        };
        let result = FfmpegRunner.run(ctx);
        assert!(matches!(result, Err(CaptureError::InvalidConfig { .. })));
        assert_eq!(sink.publishes(), 0);
    }
}
