//! Audio setup and the realtime bridge to the TUI

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use saavy_keys::{keyboard_synth, SynthConfig};

use crate::ui::UiApp;

/// Largest block rendered at once. Key events are applied at block
/// boundaries, so this bounds their latency.
const MAX_BLOCK_SIZE: usize = 256;

pub fn run(config: SynthConfig) -> EyreResult<()> {
    // --- Set up CPAL ---
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    // The callback renders f32 directly
    if stream_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(eyre!(
            "default output device uses {:?} samples; only f32 output is supported",
            stream_config.sample_format()
        ));
    }

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    info!(sample_rate, channels, "Audio output ready");

    let config = config.sample_rate(sample_rate);
    let layout = config.pitch_table();
    let (synth, keys, events) =
        keyboard_synth(config).wrap_err("invalid synth configuration")?;

    // Buffer reused by audio callback
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    // Move the synth into the callback; it is the only writer of voice state
    let stream = device.build_output_stream(
        &stream_config.into(),
        {
            let mut synth = synth;
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    let block = &mut render_buf[..frames_to_render];
                    synth.render_block(block);

                    // Duplicate mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames_to_render;
                }
            }
        },
        |err| error!(%err, "Audio stream error"),
        None,
    )?;
    stream.play()?;

    let mut terminal = ratatui::init();
    let result = UiApp::new(keys, events, layout, sample_rate).run(&mut terminal);
    ratatui::restore();

    info!("saavy-keys exiting");
    result
}
