use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use ffmpeg_decode::{AudioFrame, Frame, HwDevice, Stream, VideoDecoderConfig, VideoFrame};
use ffmpeg_source::{Demuxer, DemuxerConfig};
use ffmpeg_types::MediaKind;

#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Path, URL or device, optionally as "-f <format> -i <location>"
    #[arg(allow_hyphen_values = true)]
    pub source: String,

    /// Decode the selected audio and video streams
    #[arg(long)]
    pub decode: bool,

    /// Decode video on a hardware device (platform default when no device is named)
    #[arg(long, value_name = "DEVICE", num_args = 0..=1)]
    pub hw: Option<Option<HwDevice>>,

    /// Stop decoding after this many frames (0 = until end of stream)
    #[arg(long, default_value_t = 0)]
    pub frames: usize,

    /// Container option passed to the input, e.g. -o framerate=30
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[derive(Debug, Default)]
struct StreamCounts {
    packets: usize,
    bytes: usize,
    frames: usize,
    samples: usize,
    hw_frames: usize,
    map_errors: usize,
}

impl ProbeCommand {
    pub fn decoder_config(&self) -> VideoDecoderConfig {
        match self.hw {
            None => VideoDecoderConfig::new(),
            Some(None) => VideoDecoderConfig::with_hw_accel(),
            Some(Some(device)) => VideoDecoderConfig::with_hw_device(device),
        }
    }

    pub fn run(self) -> Result<()> {
        let config = self
            .options
            .iter()
            .fold(DemuxerConfig::new(), |config, (key, value)| {
                config.with_option(key, value)
            })
            .with_video_decoder(self.decoder_config());

        let mut demuxer = Demuxer::with_config(config);
        demuxer
            .load(&self.source)
            .with_context(|| format!("failed to load '{}'", self.source))?;

        print_summary(&demuxer);

        if self.decode {
            decode(&mut demuxer, self.frames)?;
        }
        Ok(())
    }
}

fn print_summary(demuxer: &Demuxer) {
    println!("Input: {}", demuxer.location().unwrap_or_default());
    println!(
        "  duration: {:.3}s, seekable: {}",
        demuxer.duration(),
        if demuxer.seekable() { "yes" } else { "no" }
    );

    let metadata = demuxer.metadata();
    if !metadata.is_empty() {
        println!("  metadata:");
        for (key, value) in &metadata {
            println!("    {key}: {value}");
        }
    }

    for stream in demuxer.streams() {
        let selected = [
            demuxer.video_stream(),
            demuxer.audio_stream(),
            demuxer.subtitle_stream(),
        ]
        .contains(&Some(stream));

        println!(
            "  {} {}",
            if selected { "*" } else { " " },
            describe_stream(stream)
        );
    }
}

fn describe_stream(stream: &Stream) -> String {
    let mut line = format!(
        "#{} {}: {}",
        stream.index(),
        stream.kind(),
        stream.codec_name()
    );

    if let Some(rate) = stream.frame_rate() {
        line.push_str(&format!(", {:.3} fps", rate.to_f64()));
    }
    if stream.bit_rate() > 0 {
        line.push_str(&format!(", {} kb/s", stream.bit_rate() / 1000));
    }
    if stream.duration() > 0.0 {
        line.push_str(&format!(", {:.3}s", stream.duration()));
    }
    match stream.codec() {
        Some(codec) if codec.hw_device() != HwDevice::None => {
            line.push_str(&format!(", decoder: {}", codec.hw_device()));
        }
        Some(_) => {}
        None if stream.kind().is_decodable() => line.push_str(", no decoder"),
        None => {}
    }
    if let Some(language) = stream.metadata().get("language") {
        line.push_str(&format!(" [{language}]"));
    }
    line
}

fn decode(demuxer: &mut Demuxer, max_frames: usize) -> Result<()> {
    let selected: Vec<Stream> = [demuxer.video_stream(), demuxer.audio_stream()]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if selected.is_empty() {
        return Err(anyhow!("no decodable stream selected"));
    }

    let mut counts: BTreeMap<usize, StreamCounts> = selected
        .iter()
        .map(|stream| (stream.index(), StreamCounts::default()))
        .collect();
    let mut total_frames = 0;

    'read: loop {
        let packet = demuxer.read();
        if packet.is_empty() {
            break;
        }
        let Some(count) = packet
            .stream_index()
            .and_then(|index| counts.get_mut(&index))
        else {
            continue;
        };

        count.packets += 1;
        count.bytes += packet.bytes();

        for frame in packet.decode() {
            tally(count, frame);
            total_frames += 1;
            if max_frames > 0 && total_frames >= max_frames {
                break 'read;
            }
        }
    }

    let finished = demuxer.eof();
    if finished {
        for stream in &selected {
            if let Some(count) = counts.get_mut(&stream.index()) {
                for frame in stream.flush() {
                    tally(count, frame);
                }
            }
        }
    }

    println!(
        "Decoded ({}):",
        if finished { "end of stream" } else { "stopped" }
    );
    for stream in &selected {
        let Some(count) = counts.get(&stream.index()) else {
            continue;
        };
        let decoder_state = match stream.codec() {
            Some(codec) if !codec.is_valid() => ", decoder failed",
            _ => "",
        };
        match stream.kind() {
            MediaKind::Audio => println!(
                "  #{} audio: {} packets, {} bytes, {} frames, {} samples{decoder_state}",
                stream.index(),
                count.packets,
                count.bytes,
                count.frames,
                count.samples
            ),
            _ => println!(
                "  #{} video: {} packets, {} bytes, {} frames ({} on device, {} unmappable){decoder_state}",
                stream.index(),
                count.packets,
                count.bytes,
                count.frames,
                count.hw_frames,
                count.map_errors
            ),
        }
    }
    Ok(())
}

fn tally(count: &mut StreamCounts, frame: Frame) {
    count.frames += 1;
    match frame.kind() {
        Some(MediaKind::Audio) => {
            count.samples += AudioFrame::from(frame).samples();
        }
        Some(MediaKind::Video) => {
            let video = VideoFrame::from(frame);
            if video.is_hw_frame() {
                count.hw_frames += 1;
            }
            if let Err(e) = video.map() {
                log::debug!("frame at {:.3}s: {e}", video.pts());
                count.map_errors += 1;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_parsing() {
        assert_eq!(
            parse_key_value("video_size=640x480").unwrap(),
            ("video_size".to_string(), "640x480".to_string())
        );
        assert_eq!(
            parse_key_value("headers=a=b").unwrap(),
            ("headers".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
    }
}
