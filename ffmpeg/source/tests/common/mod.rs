//! Media synthesized at test time.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const WAV_SAMPLE_RATE: u32 = 8000;
pub const WAV_SAMPLES: usize = 8000;
pub const WAV_TITLE: &str = "Test Tone";

pub const Y4M_WIDTH: usize = 16;
pub const Y4M_HEIGHT: usize = 16;
pub const Y4M_FRAMES: usize = 5;

/**
    One second of mono 32-bit PCM at 8 kHz, tagged with an INFO/INAM title.
*/
pub fn wav_bytes() -> Vec<u8> {
    wav_bytes_with(WAV_SAMPLES)
}

/**
    Like [`wav_bytes`] with `samples` samples of audio.
*/
pub fn wav_bytes_with(samples: usize) -> Vec<u8> {
    let channels: u16 = 1;
    let bits: u16 = 32;
    let block_align = channels * bits / 8;
    let byte_rate = WAV_SAMPLE_RATE * u32::from(block_align);

    let mut title = WAV_TITLE.as_bytes().to_vec();
    title.push(0);
    if title.len() % 2 == 1 {
        title.push(0);
    }

    let mut info = Vec::new();
    info.extend_from_slice(b"INFO");
    info.extend_from_slice(b"INAM");
    info.extend_from_slice(&(title.len() as u32).to_le_bytes());
    info.extend_from_slice(&title);

    let mut data = Vec::with_capacity(samples * 4);
    for i in 0..samples {
        // Square wave, 100 Hz
        let sample: i32 = if (i / 40) % 2 == 0 { 1 << 28 } else { -(1 << 28) };
        data.extend_from_slice(&sample.to_le_bytes());
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"WAVE");

    body.extend_from_slice(b"fmt ");
    body.extend_from_slice(&16u32.to_le_bytes());
    body.extend_from_slice(&1u16.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes());
    body.extend_from_slice(&byte_rate.to_le_bytes());
    body.extend_from_slice(&block_align.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());

    body.extend_from_slice(b"LIST");
    body.extend_from_slice(&(info.len() as u32).to_le_bytes());
    body.extend_from_slice(&info);

    body.extend_from_slice(b"data");
    body.extend_from_slice(&(data.len() as u32).to_le_bytes());
    body.extend_from_slice(&data);

    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(body.len() as u32).to_le_bytes());
    wav.extend_from_slice(&body);
    wav
}

/**
    Five 16x16 YUV 4:2:0 frames at 25 fps.
*/
pub fn y4m_bytes() -> Vec<u8> {
    let luma = Y4M_WIDTH * Y4M_HEIGHT;
    let chroma = (Y4M_WIDTH / 2) * (Y4M_HEIGHT / 2);

    let mut y4m = format!(
        "YUV4MPEG2 W{Y4M_WIDTH} H{Y4M_HEIGHT} F25:1 Ip A1:1 C420jpeg\n"
    )
    .into_bytes();

    for frame in 0..Y4M_FRAMES {
        y4m.extend_from_slice(b"FRAME\n");
        y4m.extend(std::iter::repeat_n(16 + frame as u8 * 40, luma));
        y4m.extend(std::iter::repeat_n(128u8, chroma * 2));
    }
    y4m
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}
