//! Shared fixtures for unit tests.

use std::path::{Path, PathBuf};

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, no padding.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
const FRAME_LEN: usize = 417;
const FRAME_COUNT: usize = 8;

/// A short, untagged MPEG audio stream made of silent frames.
pub(crate) fn mpeg_bytes() -> Vec<u8> {
    let mut out = Vec::with_capacity(FRAME_LEN * FRAME_COUNT);
    for _ in 0..FRAME_COUNT {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..FRAME_HEADER.len()].copy_from_slice(&FRAME_HEADER);
        out.extend_from_slice(&frame);
    }
    out
}

pub(crate) fn write_mpeg(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, mpeg_bytes()).expect("write mpeg fixture");
    path
}
