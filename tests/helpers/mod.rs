//! Test helpers shared by the integration tests
//!
//! Builds small FLAC streams in memory so compressed decoding can be
//! exercised without checked-in fixtures.

/// A FLAC stream split into its header and its frames
///
/// Each frame is self-delimiting, so any prefix of `frames` after the
/// header is itself a playable stream.
pub struct FlacStream {
    pub header: Vec<u8>,
    pub frames: Vec<Vec<u8>>,
    pub block_size: usize,
}

impl FlacStream {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.clone();
        for frame in &self.frames {
            bytes.extend_from_slice(frame);
        }
        bytes
    }
}

/// Encode planar 16-bit samples as FLAC using verbatim subframes
///
/// Every frame holds `block_size` samples except possibly the last.
pub fn flac_stream(channels: &[Vec<i16>], sample_rate: u32, block_size: usize) -> FlacStream {
    assert!((1..=8).contains(&channels.len()));
    assert!((16..=u16::MAX as usize).contains(&block_size));
    assert!(sample_rate > 0 && sample_rate <= u16::MAX as u32);

    let total = channels[0].len();
    assert!(channels.iter().all(|c| c.len() == total));

    let mut header = b"fLaC".to_vec();
    // Last metadata block, type STREAMINFO, 34 bytes
    header.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
    header.extend_from_slice(&(block_size as u16).to_be_bytes());
    header.extend_from_slice(&(block_size as u16).to_be_bytes());
    header.extend_from_slice(&[0; 6]); // frame sizes unknown
    let packed = (sample_rate as u64) << 44
        | ((channels.len() as u64 - 1) << 41)
        | (15_u64 << 36)
        | total as u64;
    header.extend_from_slice(&packed.to_be_bytes());
    header.extend_from_slice(&[0; 16]); // MD5 unset

    let frames = (0..total)
        .step_by(block_size)
        .enumerate()
        .map(|(index, start)| {
            let end = (start + block_size).min(total);
            flac_frame(channels, start..end, index, sample_rate)
        })
        .collect();

    FlacStream {
        header,
        frames,
        block_size,
    }
}

fn flac_frame(
    channels: &[Vec<i16>],
    range: std::ops::Range<usize>,
    index: usize,
    sample_rate: u32,
) -> Vec<u8> {
    assert!(index < 0x800);

    // Fixed-blocksize sync; block size and rate follow as 16-bit fields
    let mut frame = vec![0xFF, 0xF8, 0x7D];
    // Independent channels, 16 bits per sample
    frame.push(((channels.len() as u8 - 1) << 4) | (0b100 << 1));
    if index < 0x80 {
        frame.push(index as u8);
    } else {
        frame.push(0xC0 | (index >> 6) as u8);
        frame.push(0x80 | (index & 0x3F) as u8);
    }
    frame.extend_from_slice(&((range.len() - 1) as u16).to_be_bytes());
    frame.extend_from_slice(&(sample_rate as u16).to_be_bytes());
    frame.push(crc8(&frame));

    for channel in channels {
        // Verbatim subframe, no wasted bits
        frame.push(0x02);
        for sample in &channel[range.clone()] {
            frame.extend_from_slice(&sample.to_be_bytes());
        }
    }

    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
    }
    crc
}

/// A sine at half scale as 16-bit samples
pub fn sine_i16(frequency: f32, frames: usize, sample_rate: u32) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((2.0 * std::f32::consts::PI * frequency * t).sin() * 16384.0) as i16
        })
        .collect()
}
