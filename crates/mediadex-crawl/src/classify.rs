//! Content classification by magic bytes.
//!
//! Detection looks only at the leading bytes of a file, never at its
//! extension. The caller supplies the header; [`read_header`] is the only
//! function here that touches the file system.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Wav,
    Ogg,
    M4a,
    Aac,
    Aiff,
    Amr,
    Midi,
    Dsf,
    Ape,
    WavPack,
}

/// Detect the audio format from the first bytes of a file.
///
/// | Format  | Signature                                        |
/// |---------|--------------------------------------------------|
/// | MP3     | `ID3`, or a valid MPEG frame header (layer II/III) |
/// | AAC     | ADTS frame header (`0xFFF`, layer bits `00`)     |
/// | FLAC    | `fLaC`                                           |
/// | WAV     | `RIFF` .. `WAVE`                                 |
/// | AIFF    | `FORM` .. `AIFF` / `AIFC`                        |
/// | OGG     | `OggS`                                           |
/// | M4A     | `ftyp` at offset 4, brand `M4A ` / `M4B `        |
/// | AMR     | `#!AMR`                                          |
/// | MIDI    | `MThd`                                           |
/// | DSF     | `DSD `                                           |
/// | APE     | `MAC `                                           |
/// | WavPack | `wvpk`                                           |
pub fn detect_format(header: &[u8]) -> Option<AudioFormat> {
    if header.starts_with(b"ID3") {
        return Some(AudioFormat::Mp3);
    }
    if let Some(format) = frame_sync(header) {
        return Some(format);
    }
    if header.starts_with(b"fLaC") {
        return Some(AudioFormat::Flac);
    }
    if header.starts_with(b"OggS") {
        return Some(AudioFormat::Ogg);
    }
    if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WAVE" {
        return Some(AudioFormat::Wav);
    }
    if header.len() >= 12 && header.starts_with(b"FORM") && matches!(&header[8..12], b"AIFF" | b"AIFC") {
        return Some(AudioFormat::Aiff);
    }
    if header.len() >= 12 && &header[4..8] == b"ftyp" && matches!(&header[8..12], b"M4A " | b"M4B ") {
        return Some(AudioFormat::M4a);
    }
    if header.starts_with(b"#!AMR") {
        return Some(AudioFormat::Amr);
    }
    if header.starts_with(b"MThd") {
        return Some(AudioFormat::Midi);
    }
    if header.starts_with(b"DSD ") {
        return Some(AudioFormat::Dsf);
    }
    if header.starts_with(b"MAC ") {
        return Some(AudioFormat::Ape);
    }
    if header.starts_with(b"wvpk") {
        return Some(AudioFormat::WavPack);
    }
    None
}

/// Headerless MPEG audio or ADTS, recognised by a plausible first frame.
///
/// The sync word alone is not enough: `FF FE` is the UTF-16LE byte-order
/// mark, and runs of `0xFF` show up as padding in all kinds of files.
fn frame_sync(header: &[u8]) -> Option<AudioFormat> {
    let [0xFF, b1, b2, ..] = *header else { return None };
    if b1 & 0xE0 != 0xE0 {
        return None;
    }
    let version = (b1 >> 3) & 0b11;
    let layer = (b1 >> 1) & 0b11;
    if b1 & 0xF0 == 0xF0 && layer == 0b00 {
        // ADTS: sampling frequency indices 13..=15 are reserved.
        return ((b2 >> 2) & 0x0F < 13).then_some(AudioFormat::Aac);
    }
    // MPEG audio: version 01 is reserved, layer 00 is reserved and layer 11
    // (Layer I, `FF FE`/`FF FF`) is left out entirely.
    if version == 0b01 || layer == 0b00 || layer == 0b11 {
        return None;
    }
    let bitrate = b2 >> 4;
    let sample_rate = (b2 >> 2) & 0b11;
    (bitrate != 0b1111 && sample_rate != 0b11).then_some(AudioFormat::Mp3)
}

pub fn is_audio(header: &[u8]) -> bool {
    detect_format(header).is_some()
}

/// Reads exactly `len` leading bytes of `path`.
///
/// Files shorter than `len` fail with `UnexpectedEof`; the crawler treats
/// any error here as "not audio".
pub fn read_header(path: &Path, len: usize) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut header = vec![0u8; len];
    file.read_exact(&mut header)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(prefix: &[u8]) -> Vec<u8> {
        let mut v = prefix.to_vec();
        v.resize(261, 0);
        v
    }

    #[test]
    fn id3_and_frame_sync_are_mp3() {
        assert_eq!(detect_format(&padded(b"ID3\x03")), Some(AudioFormat::Mp3));
        assert_eq!(detect_format(&padded(&[0xFF, 0xFB, 0x90])), Some(AudioFormat::Mp3));
        assert_eq!(detect_format(&padded(&[0xFF, 0xF3, 0x64])), Some(AudioFormat::Mp3));
        assert_eq!(detect_format(&padded(&[0xFF, 0xE3, 0x18])), Some(AudioFormat::Mp3));
    }

    #[test]
    fn adts_is_aac_not_mp3() {
        assert_eq!(detect_format(&padded(&[0xFF, 0xF1, 0x50])), Some(AudioFormat::Aac));
        assert_eq!(detect_format(&padded(&[0xFF, 0xF9])), Some(AudioFormat::Aac));
    }

    #[test]
    fn container_signatures() {
        assert_eq!(detect_format(&padded(b"fLaC")), Some(AudioFormat::Flac));
        assert_eq!(detect_format(&padded(b"OggS")), Some(AudioFormat::Ogg));
        assert_eq!(detect_format(&padded(b"RIFF\x24\x08\x00\x00WAVEfmt ")), Some(AudioFormat::Wav));
        assert_eq!(detect_format(&padded(b"FORM\x00\x00\x00\x00AIFF")), Some(AudioFormat::Aiff));
        assert_eq!(detect_format(&padded(b"\x00\x00\x00\x20ftypM4A ")), Some(AudioFormat::M4a));
        assert_eq!(detect_format(&padded(b"#!AMR\n")), Some(AudioFormat::Amr));
        assert_eq!(detect_format(&padded(b"MThd")), Some(AudioFormat::Midi));
    }

    #[test]
    fn utf16_text_and_ff_padding_are_not_audio() {
        let mut text = vec![0xFF, 0xFE];
        for ch in "artist,album,title\r\n".encode_utf16() {
            text.extend_from_slice(&ch.to_le_bytes());
        }
        assert_eq!(detect_format(&padded(&text)), None);
        assert_eq!(detect_format(&[0xFF; 261]), None);
    }

    #[test]
    fn invalid_frame_fields_are_rejected() {
        // bitrate index 1111
        assert!(!is_audio(&padded(&[0xFF, 0xFB, 0xF0])));
        // sample rate index 11
        assert!(!is_audio(&padded(&[0xFF, 0xFB, 0x9C])));
        // reserved MPEG version 01
        assert!(!is_audio(&padded(&[0xFF, 0xEB, 0x90])));
        // ADTS reserved sampling frequency index 15
        assert!(!is_audio(&padded(&[0xFF, 0xF1, 0x3C])));
    }

    #[test]
    fn riff_without_wave_is_not_audio() {
        // AVI shares the RIFF container.
        assert!(!is_audio(&padded(b"RIFF\x00\x00\x00\x00AVI LIST")));
    }

    #[test]
    fn video_mp4_brand_is_not_audio() {
        assert!(!is_audio(&padded(b"\x00\x00\x00\x20ftypisom")));
    }

    #[test]
    fn text_and_empty_are_not_audio() {
        assert!(!is_audio(&padded(b"hello world")));
        assert!(!is_audio(&[]));
        assert!(!is_audio(&[0xFF]));
    }

    #[test]
    fn short_file_header_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.mp3");
        std::fs::write(&path, b"ID3").unwrap();
        let err = read_header(&path, 261).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn header_read_returns_exact_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.flac");
        std::fs::write(&path, padded(b"fLaC").repeat(2)).unwrap();
        let header = read_header(&path, 261).unwrap();
        assert_eq!(header.len(), 261);
        assert!(is_audio(&header));
    }
}
