use crate::resource::spec::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Avif,
    Svg,
    Mp4, // MP4/MOV/M4A
    Matroska, // MKV/WebM
    TransportStream,
    Mp3,
    Ogg,
    Wav,
    Flac,
    Unknown,
}

impl MediaFormat {
    pub fn is_image(self) -> bool {
        matches!(
            self,
            MediaFormat::Png
                | MediaFormat::Jpeg
                | MediaFormat::Gif
                | MediaFormat::Webp
                | MediaFormat::Bmp
                | MediaFormat::Avif
                | MediaFormat::Svg
        )
    }

    /// Whether a resource declared as `kind` can be played from this format.
    pub fn is_playable_as(self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Image => self.is_image(),
            ResourceKind::Video => matches!(
                self,
                MediaFormat::Mp4 | MediaFormat::Matroska | MediaFormat::TransportStream | MediaFormat::Ogg
            ),
            ResourceKind::Audio => matches!(
                self,
                MediaFormat::Mp3
                    | MediaFormat::Ogg
                    | MediaFormat::Wav
                    | MediaFormat::Flac
                    | MediaFormat::Mp4
                    | MediaFormat::Matroska
            ),
        }
    }
}

/// Detect the media format from leading header bytes.
pub fn detect_format(header: &[u8]) -> MediaFormat {
    if header.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return MediaFormat::Png;
    }
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MediaFormat::Jpeg;
    }
    if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
        return MediaFormat::Gif;
    }

    // RIFF containers: WebP images and WAV audio share the outer chunk.
    if header.len() >= 12 && &header[0..4] == b"RIFF" {
        match &header[8..12] {
            b"WEBP" => return MediaFormat::Webp,
            b"WAVE" => return MediaFormat::Wav,
            _ => return MediaFormat::Unknown,
        }
    }

    // ISO base media: bytes 4..8 == "ftyp", major brand at 8..12
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        return match &header[8..12] {
            b"avif" | b"avis" => MediaFormat::Avif,
            _ => MediaFormat::Mp4,
        };
    }

    // EBML magic bytes at offset 0
    if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return MediaFormat::Matroska;
    }

    // MPEG-TS: sync byte 0x47 at offset 0 and offset 188
    if header.len() > 188 && header[0] == 0x47 && header[188] == 0x47 {
        return MediaFormat::TransportStream;
    }

    if header.starts_with(b"OggS") {
        return MediaFormat::Ogg;
    }
    if header.starts_with(b"fLaC") {
        return MediaFormat::Flac;
    }
    // ID3 tag, or a bare MPEG audio frame sync (11 set bits).
    if header.starts_with(b"ID3") || (header.len() >= 2 && header[0] == 0xFF && header[1] & 0xE0 == 0xE0) {
        return MediaFormat::Mp3;
    }
    if header.starts_with(b"BM") && header.len() >= 14 {
        return MediaFormat::Bmp;
    }

    let text = trim_leading_whitespace(header);
    if text.starts_with(b"<svg") || text.starts_with(b"<?xml") {
        return MediaFormat::Svg;
    }

    MediaFormat::Unknown
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}
