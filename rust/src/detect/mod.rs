// Magic-byte sniffing of downloaded media.

pub mod format;
