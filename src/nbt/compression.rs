//! Outer compression of tag tree files.
//!
//! World and player files are normally gzip; some tools write zlib or leave
//! the tree uncompressed. The detected scheme is kept so a save writes the
//! file back the way it was found.

use std::fmt;
use std::io::{self, Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Gzip,
    Zlib,
    None,
}

impl Compression {
    /// Detects the scheme from the leading magic bytes
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x1F, 0x8B, ..] => Compression::Gzip,
            [cmf @ 0x78, flg, ..] if ((*cmf as u16) << 8 | *flg as u16) % 31 == 0 => {
                Compression::Zlib
            }
            _ => Compression::None,
        }
    }

    pub fn decompress(self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 4);
        match self {
            Compression::Gzip => {
                GzDecoder::new(bytes).read_to_end(&mut out)?;
            }
            Compression::Zlib => {
                ZlibDecoder::new(bytes).read_to_end(&mut out)?;
            }
            Compression::None => out.extend_from_slice(bytes),
        }
        Ok(out)
    }

    pub fn compress(self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(bytes)?;
                encoder.finish()
            }
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(bytes)?;
                encoder.finish()
            }
            Compression::None => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::Gzip => "gzip",
            Compression::Zlib => "zlib",
            Compression::None => "none",
        })
    }
}
