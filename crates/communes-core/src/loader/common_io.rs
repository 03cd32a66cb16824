// crates/communes-core/src/loader/common_io.rs
use crate::config::SourceEncoding;
use crate::error::{CommuneError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Opens a file, buffers it, and wraps it in a Gzip decoder when the name
/// ends in `.gz`.
pub fn open_stream(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        CommuneError::NotFound(format!("source not found at {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);

    if !is_gzip(path) {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "compact")]
    {
        Ok(Box::new(GzDecoder::new(reader)))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(CommuneError::InvalidData(format!(
            "{} is gzip-compressed but 'compact' is disabled",
            path.display()
        )))
    }
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut reader = open_stream(path)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Reads a whole file as text, decoding it with `encoding`.
pub fn read_text(path: &Path, encoding: SourceEncoding) -> Result<String> {
    let bytes = read_bytes(path)?;
    decode(bytes, encoding).map_err(|e| {
        CommuneError::InvalidData(format!("{}: {}", path.display(), e))
    })
}

pub(crate) fn decode(bytes: Vec<u8>, encoding: SourceEncoding) -> std::result::Result<String, String> {
    let text = match encoding {
        SourceEncoding::Utf8 => {
            String::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?
        }
        SourceEncoding::Windows1252 => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
        // Try UTF-8 first; on failure, recover the buffer from the error
        SourceEncoding::Auto => match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                let bytes = e.into_bytes();
                let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
                decoded.into_owned()
            }
        },
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
