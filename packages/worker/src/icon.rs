//! Package icon validation.

/// Largest accepted icon file.
pub const MAX_ICON_SIZE: usize = 6 * 1024 * 1024;

/// Required icon dimensions.
pub const ICON_DIMENSIONS: (u32, u32) = (256, 256);

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Validate that the bytes are a PNG of exactly the required dimensions.
///
/// Only the signature and IHDR header are inspected; decoding the full
/// image is the client's problem.
pub fn validate_icon(data: &[u8]) -> Result<(), String> {
    if data.len() > MAX_ICON_SIZE {
        return Err(format!(
            "Icon file exceeds the maximum size of {} bytes",
            MAX_ICON_SIZE
        ));
    }

    // Signature, then the IHDR chunk: 4 length bytes, "IHDR", width, height.
    if data.len() < 24 || data[..8] != PNG_SIGNATURE || &data[12..16] != b"IHDR" {
        return Err("Icon must be a PNG image".into());
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    if (width, height) != ICON_DIMENSIONS {
        let (w, h) = ICON_DIMENSIONS;
        return Err(format!("Icon must be exactly {w}x{h} pixels"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data
    }

    #[test]
    fn accepts_256x256_png() {
        assert!(validate_icon(&png_header(256, 256)).is_ok());
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let err = validate_icon(&png_header(128, 256)).unwrap_err();
        assert!(err.contains("256x256"));
    }

    #[test]
    fn rejects_non_png() {
        let err = validate_icon(b"GIF89a not a png, tragically").unwrap_err();
        assert!(err.contains("PNG"));
    }

    #[test]
    fn rejects_truncated_header() {
        let err = validate_icon(&PNG_SIGNATURE).unwrap_err();
        assert!(err.contains("PNG"));
    }

    #[test]
    fn rejects_oversized_file() {
        let mut data = png_header(256, 256);
        data.resize(MAX_ICON_SIZE + 1, 0);
        let err = validate_icon(&data).unwrap_err();
        assert!(err.contains("maximum size"));
    }
}
