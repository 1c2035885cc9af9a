use shared::Coordinate;
use thiserror::Error;

// Encoded polylines store coordinates at 1e-5 degree precision as
// zigzag varints over the printable ASCII range starting at '?'.
const PRECISION: f64 = 1e5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolylineError {
    #[error("polyline ends mid-value at byte {0}")]
    Truncated(usize),
    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("polyline value starting at byte {0} overflows")]
    Overflow(usize),
}

/// Decode an encoded polyline into an ordered coordinate path.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut path = Vec::new();
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;
    let mut offset = 0;

    while offset < bytes.len() {
        let (dlat, next) = decode_value(bytes, offset)?;
        let (dlon, next) = decode_value(bytes, next)?;
        lat += dlat;
        lon += dlon;
        path.push(Coordinate {
            lat: lat as f64 / PRECISION,
            lon: lon as f64 / PRECISION,
        });
        offset = next;
    }

    Ok(path)
}

fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;
    let mut offset = start;

    loop {
        let byte = *bytes
            .get(offset)
            .ok_or(PolylineError::Truncated(start))?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte { byte, offset });
        }
        // Coordinates fit well within i64; an unterminated run of
        // continuation chunks is corrupt input, not a long value.
        if shift > 58 {
            return Err(PolylineError::Overflow(start));
        }
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        offset += 1;
        if chunk < 0x20 {
            break;
        }
        shift += 5;
    }

    // Zigzag: lowest bit is the sign.
    let value = if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    };
    Ok((value, offset))
}

/// Encode a coordinate path. Used to build routing fixtures in tests and
/// kept alongside `decode` so the codec round-trips in one place.
pub fn encode(path: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lon: i64 = 0;

    for point in path {
        let lat = (point.lat * PRECISION).round() as i64;
        let lon = (point.lon * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference example from the polyline format documentation.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn decodes_reference_polyline() {
        let path = decode(REFERENCE).unwrap();
        assert_eq!(path.len(), 3);
        assert!((path[0].lat - 38.5).abs() < 1e-9);
        assert!((path[0].lon - -120.2).abs() < 1e-9);
        assert!((path[1].lat - 40.7).abs() < 1e-9);
        assert!((path[1].lon - -120.95).abs() < 1e-9);
        assert!((path[2].lat - 43.252).abs() < 1e-9);
        assert!((path[2].lon - -126.453).abs() < 1e-9);
    }

    #[test]
    fn encodes_reference_path() {
        let path = vec![
            Coordinate::new(38.5, -120.2),
            Coordinate::new(40.7, -120.95),
            Coordinate::new(43.252, -126.453),
        ];
        assert_eq!(encode(&path), REFERENCE);
    }

    #[test]
    fn empty_string_decodes_to_empty_path() {
        assert_eq!(decode("").unwrap(), Vec::new());
    }

    #[test]
    fn round_trips_a_generated_path() {
        let path: Vec<Coordinate> = (0..9)
            .map(|i| Coordinate::new(45.0 + f64::from(i) * 0.01, 5.0 - f64::from(i) * 0.02))
            .collect();
        let decoded = decode(&encode(&path)).unwrap();
        assert_eq!(decoded.len(), path.len());
        for (a, b) in path.iter().zip(&decoded) {
            assert!((a.lat - b.lat).abs() < 1e-5);
            assert!((a.lon - b.lon).abs() < 1e-5);
        }
    }

    #[test]
    fn truncated_value_is_an_error() {
        // '_' opens a multi-chunk value that never terminates.
        assert_eq!(decode("_"), Err(PolylineError::Truncated(0)));
    }

    #[test]
    fn unbounded_continuation_run_is_an_error() {
        // 14 continuation chunks never fit a coordinate delta.
        let corrupt = "_".repeat(14);
        assert_eq!(decode(&corrupt), Err(PolylineError::Overflow(0)));
    }

    #[test]
    fn out_of_range_byte_is_an_error() {
        let err = decode("\u{1}").unwrap_err();
        assert!(matches!(err, PolylineError::InvalidByte { offset: 0, .. }));
    }

    #[test]
    fn negative_deltas_round_trip() {
        let path = vec![
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(-33.8700, 151.2000),
        ];
        let decoded = decode(&encode(&path)).unwrap();
        assert!((decoded[1].lat - -33.87).abs() < 1e-5);
        assert!((decoded[1].lon - 151.2).abs() < 1e-5);
    }
}
