//! GPX parser for Strava route exports.
//!
//! Produces a [`RouteDocument`] holding the track → segment → point tree.
//! Only the pieces the summarizer needs are kept: coordinates and the
//! occasional `address` annotation some exporters attach to a point.

use quick_xml::events::Event;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("route document XML: {0}")]
    Xml(String),
    #[error("track point is missing its '{0}' attribute")]
    MissingAttr(&'static str),
    #[error("track point '{attr}' is not a number: {value:?}")]
    BadNumber { attr: &'static str, value: String },
}

/// A parsed route export: an ordered list of tracks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouteDocument {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Track {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Segment {
    pub points: Vec<Point>,
}

/// A single track point. `address` is non-standard GPX and almost always
/// absent; it is carried for the exporters that do annotate points.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

/// Decodes a GPX route document from raw bytes.
///
/// Track points outside a `<trkseg>` are ignored rather than rejected, the
/// same stance the rest of the pipeline takes toward cosmetic oddities.
///
/// # Errors
///
/// Returns an error if the XML is malformed or a track point carries a
/// missing or non-numeric coordinate.
pub fn parse_route(bytes: &[u8]) -> Result<RouteDocument, ParseError> {
    let mut reader = quick_xml::Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut doc = RouteDocument::default();
    let mut pending_point: Option<Point> = None;
    let mut in_address = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"trk" => doc.tracks.push(Track::default()),
                b"trkseg" => {
                    if let Some(track) = doc.tracks.last_mut() {
                        track.segments.push(Segment::default());
                    }
                }
                b"trkpt" => pending_point = Some(point_from_attrs(e)?),
                b"address" => in_address = pending_point.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    push_point(&mut doc, point_from_attrs(e)?);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(point) = pending_point.take() {
                        push_point(&mut doc, point);
                    }
                }
                b"address" => in_address = false,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_address {
                    if let (Some(point), Ok(text)) = (pending_point.as_mut(), e.unescape()) {
                        let text = text.trim();
                        if !text.is_empty() {
                            point.address = Some(text.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn point_from_attrs(e: &quick_xml::events::BytesStart<'_>) -> Result<Point, ParseError> {
    Ok(Point {
        lat: coord_attr(e, "lat")?,
        lon: coord_attr(e, "lon")?,
        address: None,
    })
}

fn coord_attr(e: &quick_xml::events::BytesStart<'_>, name: &'static str) -> Result<f64, ParseError> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|e| ParseError::Xml(e.to_string()))?
        .ok_or(ParseError::MissingAttr(name))?;
    let value = String::from_utf8_lossy(&attr.value);
    value
        .trim()
        .parse()
        .map_err(|_| ParseError::BadNumber { attr: name, value: value.into_owned() })
}

fn push_point(doc: &mut RouteDocument, point: Point) {
    if let Some(segment) = doc
        .tracks
        .last_mut()
        .and_then(|track| track.segments.last_mut())
    {
        segment.points.push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_route() {
        let gpx = br#"<?xml version="1.0" encoding="UTF-8"?>
            <gpx version="1.1" creator="StravaGPX">
              <trk>
                <name>Canal Loop</name>
                <trkseg>
                  <trkpt lat="53.5612" lon="-2.3251"><ele>70.0</ele></trkpt>
                  <trkpt lat="53.5620" lon="-2.3248"/>
                </trkseg>
              </trk>
            </gpx>"#;

        let doc = parse_route(gpx).unwrap();
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks[0].segments.len(), 1);

        let points = &doc.tracks[0].segments[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].lat, 53.5612);
        assert_eq!(points[0].lon, -2.3251);
        assert_eq!(points[0].address, None);
    }

    #[test]
    fn test_parse_point_address() {
        let gpx = br#"<gpx><trk><trkseg>
            <trkpt lat="53.0" lon="-2.0"><address>Market Street</address></trkpt>
            </trkseg></trk></gpx>"#;

        let doc = parse_route(gpx).unwrap();
        let point = &doc.tracks[0].segments[0].points[0];
        assert_eq!(point.address.as_deref(), Some("Market Street"));
    }

    #[test]
    fn test_parse_empty_document_has_no_tracks() {
        let doc = parse_route(b"<gpx/>").unwrap();
        assert!(doc.tracks.is_empty());
    }

    #[test]
    fn test_parse_multiple_segments_keep_order() {
        let gpx = br#"<gpx><trk>
            <trkseg><trkpt lat="1.0" lon="10.0"/></trkseg>
            <trkseg><trkpt lat="2.0" lon="20.0"/><trkpt lat="3.0" lon="30.0"/></trkseg>
            </trk></gpx>"#;

        let doc = parse_route(gpx).unwrap();
        assert_eq!(doc.tracks[0].segments.len(), 2);
        assert_eq!(doc.tracks[0].segments[0].points.len(), 1);
        assert_eq!(doc.tracks[0].segments[1].points.len(), 2);
        assert_eq!(doc.tracks[0].segments[1].points[1].lat, 3.0);
    }

    #[test]
    fn test_parse_bad_coordinate_is_an_error() {
        let gpx = br#"<gpx><trk><trkseg><trkpt lat="north" lon="-2.0"/></trkseg></trk></gpx>"#;
        let err = parse_route(gpx).unwrap_err();
        assert!(matches!(err, ParseError::BadNumber { attr: "lat", .. }));
    }

    #[test]
    fn test_parse_missing_lon_is_an_error() {
        let gpx = br#"<gpx><trk><trkseg><trkpt lat="53.0"/></trkseg></trk></gpx>"#;
        let err = parse_route(gpx).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttr("lon")));
    }

    #[test]
    fn test_parse_mismatched_tags_are_an_error() {
        let gpx = br#"<gpx><trk><trkseg></trk></gpx>"#;
        let err = parse_route(gpx).unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }
}
