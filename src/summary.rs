//! Derivations over a parsed route document.
//!
//! Two independent passes feed the announcement text: a landmark sample
//! (currently raw coordinates, a stand-in until real place-name resolution
//! exists) and a one-line description built from any point addresses the
//! export happens to carry.

use crate::parser::RouteDocument;

/// How many landmarks / addresses a summary samples.
const SAMPLE_LIMIT: usize = 3;

/// The transient per-route summary consumed by the message composer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouteSummary {
    pub description: String,
    pub landmarks: Vec<(f64, f64)>,
}

impl RouteSummary {
    pub fn from_document(doc: &RouteDocument) -> Self {
        Self {
            description: describe_route(doc),
            landmarks: extract_landmarks(doc),
        }
    }

    /// Renders the enrichment line for the announcement: the description,
    /// followed by the sampled coordinates when there are any.
    pub fn render(&self) -> String {
        if self.landmarks.is_empty() {
            return self.description.clone();
        }
        let coords: Vec<String> = self
            .landmarks
            .iter()
            .map(|(lat, lon)| format!("({lat:.5}, {lon:.5})"))
            .collect();
        format!("{} It passes {}.", self.description, coords.join(", "))
    }
}

/// Returns the first [`SAMPLE_LIMIT`] coordinate pairs across every track and
/// segment, in document order.
///
/// TODO: reverse-geocode these into place names once a geocoding provider is
/// wired up; until then callers get raw coordinates.
pub fn extract_landmarks(doc: &RouteDocument) -> Vec<(f64, f64)> {
    doc.tracks
        .iter()
        .flat_map(|track| &track.segments)
        .flat_map(|segment| &segment.points)
        .map(|point| (point.lat, point.lon))
        .take(SAMPLE_LIMIT)
        .collect()
}

/// Builds a one-sentence description from the distinct point addresses in the
/// document, first-seen order, at most [`SAMPLE_LIMIT`] of them.
///
/// Most exports carry no addresses at all; those get the fixed fallback
/// sentence.
pub fn describe_route(doc: &RouteDocument) -> String {
    let mut addresses: Vec<&str> = Vec::new();

    for track in &doc.tracks {
        for segment in &track.segments {
            for point in &segment.points {
                if let Some(address) = point.address.as_deref() {
                    if !address.is_empty() && !addresses.contains(&address) {
                        addresses.push(address);
                    }
                }
            }
        }
    }

    if addresses.is_empty() {
        return "No landmarks found along the route.".to_string();
    }

    addresses.truncate(SAMPLE_LIMIT);
    format!("This route passes through {}...", addresses.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Point, RouteDocument, Segment, Track};

    fn point(lat: f64, lon: f64, address: Option<&str>) -> Point {
        Point {
            lat,
            lon,
            address: address.map(str::to_string),
        }
    }

    fn doc_with_points(points: Vec<Point>) -> RouteDocument {
        RouteDocument {
            tracks: vec![Track {
                segments: vec![Segment { points }],
            }],
        }
    }

    #[test]
    fn test_landmarks_empty_document() {
        assert!(extract_landmarks(&RouteDocument::default()).is_empty());
    }

    #[test]
    fn test_landmarks_fewer_than_limit() {
        let doc = doc_with_points(vec![point(1.0, 2.0, None), point(3.0, 4.0, None)]);
        assert_eq!(extract_landmarks(&doc), vec![(1.0, 2.0), (3.0, 4.0)]);
    }

    #[test]
    fn test_landmarks_truncate_to_three_in_order() {
        let doc = doc_with_points(vec![
            point(1.0, 1.0, None),
            point(2.0, 2.0, None),
            point(3.0, 3.0, None),
            point(4.0, 4.0, None),
        ]);
        assert_eq!(
            extract_landmarks(&doc),
            vec![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]
        );
    }

    #[test]
    fn test_landmarks_cross_segment_and_track_order() {
        let doc = RouteDocument {
            tracks: vec![
                Track {
                    segments: vec![
                        Segment {
                            points: vec![point(1.0, 1.0, None)],
                        },
                        Segment {
                            points: vec![point(2.0, 2.0, None)],
                        },
                    ],
                },
                Track {
                    segments: vec![Segment {
                        points: vec![point(3.0, 3.0, None), point(4.0, 4.0, None)],
                    }],
                },
            ],
        };
        assert_eq!(
            extract_landmarks(&doc),
            vec![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]
        );
    }

    #[test]
    fn test_describe_without_addresses() {
        let doc = doc_with_points(vec![point(1.0, 2.0, None)]);
        assert_eq!(describe_route(&doc), "No landmarks found along the route.");
    }

    #[test]
    fn test_describe_dedupes_and_samples_three() {
        let doc = doc_with_points(vec![
            point(1.0, 1.0, Some("Canal Towpath")),
            point(2.0, 2.0, Some("Canal Towpath")),
            point(3.0, 3.0, Some("Market Street")),
            point(4.0, 4.0, Some("Close Park")),
            point(5.0, 5.0, Some("The Wharf")),
        ]);
        assert_eq!(
            describe_route(&doc),
            "This route passes through Canal Towpath, Market Street, Close Park..."
        );
    }

    #[test]
    fn test_describe_ignores_empty_addresses() {
        let doc = doc_with_points(vec![point(1.0, 1.0, Some("")), point(2.0, 2.0, None)]);
        assert_eq!(describe_route(&doc), "No landmarks found along the route.");
    }

    #[test]
    fn test_render_without_landmarks_is_description_only() {
        let summary = RouteSummary {
            description: "No landmarks found along the route.".to_string(),
            landmarks: vec![],
        };
        assert_eq!(summary.render(), "No landmarks found along the route.");
    }

    #[test]
    fn test_render_appends_coordinates() {
        let summary = RouteSummary {
            description: "No landmarks found along the route.".to_string(),
            landmarks: vec![(53.5612, -2.3251), (53.562, -2.3248)],
        };
        assert_eq!(
            summary.render(),
            "No landmarks found along the route. It passes (53.56120, -2.32510), (53.56200, -2.32480)."
        );
    }
}
