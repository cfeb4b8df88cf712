//! Marker model for interest points.
//!
//! Markers carry no identity across fetches: every render builds the full set
//! again from the current interest points.

use crate::api::Coord;
use crate::api::backend::InterestPoint;

/// Zoom levels added when a cluster marker is clicked.
pub const CLUSTER_ZOOM_STEP: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerStyle {
    Cluster,
    Location,
    Highlighted,
    Selected,
}

impl MarkerStyle {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerStyle::Cluster => "fuchsia-700",
            MarkerStyle::Location => "teal-700",
            MarkerStyle::Highlighted => "red-700",
            MarkerStyle::Selected => "sky-700",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    /// Persistent labels are always shown, the rest only on hover or focus.
    pub persistent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickAction {
    ZoomTo { center: Coord, zoom_delta: u8 },
    OpenDetails(i64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub test_id: String,
    pub group: &'static str,
    pub position: Coord,
    pub label: Label,
    pub style: MarkerStyle,
    pub action: ClickAction,
}

impl Marker {
    pub fn for_point(
        index: usize,
        point: &InterestPoint,
        highlighted: Option<i64>,
        selected: Option<i64>,
    ) -> Self {
        match point {
            InterestPoint::Cluster { num_points, .. } => {
                let center = point.coord();
                Marker {
                    test_id: format!("c-{index}"),
                    group: "cluster",
                    position: center,
                    label: Label {
                        text: format!("{num_points} Stations"),
                        persistent: true,
                    },
                    style: MarkerStyle::Cluster,
                    action: ClickAction::ZoomTo {
                        center,
                        zoom_delta: CLUSTER_ZOOM_STEP,
                    },
                }
            }
            InterestPoint::Location { id, name, .. } => {
                let style = if highlighted == Some(*id) {
                    MarkerStyle::Highlighted
                } else if selected == Some(*id) {
                    MarkerStyle::Selected
                } else {
                    MarkerStyle::Location
                };

                Marker {
                    test_id: format!("l-{index}"),
                    group: "location",
                    position: point.coord(),
                    label: Label {
                        text: name.clone(),
                        persistent: false,
                    },
                    style,
                    action: ClickAction::OpenDetails(*id),
                }
            }
        }
    }
}

pub fn render(
    points: &[InterestPoint],
    highlighted: Option<i64>,
    selected: Option<i64>,
) -> Vec<Marker> {
    points
        .iter()
        .enumerate()
        .map(|(i, point)| Marker::for_point(i, point, highlighted, selected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: i64) -> InterestPoint {
        InterestPoint::Location {
            id,
            lat: 40.64,
            lon: -8.65,
            name: format!("Station {id}"),
        }
    }

    #[test]
    fn cluster_marker_zooms_in() {
        let point = InterestPoint::Cluster {
            lat: 10.0,
            lon: 20.0,
            num_points: 42,
        };

        let marker = Marker::for_point(0, &point, None, None);

        assert_eq!(marker.test_id, "c-0");
        assert_eq!(marker.group, "cluster");
        assert_eq!(
            marker.label,
            Label {
                text: "42 Stations".into(),
                persistent: true
            }
        );
        assert_eq!(
            marker.action,
            ClickAction::ZoomTo {
                center: Coord::new(10.0, 20.0),
                zoom_delta: 2
            }
        );
        assert_eq!(marker.style.color(), "fuchsia-700");
    }

    #[test]
    fn location_marker_opens_details() {
        let marker = Marker::for_point(3, &location(9), None, None);

        assert_eq!(marker.test_id, "l-3");
        assert_eq!(marker.group, "location");
        assert!(!marker.label.persistent);
        assert_eq!(marker.label.text, "Station 9");
        assert_eq!(marker.action, ClickAction::OpenDetails(9));
        assert_eq!(marker.style, MarkerStyle::Location);
    }

    #[test]
    fn highlight_wins_over_selection() {
        assert_eq!(
            Marker::for_point(0, &location(9), Some(9), Some(9)).style,
            MarkerStyle::Highlighted
        );
        assert_eq!(
            Marker::for_point(0, &location(9), Some(1), Some(9)).style,
            MarkerStyle::Selected
        );
        assert_eq!(
            Marker::for_point(0, &location(9), Some(1), None).style,
            MarkerStyle::Location
        );
    }

    #[test]
    fn render_indexes_by_position() {
        let points = vec![
            location(1),
            InterestPoint::Cluster {
                lat: 0.0,
                lon: 0.0,
                num_points: 2,
            },
        ];

        let ids: Vec<_> = render(&points, None, None)
            .into_iter()
            .map(|m| m.test_id)
            .collect();

        assert_eq!(ids, vec!["l-0", "c-1"]);
    }
}
