use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use nikogrid::api::backend::Client;
use nikogrid::feed::{FeedController, FeedStatus};
use nikogrid::notice::Notice;

use crate::cli::{MapSearch, print_details};

const HELP: &str = "\
commands:
  pan <dx> <dy>      drag the map by a pixel offset
  zoom <delta>       zoom in (positive) or out (negative)
  resize <w> <h>     change the viewport size
  click <marker>     click a marker by its id (c-0, l-3, ...)
  goto [query]       center on an address, \"lat, lon\" or the current position
  closest [query]    fly to the closest available station
  details <id>       show a station's chargers
  active on|off      only show stations with available chargers
  markers            list the visible markers
  where              show the current viewport
  quit";

#[derive(Debug, PartialEq)]
pub enum MapCommand {
    Pan(f64, f64),
    Zoom(i16),
    Resize(u32, u32),
    Click(String),
    GoTo(String),
    Closest(String),
    Details(i64),
    Active(bool),
    Markers,
    Where,
    Help,
    Quit,
}

impl MapCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match (word, args.as_slice()) {
            ("pan", [dx, dy]) => MapCommand::Pan(number(dx)?, number(dy)?),
            ("zoom", [delta]) => MapCommand::Zoom(number(delta)?),
            ("resize", [w, h]) => MapCommand::Resize(number(w)?, number(h)?),
            ("click", [marker]) => MapCommand::Click(marker.to_string()),
            ("goto", _) => MapCommand::GoTo(rest.to_string()),
            ("closest", _) => MapCommand::Closest(rest.to_string()),
            ("details", [id]) => MapCommand::Details(number(id)?),
            ("active", ["on"]) => MapCommand::Active(true),
            ("active", ["off"]) => MapCommand::Active(false),
            ("markers", []) => MapCommand::Markers,
            ("where", []) => MapCommand::Where,
            ("help" | "?", _) => MapCommand::Help,
            ("quit" | "exit", _) => MapCommand::Quit,
            _ => return Err(format!("unknown command {line:?}, try help")),
        };

        Ok(command)
    }
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("{raw:?} is not a number"))
}

pub async fn run(
    feed: FeedController<Client>,
    search: MapSearch,
    client: Client,
    notices: &mut UnboundedReceiver<Notice>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut points = feed.subscribe();
    let mut selected = feed.subscribe_selected();
    let mut status = feed.subscribe_status();

    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                match MapCommand::parse(&line) {
                    Ok(MapCommand::Quit) => break,
                    Ok(command) => apply(command, &feed, &search).await,
                    Err(e) => println!("{e}"),
                }
            }
            Ok(()) = points.changed() => {
                points.borrow_and_update();
                print_markers(&feed);
            }
            Ok(()) = selected.changed() => {
                let id = *selected.borrow_and_update();
                if let Some(id) = id {
                    match client.location(id).await {
                        Ok(details) => print_details(&details),
                        Err(e) => {
                            log::warn!("loading details for location {id} failed: {e}");
                            println!("{}", Notice::Error(format!("Unable to load station #{id}")));
                        }
                    }
                }
            }
            Ok(()) = status.changed() => {
                if *status.borrow_and_update() == FeedStatus::Fetching {
                    log::debug!("loading stations");
                }
            }
            Some(notice) = notices.recv() => println!("{notice}"),
        }
    }

    feed.unmount();
    Ok(())
}

async fn apply(command: MapCommand, feed: &FeedController<Client>, search: &MapSearch) {
    let camera = feed.camera();

    match command {
        MapCommand::Pan(dx, dy) => camera.pan_by(dx, dy),
        MapCommand::Zoom(delta) => camera.zoom_by(delta),
        MapCommand::Resize(width, height) => camera.resize(width, height),
        MapCommand::Click(marker) => {
            if feed.click_marker(&marker).is_none() {
                println!("no marker {marker:?} on the map");
            }
        }
        MapCommand::GoTo(query) => {
            search.go_to(&query).await;
        }
        MapCommand::Closest(query) => {
            if let Some(location) = search.find_closest(&query).await {
                feed.highlight(Some(location.id));
                println!("closest station: #{} {}", location.id, location.name);
            }
        }
        MapCommand::Details(id) => feed.select(Some(id)),
        MapCommand::Active(only_active) => feed.set_only_active(only_active),
        MapCommand::Markers => print_markers(feed),
        MapCommand::Where => {
            let state = camera.state();
            println!(
                "center {} zoom {} ({}x{}), bounds {}",
                state.center,
                state.zoom,
                state.width,
                state.height,
                state.bounds()
            );
        }
        MapCommand::Help => println!("{HELP}"),
        MapCommand::Quit => {}
    }
}

fn print_markers(feed: &FeedController<Client>) {
    let markers = feed.markers();
    if markers.is_empty() {
        println!("no stations in view");
        return;
    }

    for marker in markers {
        let label = if marker.label.persistent {
            marker.label.text
        } else {
            format!("({})", marker.label.text)
        };
        println!(
            "{:<6} {:<12} {}  {label}",
            marker.test_id,
            marker.style.color(),
            marker.position
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_map_commands() {
        assert_eq!(MapCommand::parse("pan 10 -25.5"), Ok(MapCommand::Pan(10.0, -25.5)));
        assert_eq!(MapCommand::parse("zoom -2"), Ok(MapCommand::Zoom(-2)));
        assert_eq!(MapCommand::parse("click c-0"), Ok(MapCommand::Click("c-0".into())));
        assert_eq!(MapCommand::parse("active off"), Ok(MapCommand::Active(false)));
        assert_eq!(MapCommand::parse(" markers "), Ok(MapCommand::Markers));
    }

    #[test]
    fn search_commands_keep_free_text() {
        assert_eq!(
            MapCommand::parse("goto Rua de Aveiro, 12"),
            Ok(MapCommand::GoTo("Rua de Aveiro, 12".into()))
        );
        assert_eq!(MapCommand::parse("closest"), Ok(MapCommand::Closest(String::new())));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(MapCommand::parse("pan left").is_err());
        assert!(MapCommand::parse("details").is_err());
        assert!(MapCommand::parse("fly").is_err());
    }
}
