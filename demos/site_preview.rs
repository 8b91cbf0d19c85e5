//! Site preview demo.
//!
//! Opens the viewer with the fixture rigs and cycles the selection every few
//! seconds: Cam 1, Cam 2, then nothing. Pass an options JSON file as the
//! first argument to override the defaults.
//!
//! Run with: cargo run --example site_preview [options.json]

use std::time::Duration;

use sitecam::*;

fn main() -> Result<()> {
    let options = match std::env::args().nth(1) {
        Some(path) => Options::from_json_file(path)?,
        None => Options::default(),
    };

    let selection = SharedSelection::new();
    let snapshots: Vec<Option<CameraSnapshot>> = fixture_cameras()
        .iter()
        .map(|camera| Some(camera.snapshot()))
        .chain(std::iter::once(None))
        .collect();

    let cycler = selection.clone();
    std::thread::spawn(move || {
        for snapshot in snapshots.iter().cycle() {
            std::thread::sleep(Duration::from_secs(3));
            cycler.set(snapshot.clone().into());
        }
    });

    init(options)?.with_selection(selection).show()
}
