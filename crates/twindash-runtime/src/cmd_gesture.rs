//! `twindash gesture` — replay recorded landmark frames through the
//! gesture classifier, printing one state line per frame.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::Context;
use tracing::warn;

use twindash_core::gesture::Tracker;
use twindash_core::landmark::LandmarkFrame;

/// Entry point for `twindash gesture`.
pub fn cmd_gesture(frames: &str) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = if frames == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(frames).with_context(|| format!("open {frames}"))?;
        Box::new(BufReader::new(file))
    };

    let mut tracker = Tracker::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read {frames}"))?;
        let line = line.trim();
        let frame = if line.is_empty() || line == "null" {
            None
        } else {
            match serde_json::from_str::<LandmarkFrame>(line) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    warn!(line = index + 1, error = %err, "skipping malformed landmark frame");
                    continue;
                }
            }
        };
        let state = tracker.observe(frame.as_ref());
        println!("{}", serde_json::to_string(&state)?);
    }

    Ok(())
}
