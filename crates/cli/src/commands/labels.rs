//! `labels` and `events` command implementations.

use anyhow::{Context, Result};
use contracts::{MocapStrideEvent, StrideLabel};
use tracing::info;

use super::print_json;
use crate::cli::{EventsArgs, LabelsArgs};
use crate::settings::Settings;

/// Execute the `labels` command
pub fn run_labels(settings: &Settings, args: &LabelsArgs) -> Result<()> {
    let labels = match args.test {
        Some(test) => catalog::get_manual_labels_for_test(
            &settings.config,
            &args.subject,
            test,
            settings.data_folder(),
        )
        .with_context(|| {
            format!("Failed to read stride labels of subject '{}' test '{test}'", args.subject)
        })?,
        None => catalog::get_manual_labels(&settings.config, &args.subject, settings.data_folder())
            .with_context(|| format!("Failed to read stride labels of subject '{}'", args.subject))?,
    };
    info!(subject = %args.subject, test = ?args.test, strides = labels.len(), "stride labels read");

    if args.json {
        return print_json(&labels);
    }
    print_labels(&labels);
    Ok(())
}

/// Execute the `events` command
pub fn run_events(settings: &Settings, args: &EventsArgs) -> Result<()> {
    let events = catalog::get_mocap_events(
        &settings.config,
        &args.subject,
        args.test,
        settings.data_folder(),
    )
    .with_context(|| {
        format!("Failed to read mocap events of subject '{}' test '{}'", args.subject, args.test)
    })?;
    info!(subject = %args.subject, test = %args.test, strides = events.len(), "mocap events read");

    if args.json {
        return print_json(&events);
    }
    print_events(&events);
    Ok(())
}

fn print_labels(labels: &[StrideLabel]) {
    println!("{:>6} {:<6} {:>10} {:>10}", "s_id", "foot", "start", "end");
    for label in labels {
        let foot = label.foot.map_or("-", |f| f.as_str());
        println!("{:>6} {:<6} {:>10} {:>10}", label.s_id, foot, label.start, label.end);
    }
}

fn print_events(events: &[MocapStrideEvent]) {
    println!(
        "{:>6} {:<6} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "s_id", "foot", "start", "end", "ic", "tc", "min_vel"
    );
    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    for e in events {
        println!(
            "{:>6} {:<6} {:>8.1} {:>8.1} {:>8} {:>8} {:>8}",
            e.s_id,
            e.foot.as_str(),
            e.start,
            e.end,
            cell(e.ic),
            cell(e.tc),
            cell(e.min_vel)
        );
    }
}
