use crate::core::settings::Settings;
use crate::daemon::{load_routes, RouteSet};
use crate::routes::PlanMode;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanOutput {
    sources: Vec<SourcePlan>,
    queries_per_tick: usize,
    elements_per_tick: usize,
    ticks_per_window: u64,
}

#[derive(Serialize)]
struct SourcePlan {
    name: String,
    mode: PlanMode,
    locations: usize,
    queries: Vec<PlannedQuery>,
}

#[derive(Serialize)]
struct PlannedQuery {
    origin: String,
    destinations: Vec<String>,
}

pub fn run(config: Option<&Path>, json: bool) -> Result<()> {
    let settings = Settings::load(config)?;
    settings.validate().context("Invalid configuration")?;

    let routes = load_routes(&settings)?;
    let output = build_plan(&settings, &routes);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text_output(&output);
    }

    Ok(())
}

fn build_plan(settings: &Settings, routes: &[RouteSet]) -> PlanOutput {
    let sources: Vec<SourcePlan> = routes
        .iter()
        .map(|route| SourcePlan {
            name: route.name.clone(),
            mode: route.planner.mode(),
            locations: route.locations.len(),
            queries: route
                .plan()
                .map(|q| PlannedQuery {
                    origin: q.origin.label.clone(),
                    destinations: q.destinations.iter().map(|d| d.label.clone()).collect(),
                })
                .collect(),
        })
        .collect();

    let queries_per_tick = sources.iter().map(|s| s.queries.len()).sum();
    let elements_per_tick = sources
        .iter()
        .flat_map(|s| &s.queries)
        .map(|q| q.destinations.len())
        .sum();

    let window = settings.run_duration().as_secs();
    let interval = settings.poll_interval().as_secs().max(1);

    PlanOutput {
        sources,
        queries_per_tick,
        elements_per_tick,
        ticks_per_window: window.div_ceil(interval),
    }
}

fn print_text_output(output: &PlanOutput) {
    for (i, source) in output.sources.iter().enumerate() {
        if i > 0 {
            println!();
        }

        println!(
            "{} ({:?}, {} locations, {} queries)",
            source.name,
            source.mode,
            source.locations,
            source.queries.len()
        );

        for query in &source.queries {
            println!("  {} -> {}", query.origin, query.destinations.join(", "));
        }
    }

    println!();
    println!(
        "Per tick: {} queries, {} elements. Ticks per window: {}",
        output.queries_per_tick, output.elements_per_tick, output.ticks_per_window
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Location;
    use crate::core::store::LogStore;
    use crate::routes::Planner;
    use std::path::PathBuf;

    #[test]
    fn test_build_plan_counts() {
        let routes = vec![RouteSet {
            name: "zips".to_string(),
            locations: vec![
                Location::new("A", 1.0, 1.0),
                Location::new("B", 2.0, 2.0),
                Location::new("C", 3.0, 3.0),
            ],
            planner: Planner::new(PlanMode::AllPairs, 10),
            store: LogStore::new(PathBuf::from("data/zips")),
        }];

        let output = build_plan(&Settings::default(), &routes);

        assert_eq!(output.queries_per_tick, 3);
        assert_eq!(output.elements_per_tick, 6);
        assert_eq!(output.ticks_per_window, 24);
        assert_eq!(output.sources[0].queries[0].origin, "A");
        assert_eq!(output.sources[0].queries[0].destinations, vec!["B", "C"]);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["sources"][0]["mode"], "all_pairs");
    }
}
