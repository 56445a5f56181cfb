use crate::core::models::{Location, Query};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BATCH: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Every location against every other location, batched.
    #[default]
    AllPairs,
    /// Ordered road corridor: end to end, then each adjacent hop both ways.
    Corridor,
}

#[derive(Debug, Clone, Copy)]
pub struct Planner {
    mode: PlanMode,
    max_batch: usize,
}

impl Planner {
    pub fn new(mode: PlanMode, max_batch: usize) -> Self {
        Self {
            mode,
            max_batch: max_batch.max(1),
        }
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    pub fn plan<'a>(&self, locations: &'a [Location]) -> Box<dyn Iterator<Item = Query<'a>> + 'a> {
        match self.mode {
            PlanMode::AllPairs => Box::new(AllPairsPlan::new(locations, self.max_batch)),
            PlanMode::Corridor => Box::new(corridor_plan(locations)),
        }
    }
}

/// Lazily walks origins in order. For each origin the full location list is
/// cut into contiguous slices of `max_batch`, and the origin is dropped from
/// the one slice it falls in. Slices are not rebalanced afterwards, so that
/// slice carries one destination fewer.
pub struct AllPairsPlan<'a> {
    locations: &'a [Location],
    max_batch: usize,
    origin: usize,
    offset: usize,
}

impl<'a> AllPairsPlan<'a> {
    pub fn new(locations: &'a [Location], max_batch: usize) -> Self {
        Self {
            locations,
            max_batch: max_batch.max(1),
            origin: 0,
            offset: 0,
        }
    }
}

impl<'a> Iterator for AllPairsPlan<'a> {
    type Item = Query<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let locations = self.locations;
        let total = locations.len();

        while self.origin < total {
            if self.offset >= total {
                self.origin += 1;
                self.offset = 0;
                continue;
            }

            let start = self.offset;
            let end = (start + self.max_batch).min(total);
            self.offset = end;

            let origin = self.origin;
            let destinations: Vec<&'a Location> = (start..end)
                .filter(|&i| i != origin)
                .map(move |i| &locations[i])
                .collect();

            // A slice holding only the origin has nothing to ask for.
            if destinations.is_empty() {
                continue;
            }

            return Some(Query {
                origin: &locations[origin],
                destinations,
            });
        }

        None
    }
}

fn corridor_plan(locations: &[Location]) -> impl Iterator<Item = Query<'_>> {
    let ends = match locations {
        [first, .., last] if locations.len() > 2 => vec![(first, last), (last, first)],
        _ => Vec::new(),
    };
    let forward = locations.windows(2).map(|w| (&w[0], &w[1]));
    // The return sweep ends with the hop back onto the first location.
    let backward = locations.windows(2).rev().map(|w| (&w[1], &w[0]));

    ends.into_iter()
        .chain(forward)
        .chain(backward)
        .map(|(origin, destination)| Query {
            origin,
            destinations: vec![destination],
        })
}
