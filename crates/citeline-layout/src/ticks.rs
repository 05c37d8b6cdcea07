//! Year ticks for the time axis.

use citeline_core::date::{year_of_millis, year_start_millis};
use citeline_core::HALF_YEAR_MS;
use serde::Serialize;

use crate::mapper::TimeMapper;

/// Years divisible by this are major ticks.
pub const MAJOR_TICK_INTERVAL: i32 = 5;

/// One labeled axis mark at 1 January of `year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub year: i32,
    pub x: f64,
    pub is_major: bool,
}

/// Every year whose 1 January falls within the mapper's domain padded by
/// half a year on both sides, in ascending order.
pub fn generate_ticks(mapper: &TimeMapper) -> Vec<Tick> {
    let domain = mapper.domain();
    let lo = domain.min - HALF_YEAR_MS;
    let hi = domain.max + HALF_YEAR_MS;

    let (first, last) = match (year_of_millis(lo), year_of_millis(hi)) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    (first..=last)
        .filter_map(|year| {
            let ts = year_start_millis(year)?;
            (lo..=hi).contains(&ts).then(|| Tick {
                year,
                x: mapper.map(ts),
                is_major: year.rem_euclid(MAJOR_TICK_INTERVAL) == 0,
            })
        })
        .collect()
}
