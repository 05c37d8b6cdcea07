//! Timestamp → horizontal coordinate mapping.

use citeline_core::HALF_YEAR_MS;
use serde::Serialize;

/// Inclusive timestamp range (UTC milliseconds) covered by a mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeDomain {
    pub min: i64,
    pub max: i64,
}

impl TimeDomain {
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// Distinct timestamps spread over `[0, width]`.
    Linear,
    /// A single instant, placed at `width / 2`.
    Centered,
}

/// Linear map from a timestamp domain onto `[0, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeMapper {
    domain: TimeDomain,
    width: f64,
    kind: MappingKind,
}

impl TimeMapper {
    /// Fit a mapper to the given timestamps.
    ///
    /// Returns `None` when there is nothing to map. When every timestamp is
    /// the same instant the domain is widened by half a year on each side,
    /// which puts that instant at the center and keeps ticks well-defined.
    pub fn fit<I>(timestamps: I, width: f64) -> Option<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let (min, max) = timestamps
            .into_iter()
            .fold(None, |acc: Option<(i64, i64)>, ts| match acc {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })?;

        let (domain, kind) = if min == max {
            (
                TimeDomain {
                    min: min - HALF_YEAR_MS,
                    max: max + HALF_YEAR_MS,
                },
                MappingKind::Centered,
            )
        } else {
            (TimeDomain { min, max }, MappingKind::Linear)
        };

        Some(Self {
            domain,
            width,
            kind,
        })
    }

    /// Map a timestamp. Values outside the domain extrapolate linearly.
    pub fn map(&self, ts: i64) -> f64 {
        (ts - self.domain.min) as f64 / self.domain.span() as f64 * self.width
    }

    pub fn domain(&self) -> TimeDomain {
        self.domain
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn kind(&self) -> MappingKind {
        self.kind
    }
}
