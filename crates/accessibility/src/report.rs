//! Accessibility report serialization.

use crate::stats::{LevelTotals, ZoneTotals};
use access_common::AccessResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Population reachable within one travel-time level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub minutes: u32,
    pub population: f64,
    /// Fraction of the zone's population, `0` for an unpopulated zone.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub id: String,
    pub population: f64,
    pub levels: Vec<LevelSummary>,
}

/// Accessibility of every zone to one destination layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    pub mode: String,
    pub destination: String,
    pub zones: Vec<ZoneSummary>,
}

impl AccessibilityReport {
    pub fn new(
        mode: impl Into<String>,
        destination: impl Into<String>,
        population: &ZoneTotals,
        stats: &LevelTotals,
    ) -> Self {
        let zones = population
            .iter()
            .map(|(id, &total)| ZoneSummary {
                id: id.clone(),
                population: total,
                levels: stats
                    .iter()
                    .map(|(&minutes, totals)| {
                        let reachable = totals.get(id).copied().unwrap_or(0.0);
                        LevelSummary {
                            minutes,
                            population: reachable,
                            share: if total > 0.0 { reachable / total } else { 0.0 },
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            mode: mode.into(),
            destination: destination.into(),
            zones,
        }
    }

    pub fn zone(&self, id: &str) -> Option<&ZoneSummary> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn to_json(&self) -> AccessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> AccessResult<()> {
        std::fs::write(path, self.to_json()?)?;
        info!(
            path = %path.display(),
            mode = %self.mode,
            destination = %self.destination,
            zones = self.zones.len(),
            "Wrote accessibility report"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> (ZoneTotals, LevelTotals) {
        let population = ZoneTotals::from([("a".to_string(), 200.0), ("b".to_string(), 0.0)]);
        let mut stats = LevelTotals::new();
        stats.insert(30, ZoneTotals::from([("a".to_string(), 50.0), ("b".to_string(), 0.0)]));
        stats.insert(90, ZoneTotals::from([("a".to_string(), 150.0)]));
        (population, stats)
    }

    #[test]
    fn test_shares() {
        let (population, stats) = inputs();
        let report = AccessibilityReport::new("car", "health", &population, &stats);

        let a = report.zone("a").unwrap();
        assert_eq!(a.levels.len(), 2);
        assert_eq!(a.levels[0].minutes, 30);
        assert_eq!(a.levels[0].share, 0.25);
        assert_eq!(a.levels[1].population, 150.0);

        let b = report.zone("b").unwrap();
        assert!(b.levels.iter().all(|l| l.share == 0.0 && l.population == 0.0));
    }

    #[test]
    fn test_written_report_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access_car_health.json");
        let (population, stats) = inputs();
        let report = AccessibilityReport::new("car", "health", &population, &stats);

        report.write(&path).unwrap();
        let back: AccessibilityReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
