// Bounded chart series shared by the power, current and voltage charts
use super::reading::Reading;
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::VecDeque;
use thiserror::Error;

pub const DEFAULT_MAX_POINTS: usize = 50;

/// A live reading this many minutes behind the charts means the meter's clock
/// stepped back (DST fall-back or a resync), not a late duplicate.
const CLOCK_STEP_BACK_MINUTES: i64 = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("chart {chart} has no channel '{channel}'")]
    UnknownChannel { chart: ChartKind, channel: String },
    #[error("chart {chart} is missing a value for channel '{channel}'")]
    MissingChannel {
        chart: ChartKind,
        channel: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    Power,
    Current,
    Voltage,
}

/// A channel drawn on a chart: the reading field it comes from and its legend.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub extract: fn(&Reading) -> f64,
}

const POWER_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec {
        id: "power1",
        label: "Power 1 (W)",
        extract: |r| r.power1,
    },
    ChannelSpec {
        id: "power2",
        label: "Power 2 (W)",
        extract: |r| r.power2,
    },
    ChannelSpec {
        id: "total_power",
        label: "Total Power (W)",
        extract: |r| r.total_power,
    },
];

const CURRENT_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec {
        id: "current1",
        label: "Current 1 (A)",
        extract: |r| r.current1,
    },
    ChannelSpec {
        id: "current2",
        label: "Current 2 (A)",
        extract: |r| r.current2,
    },
    ChannelSpec {
        id: "total_current",
        label: "Total Current (A)",
        extract: |r| r.total_current,
    },
];

const VOLTAGE_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec {
        id: "voltage",
        label: "Voltage (V)",
        extract: |r| r.voltage,
    },
];

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Power, ChartKind::Current, ChartKind::Voltage];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Power => "Power",
            ChartKind::Current => "Current",
            ChartKind::Voltage => "Voltage",
        }
    }

    pub fn channels(&self) -> &'static [ChannelSpec] {
        match self {
            ChartKind::Power => POWER_CHANNELS,
            ChartKind::Current => CURRENT_CHANNELS,
            ChartKind::Voltage => VOLTAGE_CHANNELS,
        }
    }

    /// Channel values of one reading, in channel order.
    fn values_of(&self, reading: &Reading) -> Vec<(&'static str, f64)> {
        self.channels()
            .iter()
            .map(|c| (c.id, (c.extract)(reading)))
            .collect()
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Values of one channel. Index-aligned with the owning group's timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: &'static str,
    pub label: &'static str,
    values: VecDeque<f64>,
}

impl Series {
    fn new(channel: &ChannelSpec) -> Self {
        Self {
            id: channel.id,
            label: channel.label,
            values: VecDeque::new(),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

/// Channels of one chart plus their shared time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGroup {
    kind: ChartKind,
    timestamps: VecDeque<NaiveDateTime>,
    series: Vec<Series>,
}

impl ChartGroup {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            timestamps: VecDeque::new(),
            series: kind.channels().iter().map(Series::new).collect(),
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn channel(&self, id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.id == id)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.timestamps.iter().copied()
    }

    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.back().copied()
    }

    /// Human-readable time axis labels.
    pub fn labels(&self) -> Vec<String> {
        self.timestamps().map(|t| time_label(&t)).collect()
    }

    // Resolve every channel before touching any buffer so a bad call changes nothing.
    fn ordered_values(&self, values: &[(&str, f64)]) -> Result<Vec<f64>, SeriesError> {
        if let Some((unknown, _)) = values
            .iter()
            .find(|(id, _)| self.channel(id).is_none())
        {
            return Err(SeriesError::UnknownChannel {
                chart: self.kind,
                channel: unknown.to_string(),
            });
        }

        self.series
            .iter()
            .map(|s| {
                values
                    .iter()
                    .find(|(id, _)| *id == s.id)
                    .map(|(_, v)| *v)
                    .ok_or(SeriesError::MissingChannel {
                        chart: self.kind,
                        channel: s.id,
                    })
            })
            .collect()
    }

    fn push(&mut self, at: NaiveDateTime, ordered: Vec<f64>, max_points: usize) {
        self.timestamps.push_back(at);
        for (series, value) in self.series.iter_mut().zip(ordered) {
            series.values.push_back(value);
        }
        while self.timestamps.len() > max_points {
            self.timestamps.pop_front();
            for series in &mut self.series {
                series.values.pop_front();
            }
        }
    }

    fn points_after(&self, cutoff: Option<NaiveDateTime>) -> Vec<(NaiveDateTime, Vec<f64>)> {
        self.timestamps
            .iter()
            .enumerate()
            .filter(|(_, t)| cutoff.is_none_or(|c| **t > c))
            .map(|(i, t)| {
                let values = self.series.iter().map(|s| s.values[i]).collect();
                (*t, values)
            })
            .collect()
    }

    fn clear(&mut self) {
        self.timestamps.clear();
        for series in &mut self.series {
            series.values.clear();
        }
    }
}

pub fn time_label(at: &NaiveDateTime) -> String {
    at.format("%H:%M:%S").to_string()
}

/// The three chart groups, each capped at `max_points`.
#[derive(Debug, Clone)]
pub struct SeriesBuffers {
    max_points: usize,
    groups: [ChartGroup; 3],
}

impl SeriesBuffers {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(1),
            groups: ChartKind::ALL.map(ChartGroup::new),
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn group(&self, kind: ChartKind) -> &ChartGroup {
        &self.groups[Self::slot(kind)]
    }

    pub fn groups(&self) -> impl Iterator<Item = &ChartGroup> {
        self.groups.iter()
    }

    fn slot(kind: ChartKind) -> usize {
        match kind {
            ChartKind::Power => 0,
            ChartKind::Current => 1,
            ChartKind::Voltage => 2,
        }
    }

    /// Add one point to every channel of `kind`, evicting the oldest point
    /// from all channels together once the cap is exceeded.
    pub fn append(
        &mut self,
        kind: ChartKind,
        at: NaiveDateTime,
        values: &[(&str, f64)],
    ) -> Result<(), SeriesError> {
        let max_points = self.max_points;
        let group = &mut self.groups[Self::slot(kind)];
        let ordered = group.ordered_values(values)?;
        group.push(at, ordered, max_points);
        Ok(())
    }

    /// Append a reading to all three charts. Returns false when the reading
    /// is not newer than what the charts already hold. A reading far behind
    /// the newest point restarts the charts from that reading.
    pub fn append_reading(&mut self, reading: &Reading) -> Result<bool, SeriesError> {
        let newest = self.groups.iter().filter_map(|g| g.latest_timestamp()).max();
        if let Some(newest) = newest.filter(|t| reading.timestamp <= *t) {
            if newest - reading.timestamp < TimeDelta::minutes(CLOCK_STEP_BACK_MINUTES) {
                return Ok(false);
            }
            for group in &mut self.groups {
                group.clear();
            }
        }

        for kind in ChartKind::ALL {
            self.append(kind, reading.timestamp, &kind.values_of(reading))?;
        }
        Ok(true)
    }

    /// Clear `kind` and refill it from readings ordered oldest first,
    /// keeping only the most recent `max_points`.
    pub fn replace_all(&mut self, kind: ChartKind, readings: &[Reading]) {
        let max_points = self.max_points;
        let keep = &readings[readings.len().saturating_sub(max_points)..];
        let group = &mut self.groups[Self::slot(kind)];
        group.clear();
        for reading in keep {
            let ordered = kind.values_of(reading).into_iter().map(|(_, v)| v).collect();
            group.push(reading.timestamp, ordered, max_points);
        }
    }

    pub fn replace_all_groups(&mut self, readings: &[Reading]) {
        for kind in ChartKind::ALL {
            self.replace_all(kind, readings);
        }
    }

    /// Load history underneath the live points that beat it here. Points
    /// newer than the last historical reading are put back after it.
    pub fn backfill(&mut self, readings: &[Reading]) {
        let cutoff = readings.last().map(|r| r.timestamp);
        let live: Vec<_> = self.groups.iter().map(|g| g.points_after(cutoff)).collect();

        self.replace_all_groups(readings);

        let max_points = self.max_points;
        for (group, points) in self.groups.iter_mut().zip(live) {
            for (at, values) in points {
                group.push(at, values, max_points);
            }
        }
    }
}

impl Default for SeriesBuffers {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}
