// Console surface - draws the dashboard as plain text frames
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::domain::connection::ConnectivityStatus;
use crate::domain::relay::RelayId;
use crate::domain::series::ChartKind;
use crate::domain::view::View;
use crate::presentation::render::PLACEHOLDER;
use crate::presentation::surface::{ChartFrame, Readout, Surface};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

const LIVE_READOUTS: [Readout; 9] = [
    Readout::Voltage,
    Readout::Current1,
    Readout::Current2,
    Readout::Current3,
    Readout::TotalCurrent,
    Readout::Power1,
    Readout::Power2,
    Readout::TotalPower,
    Readout::ApparentPower,
];

const STATS_READOUTS: [Readout; 7] = [
    Readout::AvgVoltage,
    Readout::AvgCurrent,
    Readout::AvgPower,
    Readout::MaxPower,
    Readout::MinPower,
    Readout::TotalEnergy,
    Readout::TotalReadings,
];

/// Map values onto block characters scaled between their own min and max.
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                ' '
            } else if span <= f64::EPSILON {
                BARS[3]
            } else {
                let level = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            }
        })
        .collect()
}

pub struct ConsoleSurface<W: Write> {
    out: W,
    readouts: BTreeMap<Readout, String>,
    charts: BTreeMap<ChartKind, ChartFrame>,
    relays: BTreeMap<u8, (bool, bool)>,
    status: ConnectivityStatus,
    view: View,
    last_frame: Option<String>,
}

impl ConsoleSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            readouts: BTreeMap::new(),
            charts: BTreeMap::new(),
            relays: BTreeMap::new(),
            status: ConnectivityStatus::default(),
            view: View::default(),
            last_frame: None,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn readout(&self, readout: Readout) -> &str {
        self.readouts
            .get(&readout)
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER)
    }

    fn readout_lines(&self, frame: &mut String, readouts: &[Readout]) {
        for &r in readouts {
            frame.push_str(&format!("  {:<16}{:>14}\n", r.title(), self.readout(r)));
        }
    }

    fn chart_lines(&self, frame: &mut String) {
        for chart in self.charts.values() {
            let range = match (chart.labels.first(), chart.labels.last()) {
                (Some(first), Some(last)) => format!("{} .. {}", first, last),
                _ => "no data".to_string(),
            };
            frame.push_str(&format!("  {} [{}]\n", chart.kind.title(), range));
            for dataset in &chart.datasets {
                let latest = dataset
                    .values
                    .last()
                    .map(|v| format!("{:.2}", v))
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                frame.push_str(&format!(
                    "    {:<18} {} {}\n",
                    dataset.label,
                    sparkline(&dataset.values),
                    latest
                ));
            }
        }
    }

    fn relay_lines(&self, frame: &mut String) {
        for relay in RelayId::ALL {
            let (checked, pending) = self
                .relays
                .get(&relay.number())
                .copied()
                .unwrap_or_default();
            frame.push_str(&format!(
                "  {:<10}[{}]{}\n",
                relay.to_string(),
                if checked { "ON " } else { "OFF" },
                if pending { "  (pending)" } else { "" }
            ));
        }
    }

    fn compose(&self) -> String {
        let mut frame = format!(
            "== Energy Monitor | {} | {} | updated {} | view: {} ==\n",
            self.status,
            self.readout(Readout::TotalPowerHeader),
            self.readout(Readout::LastUpdate),
            self.view
        );
        match self.view {
            View::Live => self.readout_lines(&mut frame, &LIVE_READOUTS),
            View::Charts => self.chart_lines(&mut frame),
            View::Stats => self.readout_lines(&mut frame, &STATS_READOUTS),
            View::Control => self.relay_lines(&mut frame),
        }
        frame
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to console: {}", e);
        }
    }
}

impl<W: Write> Surface for ConsoleSurface<W> {
    fn set_readout(&mut self, readout: Readout, text: String) {
        self.readouts.insert(readout, text);
    }

    fn set_chart(&mut self, chart: ChartFrame) {
        self.charts.insert(chart.kind, chart);
    }

    fn set_relay(&mut self, relay: RelayId, checked: bool, pending: bool) {
        self.relays.insert(relay.number(), (checked, pending));
    }

    fn set_connection(&mut self, status: ConnectivityStatus) {
        self.status = status;
    }

    fn set_active_view(&mut self, view: View) {
        self.view = view;
    }

    fn present(&mut self) {
        let frame = self.compose();
        if self.last_frame.as_deref() == Some(frame.as_str()) {
            return;
        }
        self.write(&frame);
        self.last_frame = Some(frame);
    }

    fn message(&mut self, text: &str) {
        self.write(&format!("{}\n", text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::surface::Dataset;

    fn output(surface: ConsoleSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn test_sparkline_scales_to_range() {
        assert_eq!(sparkline(&[0.0, 7.0]), "▁█");
        assert_eq!(sparkline(&[1.0, 1.0, 1.0]), "▄▄▄");
        assert_eq!(sparkline(&[0.0, f64::NAN, 14.0]), "▁ █");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_identical_frames_written_once() {
        let mut surface = ConsoleSurface::new(Vec::new());
        surface.set_readout(Readout::Voltage, "230.00 V".into());
        surface.present();
        surface.present();

        let text = output(surface);
        assert_eq!(text.matches("== Energy Monitor").count(), 1);
        assert!(text.contains("230.00 V"));
        assert!(text.contains("Offline"));
    }

    #[test]
    fn test_header_and_active_section() {
        let mut surface = ConsoleSurface::new(Vec::new());
        surface.set_connection(ConnectivityStatus::Online);
        surface.set_readout(Readout::TotalPowerHeader, "460.0 W".into());
        surface.set_readout(Readout::AvgVoltage, "230.1V".into());
        surface.set_relay(RelayId::Two, true, true);
        surface.set_active_view(View::Control);
        surface.present();

        let text = output(surface);
        assert!(text.contains("Online"));
        assert!(text.contains("460.0 W"));
        assert!(text.contains("[ON ]  (pending)"));
        assert!(text.contains("Relay 1   [OFF]"));
        assert!(!text.contains("230.1V"));
    }

    #[test]
    fn test_charts_section() {
        let mut surface = ConsoleSurface::new(Vec::new());
        surface.set_chart(ChartFrame {
            kind: ChartKind::Voltage,
            labels: vec!["10:00:00".into(), "10:00:02".into()],
            datasets: vec![Dataset {
                label: "Voltage (V)",
                values: vec![229.0, 231.0],
            }],
        });
        surface.set_active_view(View::Charts);
        surface.present();

        let text = output(surface);
        assert!(text.contains("Voltage [10:00:00 .. 10:00:02]"));
        assert!(text.contains("▁█ 231.00"));
    }

    #[test]
    fn test_messages_always_written() {
        let mut surface = ConsoleSurface::new(Vec::new());
        surface.message("unknown view 'foo'");
        surface.message("unknown view 'foo'");

        assert_eq!(output(surface).matches("unknown view").count(), 2);
    }
}
