// Render adapter - projects dashboard state onto a surface
use crate::application::display::Display;
use crate::domain::dashboard::Dashboard;
use crate::domain::relay::RelayId;
use crate::domain::series::{ChartGroup, time_label};
use crate::domain::statistics::StatisticsSnapshot;
use crate::presentation::input::HELP;
use crate::presentation::surface::{ChartFrame, Dataset, Readout, Surface};

pub const PLACEHOLDER: &str = "--";

pub fn fixed(value: f64, decimals: usize, unit: &str) -> String {
    format!("{:.*}{}", decimals, value, unit)
}

fn optional(value: Option<f64>, decimals: usize, unit: &str) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| fixed(v, decimals, unit))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub struct RenderAdapter<S: Surface> {
    surface: S,
}

impl<S: Surface> RenderAdapter<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn live_readouts(&mut self, dashboard: &Dashboard) {
        const LIVE: [Readout; 11] = [
            Readout::Voltage,
            Readout::Current1,
            Readout::Current2,
            Readout::Current3,
            Readout::TotalCurrent,
            Readout::Power1,
            Readout::Power2,
            Readout::TotalPower,
            Readout::TotalPowerHeader,
            Readout::ApparentPower,
            Readout::LastUpdate,
        ];

        let Some(r) = &dashboard.latest else {
            for readout in LIVE {
                self.surface.set_readout(readout, PLACEHOLDER.to_string());
            }
            return;
        };

        let values = [
            (Readout::Voltage, fixed(r.voltage, 2, " V")),
            (Readout::Current1, fixed(r.current1, 3, " A")),
            (Readout::Current2, fixed(r.current2, 3, " A")),
            (Readout::Current3, fixed(r.current3, 3, " A")),
            (Readout::TotalCurrent, fixed(r.total_current, 3, " A")),
            (Readout::Power1, fixed(r.power1, 2, " W")),
            (Readout::Power2, fixed(r.power2, 2, " W")),
            (Readout::TotalPower, fixed(r.total_power, 2, " W")),
            (Readout::TotalPowerHeader, fixed(r.total_power, 1, " W")),
            (Readout::ApparentPower, fixed(r.apparent_power(), 2, " VA")),
            (Readout::LastUpdate, time_label(&r.timestamp)),
        ];
        for (readout, text) in values {
            self.surface.set_readout(readout, text);
        }
    }

    fn statistics(&mut self, stats: Option<&StatisticsSnapshot>) {
        let empty = StatisticsSnapshot::default();
        let s = stats.unwrap_or(&empty);

        let values = [
            (Readout::AvgVoltage, optional(s.avg_voltage, 1, "V")),
            (Readout::AvgCurrent, optional(s.avg_current, 2, "A")),
            (Readout::AvgPower, optional(s.avg_power, 1, "W")),
            (Readout::MaxPower, optional(s.max_power, 1, "W")),
            (Readout::MinPower, optional(s.min_power, 1, "W")),
            (Readout::TotalEnergy, optional(s.total_energy_kwh, 2, "kWh")),
            (
                Readout::TotalReadings,
                s.total_readings
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
        ];
        for (readout, text) in values {
            self.surface.set_readout(readout, text);
        }
    }
}

fn chart_frame(group: &ChartGroup) -> ChartFrame {
    ChartFrame {
        kind: group.kind(),
        labels: group.labels(),
        datasets: group
            .series()
            .iter()
            .map(|s| Dataset {
                label: s.label,
                values: s.values().collect(),
            })
            .collect(),
    }
}

impl<S: Surface> Display for RenderAdapter<S> {
    fn render(&mut self, dashboard: &Dashboard) {
        self.live_readouts(dashboard);
        self.statistics(dashboard.statistics.as_ref());

        for group in dashboard.buffers.groups() {
            self.surface.set_chart(chart_frame(group));
        }

        for relay in RelayId::ALL {
            let pending = dashboard.relays.state(relay).pending;
            self.surface.set_relay(relay, dashboard.relays.displayed(relay), pending);
        }

        self.surface.set_connection(dashboard.connection.status());
        self.surface.set_active_view(dashboard.views.active());
        self.surface.present();
    }

    fn notify(&mut self, message: &str) {
        self.surface.message(message);
    }

    fn show_help(&mut self) {
        self.surface.message(HELP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::ConnectivityStatus;
    use crate::domain::reading::tests::{at, reading};
    use crate::domain::series::ChartKind;
    use crate::domain::view::View;
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSurface {
        readouts: HashMap<Readout, String>,
        charts: HashMap<ChartKind, ChartFrame>,
        relays: HashMap<RelayId, (bool, bool)>,
        status: Option<ConnectivityStatus>,
        view: Option<View>,
        presents: usize,
        messages: Vec<String>,
    }

    impl Surface for RecordingSurface {
        fn set_readout(&mut self, readout: Readout, text: String) {
            self.readouts.insert(readout, text);
        }

        fn set_chart(&mut self, chart: ChartFrame) {
            self.charts.insert(chart.kind, chart);
        }

        fn set_relay(&mut self, relay: RelayId, checked: bool, pending: bool) {
            self.relays.insert(relay, (checked, pending));
        }

        fn set_connection(&mut self, status: ConnectivityStatus) {
            self.status = Some(status);
        }

        fn set_active_view(&mut self, view: View) {
            self.view = Some(view);
        }

        fn present(&mut self) {
            self.presents += 1;
        }

        fn message(&mut self, text: &str) {
            self.messages.push(text.to_string());
        }
    }

    fn readout<'a>(adapter: &'a RenderAdapter<RecordingSurface>, r: Readout) -> &'a str {
        adapter
            .surface()
            .readouts
            .get(&r)
            .map(String::as_str)
            .unwrap()
    }

    #[test]
    fn test_partial_statistics_use_placeholder() {
        let mut dashboard = Dashboard::new(5);
        dashboard.replace_statistics(StatisticsSnapshot {
            avg_voltage: Some(230.1),
            ..Default::default()
        });

        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);

        assert_eq!(readout(&adapter, Readout::AvgVoltage), "230.1V");
        assert_eq!(readout(&adapter, Readout::TotalEnergy), "--");
        assert_eq!(readout(&adapter, Readout::MaxPower), "--");
        assert_eq!(readout(&adapter, Readout::TotalReadings), "--");
    }

    #[test]
    fn test_statistics_formatting() {
        let mut dashboard = Dashboard::new(5);
        dashboard.replace_statistics(StatisticsSnapshot {
            avg_voltage: Some(229.96),
            avg_current: Some(1.234),
            max_power: Some(1520.44),
            total_energy_kwh: Some(3.456),
            total_readings: Some(8640),
            ..Default::default()
        });

        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);

        assert_eq!(readout(&adapter, Readout::AvgVoltage), "230.0V");
        assert_eq!(readout(&adapter, Readout::AvgCurrent), "1.23A");
        assert_eq!(readout(&adapter, Readout::MaxPower), "1520.4W");
        assert_eq!(readout(&adapter, Readout::TotalEnergy), "3.46kWh");
        assert_eq!(readout(&adapter, Readout::TotalReadings), "8640");
    }

    #[test]
    fn test_live_readouts() {
        let mut dashboard = Dashboard::new(5);
        let mut r = reading(at(14, 5, 9), 460.0);
        r.voltage = 230.0;
        r.total_current = 2.0;
        r.current1 = 1.5;
        dashboard.apply_reading(r, at(14, 5, 10)).unwrap();

        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);

        assert_eq!(readout(&adapter, Readout::Voltage), "230.00 V");
        assert_eq!(readout(&adapter, Readout::Current1), "1.500 A");
        assert_eq!(readout(&adapter, Readout::TotalPower), "460.00 W");
        assert_eq!(readout(&adapter, Readout::TotalPowerHeader), "460.0 W");
        assert_eq!(readout(&adapter, Readout::ApparentPower), "460.00 VA");
        assert_eq!(readout(&adapter, Readout::LastUpdate), "14:05:09");
        assert_eq!(adapter.surface().status, Some(ConnectivityStatus::Online));
    }

    #[test]
    fn test_empty_dashboard_renders_placeholders() {
        let dashboard = Dashboard::new(5);
        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);

        assert_eq!(readout(&adapter, Readout::Voltage), "--");
        assert_eq!(readout(&adapter, Readout::AvgVoltage), "--");
        assert_eq!(adapter.surface().status, Some(ConnectivityStatus::Offline));
        assert_eq!(adapter.surface().view, Some(View::Live));
        assert_eq!(adapter.surface().charts.len(), 3);
        assert_eq!(adapter.surface().presents, 1);
    }

    #[test]
    fn test_charts_and_relays_projected() {
        let mut dashboard = Dashboard::new(3);
        for i in 0..4 {
            dashboard
                .apply_reading(reading(at(9, 0, i), i as f64 * 10.0), at(9, 0, i))
                .unwrap();
        }
        dashboard.relays.request_toggle(RelayId::Two, true);

        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);

        let power = &adapter.surface().charts[&ChartKind::Power];
        assert_eq!(power.labels, vec!["09:00:01", "09:00:02", "09:00:03"]);
        assert_eq!(power.datasets.len(), 3);
        assert_eq!(power.datasets[2].label, "Total Power (W)");
        assert_eq!(power.datasets[2].values, vec![10.0, 20.0, 30.0]);
        for dataset in &power.datasets {
            assert_eq!(dataset.values.len(), power.labels.len());
        }

        assert_eq!(adapter.surface().relays[&RelayId::Two], (true, true));
        assert_eq!(adapter.surface().relays[&RelayId::One], (false, false));
    }

    #[test]
    fn test_render_does_not_touch_state() {
        let mut dashboard = Dashboard::new(3);
        dashboard
            .apply_reading(reading(at(9, 0, 0), 1.0), at(9, 0, 0))
            .unwrap();
        let before = format!("{:?}", dashboard);

        let mut adapter = RenderAdapter::new(RecordingSurface::default());
        adapter.render(&dashboard);
        adapter.render(&dashboard);

        assert_eq!(format!("{:?}", dashboard), before);
    }

    #[test]
    fn test_fixed() {
        assert_eq!(fixed(230.1, 1, "V"), "230.1V");
        assert_eq!(fixed(0.0, 3, " A"), "0.000 A");
        assert_eq!(optional(Some(f64::NAN), 1, "W"), "--");
    }
}
