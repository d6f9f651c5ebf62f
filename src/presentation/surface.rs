// What a dashboard surface can show
use crate::domain::connection::ConnectivityStatus;
use crate::domain::relay::RelayId;
use crate::domain::series::ChartKind;
use crate::domain::view::View;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Readout {
    Voltage,
    Current1,
    Current2,
    Current3,
    TotalCurrent,
    Power1,
    Power2,
    TotalPower,
    TotalPowerHeader,
    ApparentPower,
    LastUpdate,
    AvgVoltage,
    AvgCurrent,
    AvgPower,
    MaxPower,
    MinPower,
    TotalEnergy,
    TotalReadings,
}

impl Readout {
    pub fn title(&self) -> &'static str {
        match self {
            Readout::Voltage => "Voltage",
            Readout::Current1 => "Current 1",
            Readout::Current2 => "Current 2",
            Readout::Current3 => "Current 3",
            Readout::TotalCurrent => "Total Current",
            Readout::Power1 => "Power 1",
            Readout::Power2 => "Power 2",
            Readout::TotalPower => "Total Power",
            Readout::TotalPowerHeader => "Total",
            Readout::ApparentPower => "Apparent Power",
            Readout::LastUpdate => "Last Update",
            Readout::AvgVoltage => "Avg Voltage",
            Readout::AvgCurrent => "Avg Current",
            Readout::AvgPower => "Avg Power",
            Readout::MaxPower => "Max Power",
            Readout::MinPower => "Min Power",
            Readout::TotalEnergy => "Total Energy",
            Readout::TotalReadings => "Readings",
        }
    }
}

/// One chart as drawn: shared labels plus one dataset per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: &'static str,
    pub values: Vec<f64>,
}

pub trait Surface {
    fn set_readout(&mut self, readout: Readout, text: String);
    fn set_chart(&mut self, chart: ChartFrame);
    fn set_relay(&mut self, relay: RelayId, checked: bool, pending: bool);
    fn set_connection(&mut self, status: ConnectivityStatus);
    fn set_active_view(&mut self, view: View);
    /// Push everything set since the last call to the screen.
    fn present(&mut self);
    fn message(&mut self, text: &str);
}
