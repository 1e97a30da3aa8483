use crate::prelude::*;

use crate::lxp::packet::{
    FaultCodeString, ReadInput, ReadInputAll, ReadInput1, ReadInput2, ReadInput3, ReadInput4, StatusString,
    WarningCodeString,
};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Text,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Solar,
    Battery,
    Grid,
    Eps,
    Generator,
    Bms,
    System,
}

macro_rules! fields {
    ($($variant:ident => ($name:literal, $kind:ident, $category:ident),)*) => {
        /// Every telemetry value the decoder can produce.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub enum Field {
            $($variant,)*
        }

        impl Field {
            pub const ALL: &'static [Field] = &[$(Field::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)*
                }
            }

            pub fn kind(&self) -> FieldKind {
                match self {
                    $(Field::$variant => FieldKind::$kind,)*
                }
            }

            pub fn category(&self) -> Category {
                match self {
                    $(Field::$variant => Category::$category,)*
                }
            }
        }
    };
}

fields! {
    // input bank 0
    Status => ("lux_status", Numeric, System),
    StatusText => ("lux_status_text", Text, System),
    Pv1Voltage => ("lux_pv1_voltage", Numeric, Solar),
    Pv2Voltage => ("lux_pv2_voltage", Numeric, Solar),
    Pv3Voltage => ("lux_pv3_voltage", Numeric, Solar),
    BatteryVoltage => ("lux_battery_voltage", Numeric, Battery),
    Soc => ("lux_soc", Numeric, Battery),
    Soh => ("lux_soh", Numeric, Battery),
    InternalFault => ("lux_internal_fault", Numeric, System),
    Pv1Power => ("lux_pv1_power", Numeric, Solar),
    Pv2Power => ("lux_pv2_power", Numeric, Solar),
    Pv3Power => ("lux_pv3_power", Numeric, Solar),
    PvPower => ("lux_pv_power", Numeric, Solar),
    BatteryChargePower => ("lux_battery_charge_power", Numeric, Battery),
    BatteryDischargePower => ("lux_battery_discharge_power", Numeric, Battery),
    BatteryPower => ("lux_battery_power", Numeric, Battery),
    GridVoltageR => ("lux_grid_voltage_r", Numeric, Grid),
    GridVoltageS => ("lux_grid_voltage_s", Numeric, Grid),
    GridVoltageT => ("lux_grid_voltage_t", Numeric, Grid),
    GridFrequency => ("lux_grid_frequency", Numeric, Grid),
    InverterPower => ("lux_inverter_power", Numeric, Grid),
    RectifierPower => ("lux_rectifier_power", Numeric, Grid),
    InverterRmsCurrent => ("lux_inverter_rms_current", Numeric, Grid),
    PowerFactor => ("lux_power_factor", Numeric, Grid),
    EpsVoltageR => ("lux_eps_voltage_r", Numeric, Eps),
    EpsVoltageS => ("lux_eps_voltage_s", Numeric, Eps),
    EpsVoltageT => ("lux_eps_voltage_t", Numeric, Eps),
    EpsFrequency => ("lux_eps_frequency", Numeric, Eps),
    EpsPower => ("lux_eps_power", Numeric, Eps),
    EpsApparentPower => ("lux_eps_apparent_power", Numeric, Eps),
    PowerToGrid => ("lux_power_to_grid", Numeric, Grid),
    PowerFromGrid => ("lux_power_from_grid", Numeric, Grid),
    GridPower => ("lux_grid_power", Numeric, Grid),
    Pv1EnergyToday => ("lux_pv1_energy_today", Numeric, Solar),
    Pv2EnergyToday => ("lux_pv2_energy_today", Numeric, Solar),
    Pv3EnergyToday => ("lux_pv3_energy_today", Numeric, Solar),
    PvEnergyToday => ("lux_pv_energy_today", Numeric, Solar),
    InverterEnergyToday => ("lux_inverter_energy_today", Numeric, Grid),
    RectifierEnergyToday => ("lux_rectifier_energy_today", Numeric, Grid),
    BatteryChargeEnergyToday => ("lux_battery_charge_energy_today", Numeric, Battery),
    BatteryDischargeEnergyToday => ("lux_battery_discharge_energy_today", Numeric, Battery),
    EpsEnergyToday => ("lux_eps_energy_today", Numeric, Eps),
    GridExportEnergyToday => ("lux_grid_export_energy_today", Numeric, Grid),
    GridImportEnergyToday => ("lux_grid_import_energy_today", Numeric, Grid),
    Bus1Voltage => ("lux_bus1_voltage", Numeric, System),
    Bus2Voltage => ("lux_bus2_voltage", Numeric, System),

    // input bank 40
    Pv1EnergyTotal => ("lux_pv1_energy_total", Numeric, Solar),
    Pv2EnergyTotal => ("lux_pv2_energy_total", Numeric, Solar),
    Pv3EnergyTotal => ("lux_pv3_energy_total", Numeric, Solar),
    PvEnergyTotal => ("lux_pv_energy_total", Numeric, Solar),
    InverterEnergyTotal => ("lux_inverter_energy_total", Numeric, Grid),
    RectifierEnergyTotal => ("lux_rectifier_energy_total", Numeric, Grid),
    BatteryChargeEnergyTotal => ("lux_battery_charge_energy_total", Numeric, Battery),
    BatteryDischargeEnergyTotal => ("lux_battery_discharge_energy_total", Numeric, Battery),
    EpsEnergyTotal => ("lux_eps_energy_total", Numeric, Eps),
    GridExportEnergyTotal => ("lux_grid_export_energy_total", Numeric, Grid),
    GridImportEnergyTotal => ("lux_grid_import_energy_total", Numeric, Grid),
    FaultCode => ("lux_fault_code", Numeric, System),
    FaultText => ("lux_fault_text", Text, System),
    WarningCode => ("lux_warning_code", Numeric, System),
    WarningText => ("lux_warning_text", Text, System),
    InternalTemperature => ("lux_internal_temperature", Numeric, System),
    Radiator1Temperature => ("lux_radiator1_temperature", Numeric, System),
    Radiator2Temperature => ("lux_radiator2_temperature", Numeric, System),
    BatteryTemperature => ("lux_battery_temperature", Numeric, Battery),
    Runtime => ("lux_runtime", Numeric, System),

    // input bank 80
    BmsMaxChargeCurrent => ("lux_bms_max_charge_current", Numeric, Bms),
    BmsMaxDischargeCurrent => ("lux_bms_max_discharge_current", Numeric, Bms),
    BmsChargeVoltageRef => ("lux_bms_charge_voltage_ref", Numeric, Bms),
    BmsDischargeCutoffVoltage => ("lux_bms_discharge_cutoff_voltage", Numeric, Bms),
    BatteryCount => ("lux_battery_count", Numeric, Battery),
    BatteryCapacity => ("lux_battery_capacity", Numeric, Battery),
    BatteryCurrent => ("lux_battery_current", Numeric, Battery),
    BmsFaultCode => ("lux_bms_fault_code", Numeric, Bms),
    BmsWarningCode => ("lux_bms_warning_code", Numeric, Bms),
    MaxCellVoltage => ("lux_max_cell_voltage", Numeric, Bms),
    MinCellVoltage => ("lux_min_cell_voltage", Numeric, Bms),
    MaxCellTemperature => ("lux_max_cell_temperature", Numeric, Bms),
    MinCellTemperature => ("lux_min_cell_temperature", Numeric, Bms),
    BmsFirmwareUpdateState => ("lux_bms_fw_update_state", Numeric, Bms),
    BatteryCycleCount => ("lux_battery_cycle_count", Numeric, Battery),
    InverterBatteryVoltage => ("lux_inverter_battery_voltage", Numeric, Battery),

    // input bank 120
    HalfBusVoltage => ("lux_half_bus_voltage", Numeric, System),
    GeneratorVoltage => ("lux_generator_voltage", Numeric, Generator),
    GeneratorFrequency => ("lux_generator_frequency", Numeric, Generator),
    GeneratorPower => ("lux_generator_power", Numeric, Generator),
    GeneratorEnergyToday => ("lux_generator_energy_today", Numeric, Generator),
    GeneratorEnergyTotal => ("lux_generator_energy_total", Numeric, Generator),
    EpsL1Voltage => ("lux_eps_l1_voltage", Numeric, Eps),
    EpsL2Voltage => ("lux_eps_l2_voltage", Numeric, Eps),
    EpsL1Power => ("lux_eps_l1_power", Numeric, Eps),
    EpsL2Power => ("lux_eps_l2_power", Numeric, Eps),
    EpsL1ApparentPower => ("lux_eps_l1_apparent_power", Numeric, Eps),
    EpsL2ApparentPower => ("lux_eps_l2_apparent_power", Numeric, Eps),
    EpsL1EnergyToday => ("lux_eps_l1_energy_today", Numeric, Eps),
    EpsL2EnergyToday => ("lux_eps_l2_energy_today", Numeric, Eps),
    EpsL1EnergyTotal => ("lux_eps_l1_energy_total", Numeric, Eps),
    EpsL2EnergyTotal => ("lux_eps_l2_energy_total", Numeric, Eps),
}

impl std::str::FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|f| f.name() == s)
            .copied()
            .ok_or_else(|| Error::config(format!("unknown sensor '{}'", s)))
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Number(_) => FieldKind::Numeric,
            Self::Text(_) => FieldKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Number(f64::from(v))
            }
        })*
    };
}
value_from_number!(f64, u8, u16, i16, u32, i32);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// The latest decoded telemetry of one inverter.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub updated_at: Option<DateTime<Utc>>,
    pub values: BTreeMap<Field, Value>,
}

impl TelemetrySnapshot {
    pub fn from_values<I: IntoIterator<Item = (Field, Value)>>(values: I) -> Self {
        Self {
            updated_at: None,
            values: values.into_iter().collect(),
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    pub fn merge(&mut self, other: TelemetrySnapshot) {
        self.values.extend(other.values);
        if other.updated_at.is_some() {
            self.updated_at = other.updated_at;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read side of a poller's snapshot channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SnapshotReader {
    rx: watch::Receiver<TelemetrySnapshot>,
}

impl SnapshotReader {
    pub fn new(rx: watch::Receiver<TelemetrySnapshot>) -> Self {
        Self { rx }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.rx.borrow().clone()
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.rx.borrow().number(field)
    }

    pub fn text(&self, field: Field) -> Option<String> {
        self.rx.borrow().text(field).map(str::to_owned)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.rx.borrow().updated_at
    }

    /// Wait for the next published snapshot and mark it seen.
    pub async fn changed(&mut self) -> Result<TelemetrySnapshot> {
        self.rx
            .changed()
            .await
            .map_err(|_| anyhow!("snapshot publisher has gone away"))?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

// register bank -> field mapping {{{
impl ReadInput {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        match self {
            Self::ReadInputAll(r) => r.telemetry(),
            Self::ReadInput1(r) => r.telemetry(),
            Self::ReadInput2(r) => r.telemetry(),
            Self::ReadInput3(r) => r.telemetry(),
            Self::ReadInput4(r) => r.telemetry(),
        }
    }
}

impl ReadInputAll {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        let mut values = self.input1.telemetry();
        values.extend(self.input2.telemetry());
        values.extend(self.input3.telemetry());
        values.extend(self.generator.generator_telemetry());
        values
    }
}

impl ReadInput1 {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        use Field::*;

        vec![
            (Status, self.status.into()),
            (StatusText, StatusString::from_value(self.status).into()),
            (Pv1Voltage, self.v_pv_1.into()),
            (Pv2Voltage, self.v_pv_2.into()),
            (Pv3Voltage, self.v_pv_3.into()),
            (BatteryVoltage, self.v_bat.into()),
            (Soc, self.soc.into()),
            (Soh, self.soh.into()),
            (InternalFault, self.internal_fault.into()),
            (Pv1Power, self.p_pv_1.into()),
            (Pv2Power, self.p_pv_2.into()),
            (Pv3Power, self.p_pv_3.into()),
            (PvPower, self.p_pv.into()),
            (BatteryChargePower, self.p_charge.into()),
            (BatteryDischargePower, self.p_discharge.into()),
            (BatteryPower, self.p_battery.into()),
            (GridVoltageR, self.v_ac_r.into()),
            (GridVoltageS, self.v_ac_s.into()),
            (GridVoltageT, self.v_ac_t.into()),
            (GridFrequency, self.f_ac.into()),
            (InverterPower, self.p_inv.into()),
            (RectifierPower, self.p_rec.into()),
            (InverterRmsCurrent, self.i_inv_rms.into()),
            (PowerFactor, self.pf.into()),
            (EpsVoltageR, self.v_eps_r.into()),
            (EpsVoltageS, self.v_eps_s.into()),
            (EpsVoltageT, self.v_eps_t.into()),
            (EpsFrequency, self.f_eps.into()),
            (EpsPower, self.p_eps.into()),
            (EpsApparentPower, self.s_eps.into()),
            (PowerToGrid, self.p_to_grid.into()),
            (PowerFromGrid, self.p_to_user.into()),
            (GridPower, self.p_grid.into()),
            (Pv1EnergyToday, self.e_pv_day_1.into()),
            (Pv2EnergyToday, self.e_pv_day_2.into()),
            (Pv3EnergyToday, self.e_pv_day_3.into()),
            (PvEnergyToday, self.e_pv_day.into()),
            (InverterEnergyToday, self.e_inv_day.into()),
            (RectifierEnergyToday, self.e_rec_day.into()),
            (BatteryChargeEnergyToday, self.e_chg_day.into()),
            (BatteryDischargeEnergyToday, self.e_dischg_day.into()),
            (EpsEnergyToday, self.e_eps_day.into()),
            (GridExportEnergyToday, self.e_to_grid_day.into()),
            (GridImportEnergyToday, self.e_to_user_day.into()),
            (Bus1Voltage, self.v_bus_1.into()),
            (Bus2Voltage, self.v_bus_2.into()),
        ]
    }
}

impl ReadInput2 {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        use Field::*;

        vec![
            (Pv1EnergyTotal, self.e_pv_all_1.into()),
            (Pv2EnergyTotal, self.e_pv_all_2.into()),
            (Pv3EnergyTotal, self.e_pv_all_3.into()),
            (PvEnergyTotal, self.e_pv_all.into()),
            (InverterEnergyTotal, self.e_inv_all.into()),
            (RectifierEnergyTotal, self.e_rec_all.into()),
            (BatteryChargeEnergyTotal, self.e_chg_all.into()),
            (BatteryDischargeEnergyTotal, self.e_dischg_all.into()),
            (EpsEnergyTotal, self.e_eps_all.into()),
            (GridExportEnergyTotal, self.e_to_grid_all.into()),
            (GridImportEnergyTotal, self.e_to_user_all.into()),
            (FaultCode, self.fault_code.into()),
            (FaultText, FaultCodeString::from_value(self.fault_code).into()),
            (WarningCode, self.warning_code.into()),
            (WarningText, WarningCodeString::from_value(self.warning_code).into()),
            (InternalTemperature, self.t_inner.into()),
            (Radiator1Temperature, self.t_rad_1.into()),
            (Radiator2Temperature, self.t_rad_2.into()),
            (BatteryTemperature, self.t_bat.into()),
            (Runtime, self.runtime.into()),
        ]
    }
}

impl ReadInput3 {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        use Field::*;

        vec![
            (BmsMaxChargeCurrent, self.max_chg_curr.into()),
            (BmsMaxDischargeCurrent, self.max_dischg_curr.into()),
            (BmsChargeVoltageRef, self.charge_volt_ref.into()),
            (BmsDischargeCutoffVoltage, self.dischg_cut_volt.into()),
            (BatteryCount, self.bat_count.into()),
            (BatteryCapacity, self.bat_capacity.into()),
            (BatteryCurrent, self.bat_current.into()),
            (BmsFaultCode, self.bms_event_1.into()),
            (BmsWarningCode, self.bms_event_2.into()),
            (MaxCellVoltage, self.max_cell_voltage.into()),
            (MinCellVoltage, self.min_cell_voltage.into()),
            (MaxCellTemperature, self.max_cell_temp.into()),
            (MinCellTemperature, self.min_cell_temp.into()),
            (BmsFirmwareUpdateState, self.bms_fw_update_state.into()),
            (BatteryCycleCount, self.cycle_count.into()),
            (InverterBatteryVoltage, self.vbat_inv.into()),
        ]
    }
}

impl ReadInput4 {
    pub fn telemetry(&self) -> Vec<(Field, Value)> {
        use Field::*;

        let mut values = self.generator_telemetry();
        values.extend(vec![
            (EpsL1Voltage, self.v_eps_l1.into()),
            (EpsL2Voltage, self.v_eps_l2.into()),
            (EpsL1Power, self.p_eps_l1.into()),
            (EpsL2Power, self.p_eps_l2.into()),
            (EpsL1ApparentPower, self.s_eps_l1.into()),
            (EpsL2ApparentPower, self.s_eps_l2.into()),
            (EpsL1EnergyToday, self.e_eps_l1_day.into()),
            (EpsL2EnergyToday, self.e_eps_l2_day.into()),
            (EpsL1EnergyTotal, self.e_eps_l1_all.into()),
            (EpsL2EnergyTotal, self.e_eps_l2_all.into()),
        ]);
        values
    }

    /// Registers 120-126 only.
    pub fn generator_telemetry(&self) -> Vec<(Field, Value)> {
        use Field::*;

        vec![
            (HalfBusVoltage, self.v_bus_half.into()),
            (GeneratorVoltage, self.v_gen.into()),
            (GeneratorFrequency, self.f_gen.into()),
            (GeneratorPower, self.p_gen.into()),
            (GeneratorEnergyToday, self.e_gen_day.into()),
            (GeneratorEnergyTotal, self.e_gen_all.into()),
        ]
    }
}
// }}}
